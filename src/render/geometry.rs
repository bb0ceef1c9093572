//! The mesh the renderer draws: a quad made of two triangles sharing an edge.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::abs::{GeometryBuffer, Gpu, MeshError, Vertex, VertexAttribute};

/// A vertex with a position and a colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for ColorVertex {
    fn attributes() -> Vec<VertexAttribute> {
        let stride = std::mem::size_of::<Self>() as u32;
        vec![
            VertexAttribute {
                location: 0,
                components: 3,
                stride,
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                components: 3,
                stride,
                offset: std::mem::size_of::<[f32; 3]>() as u32,
            },
        ]
    }
}

#[rustfmt::skip]
pub const QUAD_VERTICES: [ColorVertex; 4] = [
    ColorVertex { position: [ 0.5,  0.5, 0.0], color: [1.0, 0.0, 0.0] }, // top right
    ColorVertex { position: [ 0.5, -0.5, 0.0], color: [0.0, 1.0, 0.0] }, // bottom right
    ColorVertex { position: [-0.5, -0.5, 0.0], color: [0.0, 0.0, 1.0] }, // bottom left
    ColorVertex { position: [-0.5,  0.5, 0.0], color: [1.0, 1.0, 0.0] }, // top left
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Uploads the quad and describes its layout.
pub fn quad<G: Gpu>(gl: &Arc<G>) -> Result<GeometryBuffer<G>, MeshError> {
    GeometryBuffer::create(gl, &QUAD_VERTICES, Some(&QUAD_INDICES[..]))?.describe_as::<ColorVertex>()
}
