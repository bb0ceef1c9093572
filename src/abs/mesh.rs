//! Geometry management module.
//!
//! This module defines the [`GeometryBuffer`] struct for managing vertex and index data on the
//! GPU side. A buffer is created with [`GeometryBuffer::create`], which yields an
//! [`UndescribedBuffer`]; its attribute layout is then bound exactly once with
//! [`UndescribedBuffer::describe`]. Vertices can implement the [`Vertex`] trait to publish their
//! own layout.

use std::sync::Arc;

use super::gpu::Gpu;

const FLOAT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// One float attribute of an interleaved vertex buffer. `stride` and `offset` are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
}

/// Trait that defines the attribute layout of a vertex type.
pub trait Vertex: bytemuck::Pod {
    /// Returns the attributes of the vertex, in location order.
    fn attributes() -> Vec<VertexAttribute>;
}

/// Errors raised while creating or describing a [`GeometryBuffer`].
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("failed to allocate {0}: {1}")]
    Gpu(&'static str, String),
    #[error("geometry has no vertex data")]
    Empty,
    #[error("index {index} references a vertex past the {vertex_count} available")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("vertex layout has no attributes")]
    EmptyLayout,
    #[error("attribute {location} has {components} components, expected 1 to 4")]
    BadComponentCount { location: u32, components: u32 },
    #[error("attribute location {location} exceeds the {max} vertex attributes supported")]
    LocationOutOfRange { location: u32, max: u32 },
    #[error("attribute {location} ends at byte {end}, past the {limit} bytes of its vertex")]
    AttributeOutOfBounds { location: u32, end: u32, limit: u32 },
    #[error("vertex type is {expected} bytes but the uploaded vertices are {actual} bytes")]
    VertexSizeMismatch { expected: usize, actual: usize },
}

/// GPU objects shared by the undescribed and described forms of a buffer.
struct Handles<G: Gpu> {
    gl: Arc<G>,
    vao: G::VertexArray,
    vbo: G::Buffer,
    ebo: Option<G::Buffer>,
}

impl<G: Gpu> Drop for Handles<G> {
    fn drop(&mut self) {
        self.gl.delete_buffer(self.vbo);
        if let Some(ebo) = self.ebo {
            self.gl.delete_buffer(ebo);
        }
        self.gl.delete_vertex_array(self.vao);
    }
}

/// Vertex (and optional index) data uploaded to the GPU whose attribute layout has not been
/// described yet.
pub struct UndescribedBuffer<G: Gpu> {
    handles: Handles<G>,
    vertex_count: usize,
    index_count: Option<usize>,
    vertex_size: usize,
}

impl<G: Gpu> UndescribedBuffer<G> {
    /// Binds the attribute layout to this buffer's vertex array, consuming the undescribed
    /// buffer.
    pub fn describe(self, attributes: &[VertexAttribute]) -> Result<GeometryBuffer<G>, MeshError> {
        if attributes.is_empty() {
            return Err(MeshError::EmptyLayout);
        }
        let gl = &self.handles.gl;
        let max = gl.max_vertex_attribs();
        for attribute in attributes {
            if !(1..=4).contains(&attribute.components) {
                return Err(MeshError::BadComponentCount {
                    location: attribute.location,
                    components: attribute.components,
                });
            }
            if attribute.location >= max {
                return Err(MeshError::LocationOutOfRange {
                    location: attribute.location,
                    max,
                });
            }
            // A stride of zero means tightly packed.
            let end = attribute.offset + attribute.components * FLOAT_SIZE;
            let limit = match attribute.stride {
                0 => self.vertex_size as u32,
                stride => stride.min(self.vertex_size as u32),
            };
            if end > limit {
                return Err(MeshError::AttributeOutOfBounds {
                    location: attribute.location,
                    end,
                    limit,
                });
            }
        }

        gl.bind_vertex_array(Some(self.handles.vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.handles.vbo));
        for attribute in attributes {
            gl.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components as i32,
                attribute.stride as i32,
                attribute.offset as i32,
            );
            gl.enable_vertex_attrib_array(attribute.location);
        }
        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok(GeometryBuffer {
            handles: self.handles,
            vertex_count: self.vertex_count,
            index_count: self.index_count,
        })
    }

    /// Describes the buffer with the layout published by `V`.
    pub fn describe_as<V: Vertex>(self) -> Result<GeometryBuffer<G>, MeshError> {
        let expected = std::mem::size_of::<V>();
        if self.vertex_size != expected {
            return Err(MeshError::VertexSizeMismatch {
                expected,
                actual: self.vertex_size,
            });
        }
        self.describe(&V::attributes())
    }
}

/// Represents vertex and index data stored on the GPU side with its attribute layout.
pub struct GeometryBuffer<G: Gpu> {
    handles: Handles<G>,
    vertex_count: usize,
    index_count: Option<usize>,
}

impl<G: Gpu> GeometryBuffer<G> {
    /// Uploads the given vertex and optional index data once.
    pub fn create<V: bytemuck::Pod>(
        gl: &Arc<G>,
        vertices: &[V],
        indices: Option<&[u32]>,
    ) -> Result<UndescribedBuffer<G>, MeshError> {
        if vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(&index) = indices
            .unwrap_or_default()
            .iter()
            .find(|&&i| i as usize >= vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        let vao = gl
            .create_vertex_array()
            .map_err(|e| MeshError::Gpu("vertex array", e))?;
        let mut handles = Handles {
            gl: Arc::clone(gl),
            vao,
            vbo: match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(e) => {
                    gl.delete_vertex_array(vao);
                    return Err(MeshError::Gpu("vertex buffer", e));
                }
            },
            ebo: None,
        };
        if indices.is_some() {
            handles.ebo = Some(
                gl.create_buffer()
                    .map_err(|e| MeshError::Gpu("index buffer", e))?,
            );
        }

        gl.bind_vertex_array(Some(handles.vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(handles.vbo));
        gl.buffer_data(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(vertices),
            glow::STATIC_DRAW,
        );

        if let (Some(ebo), Some(indices)) = (handles.ebo, indices) {
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );
        }

        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

        Ok(UndescribedBuffer {
            handles,
            vertex_count: vertices.len(),
            index_count: indices.map(<[u32]>::len),
            vertex_size: std::mem::size_of::<V>(),
        })
    }

    /// Makes this buffer's vertex array the bound one.
    pub fn bind(&self) {
        self.handles.gl.bind_vertex_array(Some(self.handles.vao));
    }

    /// Clears the vertex array binding.
    pub fn unbind(&self) {
        self.handles.gl.bind_vertex_array(None);
    }

    /// Draws `count` elements of the buffer.
    ///
    /// With an index buffer `count` is the number of indices consumed, otherwise the number of
    /// vertices. Counts past the end of the data are clamped.
    pub fn draw(&self, count: usize) {
        let available = self.index_count.unwrap_or(self.vertex_count);
        let count = if count > available {
            log::warn!("draw of {count} elements clamped to the {available} available");
            available
        } else {
            count
        };
        if count == 0 {
            return;
        }

        let gl = &self.handles.gl;
        gl.bind_vertex_array(Some(self.handles.vao));
        if self.handles.ebo.is_some() {
            gl.draw_elements(glow::TRIANGLES, count as i32, glow::UNSIGNED_INT, 0);
        } else {
            gl.draw_arrays(glow::TRIANGLES, 0, count as i32);
        }
        gl.bind_vertex_array(None);
    }

    /// Draws the whole buffer.
    pub fn draw_all(&self) {
        self.draw(self.element_count());
    }

    /// Returns the number of indices, or vertices when the buffer is not indexed.
    pub fn element_count(&self) -> usize {
        self.index_count.unwrap_or(self.vertex_count)
    }

    pub fn is_indexed(&self) -> bool {
        self.handles.ebo.is_some()
    }

    /// The raw vertex array handle.
    pub fn vertex_array(&self) -> G::VertexArray {
        self.handles.vao
    }
}
