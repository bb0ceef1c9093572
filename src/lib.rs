//! Renders an indexed quad with a programmable OpenGL pipeline.
//!
//! Shader sources are compiled and linked into a [`abs::ShaderProgram`], the mesh is uploaded
//! once into an [`abs::GeometryBuffer`], and a [`render::RenderLoop`] draws it every frame in
//! filled or wireframe mode until the window asks to close.

pub mod abs;
pub mod asset;
pub mod config;
pub mod logging;
pub mod other;
pub mod render;
