//! This module contains the core GPU abstractions of the renderer, including the OpenGL surface,
//! window and context setup, shader management and geometry buffers.

#[cfg(feature = "sdl")]
pub mod app;
#[cfg(test)]
pub mod fake;
pub mod gpu;
pub mod mesh;
pub mod shader;

#[cfg(feature = "sdl")]
pub use app::*;
pub use gpu::*;
pub use mesh::*;
pub use shader::*;
