//! Module for anything related to rendering.
//!
//! This module contains the render loop, the render mode state, the drawn geometry and the
//! embedded fallback shaders.

pub mod frame_loop;
pub mod geometry;
pub mod state;

pub use frame_loop::{FrameConfig, LoopState, RenderLoop, Tint, Window};
pub use state::{PolygonMode, RenderState};
