//! The render mode shared between input handling and the render loop.

use serde::{Deserialize, Serialize};

/// How polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolygonMode {
    #[default]
    Filled,
    Wireframe,
}

impl PolygonMode {
    /// The OpenGL polygon mode constant.
    pub fn gl_mode(self) -> u32 {
        match self {
            PolygonMode::Filled => glow::FILL,
            PolygonMode::Wireframe => glow::LINE,
        }
    }
}

/// State read by the render loop once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderState {
    pub mode: PolygonMode,
}

impl RenderState {
    pub fn new(mode: PolygonMode) -> Self {
        Self { mode }
    }

    /// Flips between filled and wireframe rendering and returns the new mode.
    pub fn toggle(&mut self) -> PolygonMode {
        self.mode = match self.mode {
            PolygonMode::Filled => PolygonMode::Wireframe,
            PolygonMode::Wireframe => PolygonMode::Filled,
        };
        self.mode
    }

    pub fn is_wireframe(&self) -> bool {
        self.mode == PolygonMode::Wireframe
    }
}
