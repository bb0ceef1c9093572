//! Window constants and user settings.
//!
//! The window title and size are fixed. Everything else can be overridden by a JSON settings
//! file in the user's configuration directory; a missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{other::KeyBindings, render::Tint};

pub const TITLE: &str = "Remus Voxel Engine";
pub const WIDTH: u32 = 1600;
pub const HEIGHT: u32 = 800;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the shader sources are read from, relative to the working directory.
    pub shader_dir: PathBuf,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub clear_color: [f32; 4],
    pub vsync: bool,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    /// Optional file that receives a copy of the log.
    pub log_file: Option<PathBuf>,
    pub bindings: KeyBindings,
    pub tint: Tint,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            vertex_shader: "shader.vert".to_string(),
            fragment_shader: "shader.frag".to_string(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            vsync: true,
            log_level: "info".to_string(),
            log_file: None,
            bindings: KeyBindings::default(),
            tint: Tint::Unset,
        }
    }
}

impl Settings {
    /// The default location of the settings file, if the platform has a configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("remus").join(SETTINGS_FILE))
    }

    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
