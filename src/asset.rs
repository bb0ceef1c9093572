//! Shader source loading.
//!
//! Sources are read from disk in full before a program is built. [`load_program`] substitutes
//! the embedded [`ShaderSources::fallback`] program when the configured one cannot be read or
//! built, and only returns an error when the fallback fails as well.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::abs::{Gpu, ShaderError, ShaderProgram};

const FALLBACK_VERT: &str = include_str!("render/shaders/fallback/vert.glsl");
const FALLBACK_FRAG: &str = include_str!("render/shaders/fallback/frag.glsl");

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The vertex and fragment source text of one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    /// Reads `vertex` and `fragment` from `dir`.
    pub fn read(dir: &Path, vertex: &str, fragment: &str) -> Result<Self, AssetError> {
        Ok(Self {
            vertex: read_source(&dir.join(vertex))?,
            fragment: read_source(&dir.join(fragment))?,
        })
    }

    /// The flat colour program compiled into the binary.
    pub fn fallback() -> Self {
        Self {
            vertex: FALLBACK_VERT.to_string(),
            fragment: FALLBACK_FRAG.to_string(),
        }
    }
}

/// Builds the program from the `vertex` and `fragment` files in `dir`, or the fallback program
/// if they cannot be read or do not build.
pub fn load_program<G: Gpu>(
    gl: &Arc<G>,
    dir: &Path,
    vertex: &str,
    fragment: &str,
) -> Result<ShaderProgram<G>, ShaderError> {
    match ShaderSources::read(dir, vertex, fragment) {
        Ok(sources) => match ShaderProgram::load(gl, &sources.vertex, &sources.fragment) {
            Ok(program) => return Ok(program),
            Err(e) => log::error!("{e}; using the fallback program"),
        },
        Err(e) => log::error!("{e}; using the fallback program"),
    }

    let fallback = ShaderSources::fallback();
    ShaderProgram::load(gl, &fallback.vertex, &fallback.fragment)
}

fn read_source(path: &Path) -> Result<String, AssetError> {
    let source = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("read {} bytes of shader source from {}", source.len(), path.display());
    Ok(source)
}
