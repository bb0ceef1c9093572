//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing OpenGL shaders.
//! A program is built from a vertex and a fragment source with [`ShaderProgram::load`], which
//! compiles both stages, links them and reports every diagnostic in a [`BuildReport`].
//! This module also provides the [`Uniform`] trait for setting uniform variables in shader
//! programs.

use std::{fmt, sync::Arc};

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::gpu::Gpu;

/// The programmable pipeline stages a [`ShaderProgram`] is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The OpenGL shader type constant of the stage.
    pub fn gl_type(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Outcome of compiling (or linking) one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub succeeded: bool,
    pub log: String,
}

/// Diagnostics gathered while building a [`ShaderProgram`].
///
/// Both stages are always compiled, so both entries are filled in even when one of them fails.
/// `link` is only present when linking was attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub vertex: StageReport,
    pub fragment: StageReport,
    pub link: Option<StageReport>,
}

impl BuildReport {
    /// Returns the report of the given stage.
    pub fn stage(&self, stage: ShaderStage) -> &StageReport {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    fn stage_mut(&mut self, stage: ShaderStage) -> &mut StageReport {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }

    /// Returns the stages that failed to compile, in pipeline order.
    pub fn failed_stages(&self) -> Vec<ShaderStage> {
        [ShaderStage::Vertex, ShaderStage::Fragment]
            .into_iter()
            .filter(|stage| !self.stage(*stage).succeeded)
            .collect()
    }

    fn compile_summary(&self) -> String {
        self.failed_stages()
            .iter()
            .map(|stage| format!("{stage}: {}", self.stage(*stage).log.trim()))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn link_log(&self) -> &str {
        self.link.as_ref().map_or("", |link| link.log.trim())
    }
}

/// Errors raised while building a [`ShaderProgram`].
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    /// The driver refused to create a shader or program object. Carries the reports of the
    /// stages compiled before the failure.
    #[error("failed to allocate {0}: {1}")]
    Gpu(&'static str, String, BuildReport),
    /// At least one stage failed to compile. Linking was not attempted.
    #[error("shader compilation failed ({})", .0.compile_summary())]
    Compile(BuildReport),
    /// Both stages compiled but the program failed to link.
    #[error("shader program failed to link: {}", .0.link_log())]
    Link(BuildReport),
}

impl ShaderError {
    /// The diagnostics collected before the failure.
    pub fn report(&self) -> &BuildReport {
        match self {
            ShaderError::Gpu(_, _, report)
            | ShaderError::Compile(report)
            | ShaderError::Link(report) => report,
        }
    }
}

/// Represents an individual OpenGL shader.
///
/// The shader object is deleted when this value is dropped, whether or not it compiled.
pub struct Shader<G: Gpu> {
    gl: Arc<G>,
    id: G::Shader,
    stage: ShaderStage,
}

impl<G: Gpu> Shader<G> {
    /// Compiles a new shader from the given source code.
    ///
    /// The shader is returned together with its compile report; a shader that failed to compile
    /// is still returned so that it is released like any other.
    pub fn compile(
        gl: &Arc<G>,
        stage: ShaderStage,
        source: &str,
    ) -> Result<(Self, StageReport), ShaderError> {
        let id = gl
            .create_shader(stage.gl_type())
            .map_err(|e| ShaderError::Gpu("shader", e, BuildReport::default()))?;
        let shader = Self {
            gl: Arc::clone(gl),
            id,
            stage,
        };

        gl.shader_source(id, source);
        gl.compile_shader(id);

        let report = StageReport {
            succeeded: gl.get_shader_compile_status(id),
            log: gl.get_shader_info_log(id),
        };
        Ok((shader, report))
    }

    /// The pipeline stage of the shader.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<G: Gpu> Drop for Shader<G> {
    fn drop(&mut self) {
        self.gl.delete_shader(self.id);
    }
}

/// Represents a uniform variable in a shader program.
pub trait Uniform {
    /// Uploads the value to the given location of the program currently in use.
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation);
}

impl Uniform for bool {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_i32(location, *self as i32);
    }
}

impl Uniform for i32 {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_i32(location, *self);
    }
}

impl Uniform for f32 {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_f32(location, *self);
    }
}

impl Uniform for Vec2 {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_2_f32(location, self.x, self.y);
    }
}

impl Uniform for Vec3 {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_3_f32(location, self.x, self.y, self.z);
    }
}

impl Uniform for Vec4 {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_4_f32(location, self.x, self.y, self.z, self.w);
    }
}

impl Uniform for Mat4 {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_matrix_4_f32(location, &self.to_cols_array());
    }
}

impl<T: Uniform> Uniform for &T {
    fn upload<G: Gpu>(&self, gl: &G, location: &G::UniformLocation) {
        (*self).upload(gl, location);
    }
}

/// Represents a linked OpenGL shader program made of a vertex and a fragment stage.
///
/// A value of this type always wraps a successfully linked program.
pub struct ShaderProgram<G: Gpu> {
    gl: Arc<G>,
    id: G::Program,
    report: BuildReport,
}

impl<G: Gpu> ShaderProgram<G> {
    /// Compiles both sources and links them into a program.
    ///
    /// Each stage is compiled independently and its outcome recorded before any error is
    /// returned. Linking only happens when both stages compiled. The stage objects never outlive
    /// this call.
    pub fn load(gl: &Arc<G>, vertex_source: &str, fragment_source: &str) -> Result<Self, ShaderError> {
        let mut report = BuildReport::default();
        let mut shaders = Vec::with_capacity(2);

        for (stage, source) in [
            (ShaderStage::Vertex, vertex_source),
            (ShaderStage::Fragment, fragment_source),
        ] {
            let (shader, outcome) = match Shader::compile(gl, stage, source) {
                Ok(compiled) => compiled,
                Err(ShaderError::Gpu(object, message, _)) => {
                    log::error!("failed to allocate {stage} {object}: {message}");
                    return Err(ShaderError::Gpu(object, message, report));
                }
                Err(e) => return Err(e),
            };
            if outcome.succeeded {
                if !outcome.log.trim().is_empty() {
                    log::warn!("{stage} shader compiled with warnings: {}", outcome.log.trim());
                }
            } else {
                log::error!("{stage} shader failed to compile: {}", outcome.log.trim());
            }
            *report.stage_mut(stage) = outcome;
            shaders.push(shader);
        }

        if !report.failed_stages().is_empty() {
            return Err(ShaderError::Compile(report));
        }

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(e) => return Err(ShaderError::Gpu("program", e, report)),
        };

        for shader in &shaders {
            gl.attach_shader(program, shader.id);
        }

        gl.link_program(program);

        for shader in &shaders {
            gl.detach_shader(program, shader.id);
        }
        drop(shaders);

        let link = StageReport {
            succeeded: gl.get_program_link_status(program),
            log: gl.get_program_info_log(program),
        };
        let linked = link.succeeded;
        report.link = Some(link);

        if !linked {
            log::error!("shader program failed to link: {}", report.link_log());
            gl.delete_program(program);
            return Err(ShaderError::Link(report));
        }
        if !report.link_log().is_empty() {
            log::warn!("shader program linked with warnings: {}", report.link_log());
        }

        log::debug!("linked shader program {program:?}");
        Ok(Self {
            gl: Arc::clone(gl),
            id: program,
            report,
        })
    }

    /// Binds the shader program for use.
    pub fn use_program(&self) {
        self.gl.use_program(Some(self.id));
    }

    /// Sets a uniform variable in the shader program.
    ///
    /// The location is looked up on every call. Names that are not active in the program are
    /// ignored. The program must be in use.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        if let Some(location) = self.gl.get_uniform_location(self.id, name) {
            value.upload(self.gl.as_ref(), &location);
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    /// The compile and link diagnostics of the program.
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// The raw program handle.
    pub fn id(&self) -> G::Program {
        self.id
    }
}

impl<G: Gpu> Drop for ShaderProgram<G> {
    fn drop(&mut self) {
        self.gl.delete_program(self.id);
    }
}
