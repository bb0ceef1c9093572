//! In-memory [`Gpu`] used by the unit tests.
//!
//! [`RecordingGpu`] keeps just enough OpenGL state to check what the renderer does: object
//! lifetimes, per-program uniform values, vertex array contents and every draw call together
//! with the program and polygon mode that were current when it was issued. Misuse that a real
//! driver would reject (or silently ignore) is collected in [`RecordingGpu::errors`].

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::gpu::Gpu;

/// A uniform value as stored by the fake driver.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: u32,
    pub count: i32,
    pub indexed: bool,
    /// Vertex indices consumed by the draw, resolved through the element buffer when indexed.
    pub vertices: Vec<u32>,
    pub program: Option<u32>,
    pub polygon_mode: u32,
}

/// A recorded attribute pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointer {
    pub index: u32,
    pub size: i32,
    pub stride: i32,
    pub offset: i32,
    pub buffer: u32,
    pub enabled: bool,
}

#[derive(Debug)]
struct FakeShader {
    shader_type: u32,
    source: String,
    compiled: bool,
    deleted: bool,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<u32>,
    linked: bool,
    active_uniforms: HashSet<String>,
    values: HashMap<String, UniformValue>,
    deleted: bool,
}

#[derive(Debug, Default)]
struct FakeVertexArray {
    element_buffer: Option<u32>,
    attribs: Vec<AttribPointer>,
    deleted: bool,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u32,
    shaders: HashMap<u32, FakeShader>,
    programs: HashMap<u32, FakeProgram>,
    vertex_arrays: HashMap<u32, FakeVertexArray>,
    buffers: HashMap<u32, Option<Vec<u8>>>,
    current_program: Option<u32>,
    bound_vertex_array: Option<u32>,
    bound_array_buffer: Option<u32>,
    bound_element_buffer: Option<u32>,
    polygon_mode: u32,
    clear_color: [f32; 4],
    clears: usize,
    viewport: Option<[i32; 4]>,
    draws: Vec<DrawCall>,
    errors: Vec<String>,
    link_failure: Option<String>,
    shader_limit: Option<usize>,
    max_vertex_attribs: u32,
}

impl State {
    fn handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn element_buffer(&self) -> Option<u32> {
        match self.bound_vertex_array {
            Some(vao) => self.vertex_arrays.get(&vao).and_then(|v| v.element_buffer),
            None => self.bound_element_buffer,
        }
    }
}

/// The recording backend.
pub struct RecordingGpu {
    state: Mutex<State>,
}

impl Default for RecordingGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                polygon_mode: glow::FILL,
                max_vertex_attribs: 16,
                ..State::default()
            }),
        }
    }

    /// Makes every subsequent link fail with the given log.
    pub fn fail_links_with(&self, log: &str) {
        self.state.lock().unwrap().link_failure = Some(log.to_string());
    }

    /// Makes shader creation fail once `count` shader objects have been created.
    pub fn fail_shader_creation_after(&self, count: usize) {
        self.state.lock().unwrap().shader_limit = Some(count);
    }

    pub fn live_shaders(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.shaders.values().filter(|s| !s.deleted).count()
    }

    pub fn shaders_created(&self) -> usize {
        self.state.lock().unwrap().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.programs.values().filter(|p| !p.deleted).count()
    }

    pub fn live_buffers(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.vertex_arrays.values().filter(|v| !v.deleted).count()
    }

    pub fn current_program(&self) -> Option<u32> {
        self.state.lock().unwrap().current_program
    }

    pub fn bound_vertex_array(&self) -> Option<u32> {
        self.state.lock().unwrap().bound_vertex_array
    }

    pub fn uniform(&self, program: u32, name: &str) -> Option<UniformValue> {
        let state = self.state.lock().unwrap();
        state.programs.get(&program)?.values.get(name).cloned()
    }

    pub fn attribs(&self, vertex_array: u32) -> Vec<AttribPointer> {
        let state = self.state.lock().unwrap();
        state
            .vertex_arrays
            .get(&vertex_array)
            .map(|v| v.attribs.clone())
            .unwrap_or_default()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.lock().unwrap().draws.clone()
    }

    pub fn clears(&self) -> usize {
        self.state.lock().unwrap().clears
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.state.lock().unwrap().clear_color
    }

    pub fn viewport_value(&self) -> Option<[i32; 4]> {
        self.state.lock().unwrap().viewport
    }

    pub fn errors(&self) -> Vec<String> {
        self.state.lock().unwrap().errors.clone()
    }

    fn set_uniform(&self, location: &(u32, String), value: UniformValue) {
        let mut state = self.state.lock().unwrap();
        let (program, name) = location;
        if state.current_program != Some(*program) {
            state
                .errors
                .push(format!("uniform {name} set while program {program} is not in use"));
            return;
        }
        if let Some(program) = state.programs.get_mut(program) {
            program.values.insert(name.clone(), value);
        }
    }
}

fn compiles(source: &str) -> bool {
    let opened = source.matches('{').count();
    let closed = source.matches('}').count();
    !source.trim().is_empty() && source.contains("void main") && opened == closed
}

fn uniform_names(source: &str) -> impl Iterator<Item = String> + '_ {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("uniform "))
        .filter_map(|line| line.split_whitespace().last())
        .map(|name| {
            let name = name.trim_end_matches(';');
            name.split('[').next().unwrap_or(name).to_string()
        })
}

impl Gpu for RecordingGpu {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = (u32, String);

    fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let mut state = self.state.lock().unwrap();
        if state.shader_limit.is_some_and(|limit| state.shaders.len() >= limit) {
            return Err("out of memory".into());
        }
        let id = state.handle();
        state.shaders.insert(
            id,
            FakeShader {
                shader_type,
                source: String::new(),
                compiled: false,
                deleted: false,
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(s) = state.shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.lock().unwrap();
        if let Some(s) = state.shaders.get_mut(&shader) {
            s.compiled = compiles(&s.source);
        }
    }

    fn get_shader_compile_status(&self, shader: u32) -> bool {
        let state = self.state.lock().unwrap();
        state.shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn get_shader_info_log(&self, shader: u32) -> String {
        let state = self.state.lock().unwrap();
        match state.shaders.get(&shader) {
            Some(s) if !s.compiled => "0:1(1): error: syntax error, unexpected end of file".into(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.lock().unwrap();
        let already = match state.shaders.get_mut(&shader) {
            Some(s) => std::mem::replace(&mut s.deleted, true),
            None => true,
        };
        if already {
            state.errors.push(format!("shader {shader} deleted twice"));
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.lock().unwrap();
        let id = state.handle();
        state.programs.insert(id, FakeProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.lock().unwrap();
        let failure = state.link_failure.is_some();
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };
        let stages: Vec<&FakeShader> = attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .collect();
        let complete = [glow::VERTEX_SHADER, glow::FRAGMENT_SHADER].iter().all(|ty| {
            stages
                .iter()
                .filter(|s| s.shader_type == *ty && s.compiled)
                .count()
                == 1
        });
        let names: HashSet<String> = stages.iter().flat_map(|s| uniform_names(&s.source)).collect();
        if let Some(p) = state.programs.get_mut(&program) {
            p.linked = complete && !failure;
            p.active_uniforms = if p.linked { names } else { HashSet::new() };
        }
    }

    fn get_program_link_status(&self, program: u32) -> bool {
        let state = self.state.lock().unwrap();
        state.programs.get(&program).is_some_and(|p| p.linked)
    }

    fn get_program_info_log(&self, program: u32) -> String {
        let state = self.state.lock().unwrap();
        match state.programs.get(&program) {
            Some(p) if !p.linked => state
                .link_failure
                .clone()
                .unwrap_or_else(|| "error: linking with uncompiled/unspecialized shader".into()),
            _ => String::new(),
        }
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = program {
            let usable = state.programs.get(&id).is_some_and(|p| p.linked && !p.deleted);
            if !usable {
                state.errors.push(format!("use of unlinked or deleted program {id}"));
            }
        }
        state.current_program = program;
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.lock().unwrap();
        let already = match state.programs.get_mut(&program) {
            Some(p) => std::mem::replace(&mut p.deleted, true),
            None => true,
        };
        if already {
            state.errors.push(format!("program {program} deleted twice"));
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn get_uniform_location(&self, program: u32, name: &str) -> Option<(u32, String)> {
        let state = self.state.lock().unwrap();
        let p = state.programs.get(&program)?;
        p.active_uniforms
            .contains(name)
            .then(|| (program, name.to_string()))
    }

    fn uniform_1_i32(&self, location: &(u32, String), x: i32) {
        self.set_uniform(location, UniformValue::Int(x));
    }

    fn uniform_1_f32(&self, location: &(u32, String), x: f32) {
        self.set_uniform(location, UniformValue::Float(x));
    }

    fn uniform_2_f32(&self, location: &(u32, String), x: f32, y: f32) {
        self.set_uniform(location, UniformValue::Vec2([x, y]));
    }

    fn uniform_3_f32(&self, location: &(u32, String), x: f32, y: f32, z: f32) {
        self.set_uniform(location, UniformValue::Vec3([x, y, z]));
    }

    fn uniform_4_f32(&self, location: &(u32, String), x: f32, y: f32, z: f32, w: f32) {
        self.set_uniform(location, UniformValue::Vec4([x, y, z, w]));
    }

    fn uniform_matrix_4_f32(&self, location: &(u32, String), matrix: &[f32; 16]) {
        self.set_uniform(location, UniformValue::Mat4(*matrix));
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut state = self.state.lock().unwrap();
        let id = state.handle();
        state.vertex_arrays.insert(id, FakeVertexArray::default());
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.state.lock().unwrap().bound_vertex_array = vertex_array;
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.lock().unwrap();
        let already = match state.vertex_arrays.get_mut(&vertex_array) {
            Some(v) => std::mem::replace(&mut v.deleted, true),
            None => true,
        };
        if already {
            state
                .errors
                .push(format!("vertex array {vertex_array} deleted twice"));
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut state = self.state.lock().unwrap();
        let id = state.handle();
        state.buffers.insert(id, None);
        Ok(id)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        let mut state = self.state.lock().unwrap();
        match target {
            glow::ARRAY_BUFFER => state.bound_array_buffer = buffer,
            glow::ELEMENT_ARRAY_BUFFER => {
                state.bound_element_buffer = buffer;
                if let Some(vao) = state.bound_vertex_array
                    && let Some(v) = state.vertex_arrays.get_mut(&vao)
                {
                    v.element_buffer = buffer;
                }
            }
            other => state.errors.push(format!("unsupported buffer target {other:#x}")),
        }
    }

    fn buffer_data(&self, target: u32, data: &[u8], _usage: u32) {
        let mut state = self.state.lock().unwrap();
        let bound = match target {
            glow::ARRAY_BUFFER => state.bound_array_buffer,
            _ => state.element_buffer(),
        };
        let Some(id) = bound.filter(|id| state.buffers.contains_key(id)) else {
            state.errors.push(format!("no buffer bound to {target:#x}"));
            return;
        };
        state.buffers.insert(id, Some(data.to_vec()));
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.lock().unwrap();
        if state.buffers.remove(&buffer).is_none() {
            state.errors.push(format!("buffer {buffer} deleted twice"));
        }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        let mut state = self.state.lock().unwrap();
        let (Some(vao), Some(buffer)) = (state.bound_vertex_array, state.bound_array_buffer) else {
            state
                .errors
                .push("attribute described without a bound vertex array and buffer".into());
            return;
        };
        if let Some(v) = state.vertex_arrays.get_mut(&vao) {
            v.attribs.retain(|a| a.index != index);
            v.attribs.push(AttribPointer {
                index,
                size,
                stride,
                offset,
                buffer,
                enabled: false,
            });
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.lock().unwrap();
        let Some(vao) = state.bound_vertex_array else {
            state.errors.push("attribute enabled without a bound vertex array".into());
            return;
        };
        if let Some(v) = state.vertex_arrays.get_mut(&vao) {
            for attrib in v.attribs.iter_mut().filter(|a| a.index == index) {
                attrib.enabled = true;
            }
        }
    }

    fn max_vertex_attribs(&self) -> u32 {
        self.state.lock().unwrap().max_vertex_attribs
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        let mut state = self.state.lock().unwrap();
        if element_type != glow::UNSIGNED_INT {
            state.errors.push(format!("unexpected element type {element_type:#x}"));
        }
        let indices: Vec<u32> = state
            .element_buffer()
            .and_then(|id| state.buffers.get(&id).cloned().flatten())
            .map(|bytes| {
                bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                    .collect()
            })
            .unwrap_or_default();
        let start = offset as usize / 4;
        let end = start + count as usize;
        if end > indices.len() {
            state.errors.push(format!(
                "draw of {count} indices reads past the {} available",
                indices.len()
            ));
        }
        let vertices = indices
            .get(start..end.min(indices.len()))
            .unwrap_or_default()
            .to_vec();
        let call = DrawCall {
            mode,
            count,
            indexed: true,
            vertices,
            program: state.current_program,
            polygon_mode: state.polygon_mode,
        };
        state.draws.push(call);
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        let mut state = self.state.lock().unwrap();
        let call = DrawCall {
            mode,
            count,
            indexed: false,
            vertices: (first as u32..(first + count) as u32).collect(),
            program: state.current_program,
            polygon_mode: state.polygon_mode,
        };
        state.draws.push(call);
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.lock().unwrap().clear_color = [red, green, blue, alpha];
    }

    fn clear(&self, _mask: u32) {
        self.state.lock().unwrap().clears += 1;
    }

    fn polygon_mode(&self, _face: u32, mode: u32) {
        self.state.lock().unwrap().polygon_mode = mode;
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.lock().unwrap().viewport = Some([x, y, width, height]);
    }
}
