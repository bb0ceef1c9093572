//! The per-frame render loop.
//!
//! [`RenderLoop`] owns the shader program and the geometry created at setup and drives them
//! once per frame: clear, apply the polygon mode, activate the program and its uniforms, draw,
//! then hand the frame to the [`Window`] for presentation and event polling. Close requests are
//! only acted upon between frames.

use std::{sync::Arc, time::Instant};

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::{
    abs::{GeometryBuffer, Gpu, ShaderProgram},
    other::{KeyBindings, KeyboardState, WindowEvent},
    render::state::RenderState,
};

/// The window collaborator: presents finished frames and delivers pending events.
pub trait Window {
    /// Presents the frame drawn since the last call. May block on vertical sync.
    fn present(&mut self);

    /// Returns the events received since the last poll.
    fn poll_events(&mut self) -> Vec<WindowEvent>;
}

/// States of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Between frames.
    Idle,
    /// Inside a frame.
    Drawing,
    /// A close was requested; no further frames are drawn.
    Terminated,
}

/// What the renderer writes to the `u_color` uniform each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tint {
    /// Never written; the program sees its default value.
    #[default]
    Unset,
    /// A constant RGBA colour.
    Fixed([f32; 4]),
    /// Green whose intensity follows `sin(t) / 2 + 0.5`.
    Pulse,
}

impl Tint {
    /// The colour for the given time in seconds, if any.
    pub fn color_at(self, time: f32) -> Option<Vec4> {
        match self {
            Tint::Unset => None,
            Tint::Fixed(color) => Some(Vec4::from_array(color)),
            Tint::Pulse => Some(Vec4::new(0.0, time.sin() / 2.0 + 0.5, 0.0, 1.0)),
        }
    }
}

/// Fixed per-loop settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConfig {
    pub clear_color: [f32; 4],
    pub bindings: KeyBindings,
    pub tint: Tint,
    /// Initial drawable size in pixels.
    pub size: (i32, i32),
}

pub struct RenderLoop<G: Gpu> {
    gl: Arc<G>,
    program: ShaderProgram<G>,
    geometry: GeometryBuffer<G>,
    draw_count: usize,
    render_state: RenderState,
    keyboard: KeyboardState,
    config: FrameConfig,
    state: LoopState,
    close_requested: bool,
    frames: u64,
}

impl<G: Gpu> RenderLoop<G> {
    /// Creates a loop drawing the whole of `geometry` with `program`, and sets the initial
    /// viewport.
    pub fn new(
        gl: &Arc<G>,
        program: ShaderProgram<G>,
        geometry: GeometryBuffer<G>,
        config: FrameConfig,
    ) -> Self {
        let (width, height) = config.size;
        gl.viewport(0, 0, width, height);

        Self {
            gl: Arc::clone(gl),
            draw_count: geometry.element_count(),
            program,
            geometry,
            render_state: RenderState::default(),
            keyboard: KeyboardState::default(),
            config,
            state: LoopState::Idle,
            close_requested: false,
            frames: 0,
        }
    }

    /// Starts the loop with the given render state instead of the default one.
    pub fn with_render_state(mut self, render_state: RenderState) -> Self {
        self.render_state = render_state;
        self
    }

    /// Overrides the number of elements drawn each frame.
    pub fn with_draw_count(mut self, count: usize) -> Self {
        self.draw_count = count;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    pub fn program(&self) -> &ShaderProgram<G> {
        &self.program
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Asks the loop to stop. Takes effect at the next frame boundary.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Runs one frame and returns the state the loop is left in.
    ///
    /// When a close was requested the loop moves to [`LoopState::Terminated`] without drawing.
    pub fn frame<W: Window>(&mut self, window: &mut W, time: f32) -> LoopState {
        match self.state {
            LoopState::Terminated => return LoopState::Terminated,
            LoopState::Drawing => unreachable!("frame started while another is drawing"),
            LoopState::Idle => {}
        }
        if self.close_requested {
            log::info!("close requested after {} frames", self.frames);
            self.state = LoopState::Terminated;
            return self.state;
        }

        self.state = LoopState::Drawing;
        log::trace!("frame {} at {time:.3}s", self.frames);

        let [red, green, blue, alpha] = self.config.clear_color;
        self.gl.clear_color(red, green, blue, alpha);
        self.gl.clear(glow::COLOR_BUFFER_BIT);

        self.gl
            .polygon_mode(glow::FRONT_AND_BACK, self.render_state.mode.gl_mode());

        self.program.use_program();
        if let Some(color) = self.config.tint.color_at(time) {
            self.program.set_bool("u_tinted", true);
            self.program.set_uniform("u_color", color);
        }
        self.program.set_float("u_time", time);

        self.geometry.draw(self.draw_count);

        window.present();
        self.keyboard.begin_tick();
        for event in window.poll_events() {
            self.handle_event(&event);
        }

        self.frames += 1;
        self.state = LoopState::Idle;
        self.state
    }

    /// Runs frames until the loop terminates and returns how many were drawn.
    pub fn run<W: Window>(&mut self, window: &mut W) -> u64 {
        let start = Instant::now();
        while self.frame(window, start.elapsed().as_secs_f32()) != LoopState::Terminated {}
        log::info!("render loop finished after {} frames", self.frames);
        self.frames
    }

    /// Applies one window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        let pressed = self.keyboard.apply(event);
        match *event {
            WindowEvent::Quit => self.request_close(),
            WindowEvent::Resized(width, height) => {
                log::debug!("viewport resized to {width}x{height}");
                self.gl.viewport(0, 0, width, height);
            }
            _ => {}
        }

        let Some(key) = pressed else {
            return;
        };
        if key == self.config.bindings.exit {
            self.request_close();
        } else if key == self.config.bindings.toggle_wireframe {
            let mode = self.render_state.toggle();
            log::debug!("render mode set to {mode:?}");
        }
    }
}
