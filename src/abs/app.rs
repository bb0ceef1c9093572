//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2 window, the OpenGL 3.3
//! core context and the event pump. [`App`] is the [`Window`] the render loop presents to.

use std::sync::Arc;

use sdl2::{event::Event, keyboard::Keycode, video::SwapInterval};

use crate::{
    other::{Key, WindowEvent},
    render::Window,
};

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Creates a new resizable [`App`] window with the specified title, width, and height.
    pub fn new(title: &str, width: u32, height: u32, vsync: bool) -> Result<Self, String> {
        let sdl = sdl2::init()?;
        let video_subsystem = sdl.video()?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);

        let window = video_subsystem
            .window(title, width, height)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;
        let gl_context = window.gl_create_context()?;
        window.gl_make_current(&gl_context)?;

        let interval = if vsync {
            SwapInterval::VSync
        } else {
            SwapInterval::Immediate
        };
        if let Err(e) = video_subsystem.gl_set_swap_interval(interval) {
            log::warn!("could not set swap interval: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump()?;
        log::info!("created {width}x{height} window \"{title}\" with an OpenGL 3.3 core context");

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl: Arc::new(gl),
            event_pump,
        })
    }
}

impl Window for App {
    fn present(&mut self) {
        self.window.gl_swap_window();
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.event_pump.poll_iter().filter_map(translate).collect()
    }
}

fn translate(event: Event) -> Option<WindowEvent> {
    match event {
        Event::Quit { .. } => Some(WindowEvent::Quit),
        Event::Window {
            win_event: sdl2::event::WindowEvent::Resized(width, height),
            ..
        } => Some(WindowEvent::Resized(width, height)),
        Event::KeyDown {
            keycode: Some(keycode),
            repeat,
            ..
        } => Some(WindowEvent::KeyDown {
            key: map_key(keycode),
            repeat,
        }),
        Event::KeyUp {
            keycode: Some(keycode),
            ..
        } => Some(WindowEvent::KeyUp {
            key: map_key(keycode),
        }),
        _ => None,
    }
}

fn map_key(keycode: Keycode) -> Key {
    let name = keycode.name();
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Key::char(c),
        _ => match name.as_str() {
            "Escape" => Key::Escape,
            "Space" => Key::Space,
            "Return" => Key::Enter,
            "Tab" => Key::Tab,
            _ => Key::Other,
        },
    }
}
