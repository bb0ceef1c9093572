use std::{error::Error, process::ExitCode};

use remus::{
    abs::{App, Gpu},
    asset,
    config::{self, Settings},
    logging,
    render::{FrameConfig, RenderLoop, geometry},
};

fn main() -> ExitCode {
    let (settings, settings_error) = match Settings::default_path() {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => (settings, None),
            Err(e) => (Settings::default(), Some(e)),
        },
        None => (Settings::default(), None),
    };

    let level = logging::resolve_level(&settings.log_level);
    if let Err(e) = logging::init(level, settings.log_file.as_deref()) {
        eprintln!("failed to initialize logging: {e}");
    }
    if let Some(e) = settings_error {
        log::error!("{e}; using default settings");
    }

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let mut app = App::new(config::TITLE, config::WIDTH, config::HEIGHT, settings.vsync)?;
    log::info!(
        "maximum vertex attributes supported: {}",
        app.gl.max_vertex_attribs()
    );

    let program = asset::load_program(
        &app.gl,
        &settings.shader_dir,
        &settings.vertex_shader,
        &settings.fragment_shader,
    )?;
    let quad = geometry::quad(&app.gl)?;

    let mut render_loop = RenderLoop::new(
        &app.gl,
        program,
        quad,
        FrameConfig {
            clear_color: settings.clear_color,
            bindings: settings.bindings,
            tint: settings.tint,
            size: (config::WIDTH as i32, config::HEIGHT as i32),
        },
    );
    render_loop.run(&mut app);
    Ok(())
}
