use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tetra_core::{Scene, ShaderProgram, geometry, render_loop};

use crate::{config::Config, window::Window};

mod config;
mod logging;
mod window;

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = match config.log_level_filter() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init_logging(level) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    let mut window = match Window::new(&config.window) {
        Ok(window) => window,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let gl = Arc::clone(window.gl());

    let mut scene = Scene::new();

    let shader = match ShaderProgram::from_files(
        &gl,
        &config.shaders.vertex,
        &config.shaders.fragment,
    ) {
        Ok(shader) => scene.add_shader(shader),
        Err(e) => {
            log::error!("Could not build the shader program: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = geometry::build_demo_scene(&gl, &mut scene, shader) {
        log::error!("Could not create the demo meshes: {e}");
        return ExitCode::FAILURE;
    }

    let stats = render_loop::run(&mut window, &*gl, &scene, &config.frame_settings());

    // Meshes and shaders first, then the context they live in.
    let (width, height) = window.size();
    scene.teardown();
    drop(gl);
    drop(window);

    log::info!("Closed {width}x{height} window after {} frames", stats.frames);
    ExitCode::SUCCESS
}
