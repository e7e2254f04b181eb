//! SDL2 and OpenGL window management.
//!
//! This module defines the [`Window`] struct which owns the SDL2 window, its OpenGL context
//! and the [`glow::Context`] loaded from it, and presents frames for the render loop.

use std::fmt;
use std::sync::Arc;

use glow::HasContext;
use sdl2::event::{Event, WindowEvent};
use tetra_core::Surface;

use crate::config::WindowConfig;

/// Why the window could not be brought up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    Sdl(String),
    Video(String),
    WindowCreation(String),
    Context(String),
    Loader(String),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Sdl(e) => write!(f, "SDL initialisation failed: {e}"),
            InitError::Video(e) => write!(f, "SDL video subsystem initialisation failed: {e}"),
            InitError::WindowCreation(e) => write!(f, "Window creation failed: {e}"),
            InitError::Context(e) => write!(f, "OpenGL context creation failed: {e}"),
            InitError::Loader(e) => write!(f, "OpenGL function loading failed: {e}"),
        }
    }
}

impl std::error::Error for InitError {}

/// The window and its current OpenGL context.
///
/// Fields are dropped in declaration order, so the GL context goes before the window and the
/// window before the SDL subsystems.
pub struct Window {
    event_pump: sdl2::EventPump,
    gl: Arc<glow::Context>,
    _gl_context: sdl2::video::GLContext,
    window: sdl2::video::Window,
    _video_subsystem: sdl2::VideoSubsystem,
    _sdl: sdl2::Sdl,
    width: u32,
    height: u32,
    close_requested: bool,
}

impl Window {
    /// Opens a window with an OpenGL 3.3 core, forward-compatible context and makes it current.
    pub fn new(config: &WindowConfig) -> Result<Self, InitError> {
        let sdl = sdl2::init().map_err(InitError::Sdl)?;
        let video_subsystem = sdl.video().map_err(InitError::Video)?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_context_flags().forward_compatible().set();
        gl_attr.set_depth_size(24);
        gl_attr.set_double_buffer(true);

        let window = video_subsystem
            .window(&config.title, config.width, config.height)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| InitError::WindowCreation(e.to_string()))?;

        let gl_context = window.gl_create_context().map_err(InitError::Context)?;
        window
            .gl_make_current(&gl_context)
            .map_err(InitError::Context)?;

        if config.vsync {
            if let Err(e) = video_subsystem.gl_set_swap_interval(1) {
                log::warn!("Could not enable vsync: {e}");
            }
        }

        if video_subsystem.gl_get_proc_address("glCreateProgram").is_null() {
            return Err(InitError::Loader(
                "glCreateProgram is not available in this context".to_string(),
            ));
        }
        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };

        let (buffer_width, buffer_height) = window.drawable_size();
        unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.viewport(0, 0, buffer_width as i32, buffer_height as i32);
        }

        let event_pump = sdl.event_pump().map_err(InitError::Sdl)?;

        log::info!(
            "Opened {}x{} window ({}x{} framebuffer)",
            config.width,
            config.height,
            buffer_width,
            buffer_height
        );

        Ok(Self {
            event_pump,
            gl: Arc::new(gl),
            _gl_context: gl_context,
            window,
            _video_subsystem: video_subsystem,
            _sdl: sdl,
            width: config.width,
            height: config.height,
            close_requested: false,
        })
    }

    /// The device used to create and draw GPU resources for this window.
    pub fn gl(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// Size the window was requested at, in screen coordinates.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Surface for Window {
    fn poll_events(&mut self) {
        let mut resized = false;
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => self.close_requested = true,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..),
                    ..
                } => resized = true,
                _ => {}
            }
        }

        if resized {
            let (width, height) = self.window.drawable_size();
            unsafe {
                self.gl.viewport(0, 0, width as i32, height as i32);
            }
            log::debug!("Framebuffer resized to {width}x{height}");
        }
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn swap_buffers(&mut self) {
        self.window.gl_swap_window();
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }
}
