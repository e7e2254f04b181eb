//! The per-frame driver.
//!
//! [`run`] polls the surface, clears the framebuffer, draws every object of a [`Scene`] with
//! its own shader and transform, and presents, until the surface asks to close.

use glam::Mat4;

use crate::device::GraphicsDevice;
use crate::scene::Scene;
use crate::surface::Surface;

/// Fixed per-frame parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    /// Background colour the framebuffer is cleared to.
    pub clear_color: [f32; 4],
    /// Vertical field of view, in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.57, 0.30, 1.0, 1.0],
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl FrameSettings {
    /// Perspective projection for a framebuffer of the given pixel size.
    pub fn projection(&self, (width, height): (u32, u32)) -> Mat4 {
        let aspect = width as f32 / height.max(1) as f32;
        Mat4::perspective_rh_gl(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}

/// State of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
}

impl LoopState {
    /// Moves to [`LoopState::Closing`] once a close was requested. Closing is terminal.
    pub fn advance(self, close_requested: bool) -> Self {
        match self {
            LoopState::Running if close_requested => LoopState::Closing,
            state => state,
        }
    }
}

/// Summary of a finished loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    /// Frames presented.
    pub frames: u64,
}

/// Draws one frame of `scene` into the currently bound framebuffer.
pub fn render_frame<D: GraphicsDevice>(
    gl: &D,
    scene: &Scene<D>,
    projection: &Mat4,
    settings: &FrameSettings,
) {
    gl.clear_frame(settings.clear_color);

    for object in scene.objects() {
        let (Some(shader), Some(mesh)) = (scene.shader(object.shader), scene.mesh(object.mesh))
        else {
            log::warn!("Skipping object with a dangling handle: {object:?}");
            continue;
        };

        shader.use_program();
        shader.upload_matrices(&object.transform.model_matrix(), projection);
        mesh.render();
    }

    gl.use_program(None);
}

/// Runs frames until `surface` reports a close request.
pub fn run<D: GraphicsDevice, S: Surface>(
    surface: &mut S,
    gl: &D,
    scene: &Scene<D>,
    settings: &FrameSettings,
) -> LoopStats {
    let mut state = LoopState::Running;
    let mut stats = LoopStats::default();

    log::info!("Entering render loop with {} objects", scene.objects().len());

    loop {
        state = state.advance(surface.should_close());
        if state == LoopState::Closing {
            break;
        }

        surface.poll_events();

        let projection = settings.projection(surface.framebuffer_size());
        render_frame(gl, scene, &projection, settings);

        surface.swap_buffers();
        stats.frames += 1;
    }

    log::info!("Render loop finished after {} frames", stats.frames);
    stats
}
