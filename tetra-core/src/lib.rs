//! Core of the tetraview renderer.
//!
//! Everything here is independent of the windowing system: GPU access goes through the
//! [`device::GraphicsDevice`] trait and presentation through [`surface::Surface`], so the mesh
//! and shader lifecycles and the render loop can run against a fake device in tests.

pub mod device;
pub mod geometry;
pub mod mesh;
pub mod render_loop;
pub mod scene;
pub mod shader;
pub mod surface;

pub use device::{BufferTarget, GraphicsDevice, StageKind};
pub use mesh::Mesh;
pub use render_loop::{FrameSettings, LoopState, LoopStats};
pub use scene::{MeshId, Scene, SceneObject, ShaderId, Transform};
pub use shader::{ShaderError, ShaderProgram};
pub use surface::Surface;
