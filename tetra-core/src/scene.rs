//! Ownership of everything the render loop draws.
//!
//! A [`Scene`] owns meshes and shader programs in two arenas and refers to them from its
//! drawable objects through the copyable [`MeshId`] and [`ShaderId`] handles.

use glam::{Mat4, Vec3};

use crate::device::GraphicsDevice;
use crate::mesh::Mesh;
use crate::shader::ShaderProgram;

/// Handle to a mesh owned by a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

/// Handle to a shader program owned by a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(usize);

/// Placement of an object: translate, then scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn new(translation: Vec3, scale: Vec3) -> Self {
        Self { translation, scale }
    }

    /// `T(translation) * S(scale)`, so the scale is applied to the vertices first.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_scale(self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE)
    }
}

/// One draw: a mesh, the program to draw it with, and where to put it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshId,
    pub shader: ShaderId,
    pub transform: Transform,
}

/// Owns the GPU resources of everything that is drawn.
///
/// Dropping a scene (or calling [`Scene::teardown`]) releases every mesh before any shader
/// program.
pub struct Scene<D: GraphicsDevice> {
    meshes: Vec<Mesh<D>>,
    shaders: Vec<ShaderProgram<D>>,
    objects: Vec<SceneObject>,
}

impl<D: GraphicsDevice> Scene<D> {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            shaders: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh<D>) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_shader(&mut self, shader: ShaderProgram<D>) -> ShaderId {
        self.shaders.push(shader);
        ShaderId(self.shaders.len() - 1)
    }

    /// Adds a drawable object. Objects are drawn in insertion order.
    pub fn add_object(&mut self, mesh: MeshId, shader: ShaderId, transform: Transform) {
        self.objects.push(SceneObject {
            mesh,
            shader,
            transform,
        });
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh<D>> {
        self.meshes.get(id.0)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&ShaderProgram<D>> {
        self.shaders.get(id.0)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Releases all meshes, then all shader programs.
    pub fn teardown(mut self) {
        for mesh in &mut self.meshes {
            mesh.clear();
        }
        for shader in &mut self.shaders {
            shader.clear();
        }
        log::debug!(
            "Scene released {} meshes and {} shader programs",
            self.meshes.len(),
            self.shaders.len()
        );
    }
}

impl<D: GraphicsDevice> Default for Scene<D> {
    fn default() -> Self {
        Self::new()
    }
}
