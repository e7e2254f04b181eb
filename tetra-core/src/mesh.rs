//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct for managing position-only mesh data on the GPU
//! side. A mesh owns one vertex array, one vertex buffer and one index buffer, which are
//! always allocated and released together.

use std::sync::Arc;

use crate::device::{BufferTarget, GraphicsDevice};

/// Attribute slot the vertex positions are bound to.
pub const POSITION_SLOT: u32 = 0;
/// Floats per vertex position.
pub const POSITION_COMPONENTS: usize = 3;

/// The three GPU objects backing a mesh.
pub struct MeshBuffers<D: GraphicsDevice> {
    pub vertex_array: D::VertexArray,
    pub vertex_buffer: D::Buffer,
    pub index_buffer: D::Buffer,
}

/// Represents a mesh stored on the GPU side.
pub struct Mesh<D: GraphicsDevice> {
    gl: Arc<D>,
    buffers: Option<MeshBuffers<D>>,
    index_count: usize,
}

impl<D: GraphicsDevice> Mesh<D> {
    /// Creates an empty mesh that owns no GPU objects yet.
    pub fn new(gl: &Arc<D>) -> Self {
        Self {
            gl: Arc::clone(gl),
            buffers: None,
            index_count: 0,
        }
    }

    /// Creates a mesh and uploads the given positions and indices.
    pub fn with_data(gl: &Arc<D>, vertices: &[f32], indices: &[u32]) -> Result<Self, String> {
        let mut mesh = Self::new(gl);
        mesh.create(vertices, indices)?;
        Ok(mesh)
    }

    /// Uploads the given data, replacing whatever the mesh held before.
    ///
    /// `vertices` is a flat list of `x, y, z` positions. On error the mesh is left empty.
    pub fn create(&mut self, vertices: &[f32], indices: &[u32]) -> Result<(), String> {
        self.clear();

        if vertices.len() % POSITION_COMPONENTS != 0 {
            return Err(format!(
                "Vertex data length {} is not a multiple of {POSITION_COMPONENTS}",
                vertices.len()
            ));
        }
        let vertex_count = vertices.len() / POSITION_COMPONENTS;
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(format!(
                "Index {bad} is out of range for {vertex_count} vertices"
            ));
        }
        if i32::try_from(indices.len()).is_err() {
            return Err(format!("Too many indices ({})", indices.len()));
        }

        let buffers = self.allocate()?;
        let gl = &self.gl;

        gl.bind_vertex_array(Some(buffers.vertex_array));

        gl.bind_buffer(BufferTarget::ElementArray, Some(buffers.index_buffer));
        gl.buffer_data(BufferTarget::ElementArray, bytemuck::cast_slice(indices));

        gl.bind_buffer(BufferTarget::Array, Some(buffers.vertex_buffer));
        gl.buffer_data(BufferTarget::Array, bytemuck::cast_slice(vertices));

        gl.float_attribute(POSITION_SLOT, POSITION_COMPONENTS as i32);

        gl.bind_buffer(BufferTarget::Array, None);
        gl.bind_vertex_array(None);
        gl.bind_buffer(BufferTarget::ElementArray, None);

        log::debug!(
            "Created mesh with {vertex_count} vertices and {} indices",
            indices.len()
        );

        self.buffers = Some(buffers);
        self.index_count = indices.len();
        Ok(())
    }

    /// Allocates all three objects, or none of them.
    fn allocate(&self) -> Result<MeshBuffers<D>, String> {
        let gl = &self.gl;
        let vertex_array = gl.create_vertex_array()?;
        let index_buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                gl.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };
        let vertex_buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                gl.delete_buffer(index_buffer);
                gl.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };

        Ok(MeshBuffers {
            vertex_array,
            vertex_buffer,
            index_buffer,
        })
    }

    /// Draws the mesh as an indexed triangle list. Does nothing for an empty mesh.
    pub fn render(&self) {
        let Some(buffers) = &self.buffers else {
            return;
        };
        if self.index_count == 0 {
            return;
        }

        self.gl.bind_vertex_array(Some(buffers.vertex_array));
        self.gl
            .bind_buffer(BufferTarget::ElementArray, Some(buffers.index_buffer));
        self.gl.draw_indexed_triangles(self.index_count as i32);
        self.gl.bind_vertex_array(None);
        self.gl.bind_buffer(BufferTarget::ElementArray, None);
    }

    /// Releases the GPU objects. Safe to call any number of times.
    pub fn clear(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            self.gl.delete_buffer(buffers.index_buffer);
            self.gl.delete_buffer(buffers.vertex_buffer);
            self.gl.delete_vertex_array(buffers.vertex_array);
        }
        self.index_count = 0;
    }

    /// Returns whether the mesh currently owns GPU objects.
    pub fn is_created(&self) -> bool {
        self.buffers.is_some()
    }

    /// Returns the GPU objects, if any.
    pub fn buffers(&self) -> Option<&MeshBuffers<D>> {
        self.buffers.as_ref()
    }

    // Returns the amount of indices drawn per render
    pub fn index_count(&self) -> usize {
        self.index_count
    }
}

impl<D: GraphicsDevice> Drop for Mesh<D> {
    fn drop(&mut self) {
        self.clear();
    }
}
