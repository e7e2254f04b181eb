//! OpenGL Shaders
//!
//! This module defines the [`ShaderProgram`] struct, a linked vertex + fragment program with
//! cached `model` and `projection` uniform locations, and the [`ShaderError`] type describing
//! why a program could not be built.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use glam::Mat4;

use crate::device::{GraphicsDevice, StageKind};

/// Name of the per-object transform uniform.
pub const MODEL_UNIFORM: &str = "model";
/// Name of the camera-to-clip transform uniform.
pub const PROJECTION_UNIFORM: &str = "projection";

/// Why a shader program could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The driver refused to create a program or stage object.
    Create(String),
    /// A stage failed to compile; carries the compiler log.
    Compile { stage: StageKind, log: String },
    /// The program failed to link; carries the linker log.
    Link(String),
    /// The program failed validation; carries the validation log.
    Validate(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Create(msg) => write!(f, "Failed to create shader object: {msg}"),
            ShaderError::Compile { stage, log } => {
                write!(f, "Error compiling the {stage} shader: {log}")
            }
            ShaderError::Link(log) => write!(f, "Error linking program: {log}"),
            ShaderError::Validate(log) => write!(f, "Error validating program: {log}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// A compiled shader stage. The stage object is deleted when this is dropped.
struct Stage<'a, D: GraphicsDevice> {
    gl: &'a D,
    id: D::Shader,
}

impl<'a, D: GraphicsDevice> Stage<'a, D> {
    /// Compiles a new stage from the given source code.
    fn compile(gl: &'a D, kind: StageKind, source: &str) -> Result<Self, ShaderError> {
        let id = gl.create_shader(kind).map_err(ShaderError::Create)?;
        let stage = Self { gl, id };

        if !gl.compile_shader(id, source) {
            let log = gl.shader_info_log(id);
            return Err(ShaderError::Compile { stage: kind, log });
        }

        Ok(stage)
    }
}

impl<D: GraphicsDevice> Drop for Stage<'_, D> {
    fn drop(&mut self) {
        self.gl.delete_shader(self.id);
    }
}

/// Represents an OpenGL shader program composed of a vertex and a fragment stage.
///
/// A program is only usable after a successful [`create_from_source`] or
/// [`create_from_files`]; every other state is inert, so [`use_program`] and
/// [`upload_matrices`] quietly do nothing.
///
/// [`create_from_source`]: ShaderProgram::create_from_source
/// [`create_from_files`]: ShaderProgram::create_from_files
/// [`use_program`]: ShaderProgram::use_program
/// [`upload_matrices`]: ShaderProgram::upload_matrices
pub struct ShaderProgram<D: GraphicsDevice> {
    gl: Arc<D>,
    id: Option<D::Program>,
    model_location: Option<D::UniformLocation>,
    projection_location: Option<D::UniformLocation>,
}

impl<D: GraphicsDevice> ShaderProgram<D> {
    /// Creates an empty, unusable program.
    pub fn new(gl: &Arc<D>) -> Self {
        Self {
            gl: Arc::clone(gl),
            id: None,
            model_location: None,
            projection_location: None,
        }
    }

    /// Builds a program from in-memory sources.
    pub fn from_source(gl: &Arc<D>, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        let mut program = Self::new(gl);
        program.create_from_source(vertex, fragment)?;
        Ok(program)
    }

    /// Builds a program from two source files.
    pub fn from_files(
        gl: &Arc<D>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let mut program = Self::new(gl);
        program.create_from_files(vertex_path, fragment_path)?;
        Ok(program)
    }

    /// Compiles, links and validates the given sources, replacing any previous program.
    pub fn create_from_source(&mut self, vertex: &str, fragment: &str) -> Result<(), ShaderError> {
        self.compile(vertex, fragment)
    }

    /// Same as [`create_from_source`](Self::create_from_source), reading each stage from disk.
    ///
    /// A file that cannot be read is treated as an empty source, which then fails to compile.
    pub fn create_from_files(
        &mut self,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<(), ShaderError> {
        let vertex = read_source(vertex_path.as_ref());
        let fragment = read_source(fragment_path.as_ref());
        self.compile(&vertex, &fragment)
    }

    fn compile(&mut self, vertex: &str, fragment: &str) -> Result<(), ShaderError> {
        self.clear();

        let program = match self.gl.create_program() {
            Ok(program) => program,
            Err(e) => {
                let e = ShaderError::Create(e);
                log::error!("{e}");
                return Err(e);
            }
        };

        if let Err(e) = self.assemble(program, vertex, fragment) {
            log::error!("{e}");
            self.gl.delete_program(program);
            return Err(e);
        }

        self.model_location = self.gl.uniform_location(program, MODEL_UNIFORM);
        self.projection_location = self.gl.uniform_location(program, PROJECTION_UNIFORM);
        if self.model_location.is_none() {
            log::warn!("Shader program has no active `{MODEL_UNIFORM}` uniform");
        }
        if self.projection_location.is_none() {
            log::warn!("Shader program has no active `{PROJECTION_UNIFORM}` uniform");
        }

        self.id = Some(program);
        log::debug!("Shader program {program:?} ready");
        Ok(())
    }

    /// Compiles and attaches both stages, then links and validates.
    fn assemble(&self, program: D::Program, vertex: &str, fragment: &str) -> Result<(), ShaderError> {
        let gl = &*self.gl;

        let vert = Stage::compile(gl, StageKind::Vertex, vertex)?;
        gl.attach_shader(program, vert.id);
        let frag = match Stage::compile(gl, StageKind::Fragment, fragment) {
            Ok(frag) => frag,
            Err(e) => {
                gl.detach_shader(program, vert.id);
                return Err(e);
            }
        };
        gl.attach_shader(program, frag.id);

        let linked = gl.link_program(program);

        gl.detach_shader(program, vert.id);
        gl.detach_shader(program, frag.id);

        if !linked {
            return Err(ShaderError::Link(gl.program_info_log(program)));
        }
        if !gl.validate_program(program) {
            return Err(ShaderError::Validate(gl.program_info_log(program)));
        }

        Ok(())
    }

    /// Binds the shader program for use. Does nothing if the program is unusable.
    pub fn use_program(&self) {
        match self.id {
            Some(id) => self.gl.use_program(Some(id)),
            None => log::debug!("Skipping use of an unusable shader program"),
        }
    }

    /// Uploads the per-object and camera matrices to the cached locations.
    pub fn upload_matrices(&self, model: &Mat4, projection: &Mat4) {
        if self.id.is_none() {
            return;
        }
        if let Some(location) = &self.model_location {
            self.gl.uniform_mat4(location, model);
        }
        if let Some(location) = &self.projection_location {
            self.gl.uniform_mat4(location, projection);
        }
    }

    /// Returns the location of the `model` uniform, or `None` if it was not found.
    pub fn model_location(&self) -> Option<&D::UniformLocation> {
        self.model_location.as_ref()
    }

    /// Returns the location of the `projection` uniform, or `None` if it was not found.
    pub fn projection_location(&self) -> Option<&D::UniformLocation> {
        self.projection_location.as_ref()
    }

    /// Returns the program handle if the program is usable.
    pub fn handle(&self) -> Option<D::Program> {
        self.id
    }

    /// Returns whether the program built successfully and can be drawn with.
    pub fn is_usable(&self) -> bool {
        self.id.is_some()
    }

    /// Deletes the program and forgets the cached uniform locations. Safe to call repeatedly.
    pub fn clear(&mut self) {
        if let Some(id) = self.id.take() {
            self.gl.delete_program(id);
        }
        self.model_location = None;
        self.projection_location = None;
    }
}

impl<D: GraphicsDevice> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        self.clear();
    }
}

fn read_source(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            log::warn!("Failed to read {}: {e}", path.display());
            String::new()
        }
    }
}
