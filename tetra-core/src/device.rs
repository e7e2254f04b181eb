//! GPU device capability.
//!
//! This module defines the [`GraphicsDevice`] trait, the narrow set of OpenGL operations that
//! [`Mesh`](crate::mesh::Mesh) and [`ShaderProgram`](crate::shader::ShaderProgram) need. The
//! trait is implemented for [`glow::Context`] so the real renderer goes straight to the driver,
//! while tests substitute a recording fake.

use std::fmt;

use glam::Mat4;
use glow::HasContext;

/// Which binding point a buffer is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

impl BufferTarget {
    fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn gl_enum(self) -> u32 {
        match self {
            StageKind::Vertex => glow::VERTEX_SHADER,
            StageKind::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// The GPU operations used by meshes, shader programs and the render loop.
///
/// Every method takes `&self`; implementations are expected to be shared behind an `Arc`
/// and used from the thread that owns the GL context.
pub trait GraphicsDevice {
    type VertexArray: Copy + fmt::Debug;
    type Buffer: Copy + fmt::Debug;
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn delete_buffer(&self, buffer: Self::Buffer);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// Uploads `data` to the buffer bound at `target` with static-draw usage.
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    /// Describes attribute `slot` as `components` tightly packed floats and enables it.
    fn float_attribute(&self, slot: u32, components: i32);

    fn create_shader(&self, stage: StageKind) -> Result<Self::Shader, String>;
    /// Uploads and compiles the source, returning the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Links the program, returning the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    /// Validates the program against the current state, returning the validate status.
    fn validate_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4);

    /// Clears the colour and depth buffers of the current framebuffer.
    fn clear_frame(&self, color: [f32; 4]);
    /// Draws `count` `u32` indices from the bound element buffer as a triangle list.
    fn draw_indexed_triangles(&self, count: i32);
}

impl GraphicsDevice for glow::Context {
    type VertexArray = glow::VertexArray;
    type Buffer = glow::Buffer;
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target.gl_enum(), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        unsafe { self.buffer_data_u8_slice(target.gl_enum(), data, glow::STATIC_DRAW) }
    }

    fn float_attribute(&self, slot: u32, components: i32) {
        unsafe {
            self.vertex_attrib_pointer_f32(slot, components, glow::FLOAT, false, 0, 0);
            self.enable_vertex_attrib_array(slot);
        }
    }

    fn create_shader(&self, stage: StageKind) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage.gl_enum()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);
            self.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            HasContext::link_program(self, program);
            self.get_program_link_status(program)
        }
    }

    fn validate_program(&self, program: Self::Program) -> bool {
        unsafe {
            HasContext::validate_program(self, program);
            self.get_program_validate_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4) {
        unsafe { self.uniform_matrix_4_f32_slice(Some(location), false, value.as_ref()) }
    }

    fn clear_frame(&self, color: [f32; 4]) {
        unsafe {
            self.clear_color(color[0], color[1], color[2], color[3]);
            self.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_indexed_triangles(&self, count: i32) {
        unsafe { self.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0) }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    //! An in-memory [`GraphicsDevice`] that records every call.

    use std::collections::{HashMap, HashSet};
    use std::sync::{Mutex, MutexGuard};

    use glam::Mat4;

    use super::{BufferTarget, GraphicsDevice, StageKind};

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct FakeLocation {
        pub program: u32,
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        BufferData { target: BufferTarget, len: usize },
        FloatAttribute { slot: u32, components: i32 },
        UseProgram(Option<u32>),
        UniformMat4 { location: FakeLocation, value: Mat4 },
        Clear([f32; 4]),
        Draw { vertex_array: Option<u32>, element_buffer: Option<u32>, count: i32 },
    }

    struct Program {
        attached: Vec<u32>,
        linked_sources: Vec<String>,
    }

    #[derive(Default)]
    struct State {
        next_id: u32,
        vertex_arrays: HashSet<u32>,
        buffers: HashSet<u32>,
        shaders: HashMap<u32, (StageKind, String)>,
        programs: HashMap<u32, Program>,
        bound_vertex_array: Option<u32>,
        bound_element_buffer: Option<u32>,
        calls: Vec<Call>,
        fail_program_creation: bool,
        fail_link: bool,
        fail_validate: bool,
        buffer_budget: Option<usize>,
    }

    impl State {
        fn next(&mut self) -> u32 {
            self.next_id += 1;
            self.next_id
        }
    }

    /// Records calls and emulates just enough driver behaviour for the resource tests.
    ///
    /// A shader compiles when its source contains `main` and its braces and parentheses
    /// balance. A uniform resolves when one of the linked sources declares `uniform mat4 <name>`.
    #[derive(Default)]
    pub struct RecordingDevice {
        state: Mutex<State>,
    }

    impl RecordingDevice {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_program_creation(self) -> Self {
            self.state().fail_program_creation = true;
            self
        }

        pub fn failing_link(self) -> Self {
            self.state().fail_link = true;
            self
        }

        pub fn failing_validate(self) -> Self {
            self.state().fail_validate = true;
            self
        }

        /// Only `budget` more buffers can be created.
        pub fn with_buffer_budget(self, budget: usize) -> Self {
            self.state().buffer_budget = Some(budget);
            self
        }

        fn state(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap()
        }

        pub fn calls(&self) -> Vec<Call> {
            self.state().calls.clone()
        }

        pub fn draws(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|call| matches!(call, Call::Draw { .. }))
                .collect()
        }

        pub fn live_vertex_arrays(&self) -> usize {
            self.state().vertex_arrays.len()
        }

        pub fn live_buffers(&self) -> usize {
            self.state().buffers.len()
        }

        pub fn live_shaders(&self) -> usize {
            self.state().shaders.len()
        }

        pub fn live_programs(&self) -> usize {
            self.state().programs.len()
        }
    }

    fn looks_compilable(source: &str) -> bool {
        let mut braces = 0i32;
        let mut parens = 0i32;
        for c in source.chars() {
            match c {
                '{' => braces += 1,
                '}' => braces -= 1,
                '(' => parens += 1,
                ')' => parens -= 1,
                _ => {}
            }
            if braces < 0 || parens < 0 {
                return false;
            }
        }
        source.contains("main") && braces == 0 && parens == 0
    }

    impl GraphicsDevice for RecordingDevice {
        type VertexArray = u32;
        type Buffer = u32;
        type Shader = u32;
        type Program = u32;
        type UniformLocation = FakeLocation;

        fn create_vertex_array(&self) -> Result<u32, String> {
            let mut state = self.state();
            let id = state.next();
            state.vertex_arrays.insert(id);
            Ok(id)
        }

        fn delete_vertex_array(&self, vertex_array: u32) {
            let mut state = self.state();
            assert!(state.vertex_arrays.remove(&vertex_array), "double delete of vertex array");
        }

        fn bind_vertex_array(&self, vertex_array: Option<u32>) {
            self.state().bound_vertex_array = vertex_array;
        }

        fn create_buffer(&self) -> Result<u32, String> {
            let mut state = self.state();
            if let Some(budget) = state.buffer_budget.as_mut() {
                if *budget == 0 {
                    return Err("out of memory".to_string());
                }
                *budget -= 1;
            }
            let id = state.next();
            state.buffers.insert(id);
            Ok(id)
        }

        fn delete_buffer(&self, buffer: u32) {
            let mut state = self.state();
            assert!(state.buffers.remove(&buffer), "double delete of buffer");
        }

        fn bind_buffer(&self, target: BufferTarget, buffer: Option<u32>) {
            if target == BufferTarget::ElementArray {
                self.state().bound_element_buffer = buffer;
            }
        }

        fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
            self.state().calls.push(Call::BufferData {
                target,
                len: data.len(),
            });
        }

        fn float_attribute(&self, slot: u32, components: i32) {
            self.state()
                .calls
                .push(Call::FloatAttribute { slot, components });
        }

        fn create_shader(&self, stage: StageKind) -> Result<u32, String> {
            let mut state = self.state();
            let id = state.next();
            state.shaders.insert(id, (stage, String::new()));
            Ok(id)
        }

        fn compile_shader(&self, shader: u32, source: &str) -> bool {
            let mut state = self.state();
            if let Some(entry) = state.shaders.get_mut(&shader) {
                entry.1 = source.to_string();
            }
            looks_compilable(source)
        }

        fn shader_info_log(&self, shader: u32) -> String {
            let state = self.state();
            match state.shaders.get(&shader) {
                Some((_, source)) if !looks_compilable(source) => {
                    "0:1(1): error: syntax error, unexpected end of file".to_string()
                }
                _ => String::new(),
            }
        }

        fn delete_shader(&self, shader: u32) {
            let mut state = self.state();
            assert!(state.shaders.remove(&shader).is_some(), "double delete of shader");
        }

        fn create_program(&self) -> Result<u32, String> {
            let mut state = self.state();
            if state.fail_program_creation {
                return Err("context lost".to_string());
            }
            let id = state.next();
            state.programs.insert(
                id,
                Program {
                    attached: Vec::new(),
                    linked_sources: Vec::new(),
                },
            );
            Ok(id)
        }

        fn attach_shader(&self, program: u32, shader: u32) {
            if let Some(program) = self.state().programs.get_mut(&program) {
                program.attached.push(shader);
            }
        }

        fn detach_shader(&self, program: u32, shader: u32) {
            if let Some(program) = self.state().programs.get_mut(&program) {
                program.attached.retain(|&s| s != shader);
            }
        }

        fn link_program(&self, program: u32) -> bool {
            let mut state = self.state();
            if state.fail_link {
                return false;
            }
            let sources: Vec<String> = match state.programs.get(&program) {
                Some(p) => p
                    .attached
                    .iter()
                    .filter_map(|s| state.shaders.get(s).map(|(_, src)| src.clone()))
                    .collect(),
                None => return false,
            };
            let linked = sources.len() == 2;
            if let Some(p) = state.programs.get_mut(&program) {
                p.linked_sources = sources;
            }
            linked
        }

        fn validate_program(&self, program: u32) -> bool {
            let state = self.state();
            !state.fail_validate && state.programs.contains_key(&program)
        }

        fn program_info_log(&self, _program: u32) -> String {
            let state = self.state();
            if state.fail_link {
                "error: linking with uncompiled/unspecialized shader".to_string()
            } else if state.fail_validate {
                "error: validation failed: sampler mismatch".to_string()
            } else {
                String::new()
            }
        }

        fn delete_program(&self, program: u32) {
            let mut state = self.state();
            assert!(state.programs.remove(&program).is_some(), "double delete of program");
        }

        fn use_program(&self, program: Option<u32>) {
            self.state().calls.push(Call::UseProgram(program));
        }

        fn uniform_location(&self, program: u32, name: &str) -> Option<FakeLocation> {
            let state = self.state();
            let declaration = format!("uniform mat4 {name}");
            state
                .programs
                .get(&program)?
                .linked_sources
                .iter()
                .any(|src| src.contains(&declaration))
                .then(|| FakeLocation {
                    program,
                    name: name.to_string(),
                })
        }

        fn uniform_mat4(&self, location: &FakeLocation, value: &Mat4) {
            self.state().calls.push(Call::UniformMat4 {
                location: location.clone(),
                value: *value,
            });
        }

        fn clear_frame(&self, color: [f32; 4]) {
            self.state().calls.push(Call::Clear(color));
        }

        fn draw_indexed_triangles(&self, count: i32) {
            let mut state = self.state();
            let call = Call::Draw {
                vertex_array: state.bound_vertex_array,
                element_buffer: state.bound_element_buffer,
                count,
            };
            state.calls.push(call);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;
    use std::num::NonZeroU32;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    use super::*;

    static VALIDATE_CALLS: AtomicUsize = AtomicUsize::new(0);
    static VALIDATE_STATUS: AtomicI32 = AtomicI32::new(0);

    extern "system" fn get_string(_name: u32) -> *const u8 {
        b"3.3.0\0".as_ptr()
    }

    extern "system" fn get_integer(_pname: u32, data: *mut i32) {
        unsafe { *data = 0 };
    }

    extern "system" fn get_program(_program: u32, pname: u32, params: *mut i32) {
        let value = match pname {
            glow::LINK_STATUS => 1,
            glow::VALIDATE_STATUS => VALIDATE_STATUS.load(Ordering::SeqCst),
            _ => 0,
        };
        unsafe { *params = value };
    }

    extern "system" fn validate(_program: u32) {
        VALIDATE_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    /// A context whose entry points are the stubs above; everything else is unloaded.
    fn stub_context() -> glow::Context {
        unsafe {
            glow::Context::from_loader_function(|name| match name {
                "glGetString" => get_string as *const c_void,
                "glGetIntegerv" => get_integer as *const c_void,
                "glGetProgramiv" => get_program as *const c_void,
                "glValidateProgram" => validate as *const c_void,
                _ => std::ptr::null(),
            })
        }
    }

    #[test]
    fn glow_validate_reports_the_validate_status_not_the_link_status() {
        let gl = stub_context();
        let program = glow::NativeProgram(NonZeroU32::new(1).unwrap());

        VALIDATE_STATUS.store(0, Ordering::SeqCst);
        let before = VALIDATE_CALLS.load(Ordering::SeqCst);
        assert!(!GraphicsDevice::validate_program(&gl, program));
        assert_eq!(VALIDATE_CALLS.load(Ordering::SeqCst), before + 1);

        VALIDATE_STATUS.store(1, Ordering::SeqCst);
        assert!(GraphicsDevice::validate_program(&gl, program));
        assert_eq!(VALIDATE_CALLS.load(Ordering::SeqCst), before + 2);
    }
}
