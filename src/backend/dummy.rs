//! Dummy GL context for testing and development.
//!
//! This context doesn't talk to a driver but emulates the parts of GL state
//! that deferred resources touch: object names, buffer allocations, bindings,
//! shader compilation and labels. Every call is recorded so tests can assert
//! on exactly which native entry points ran. Errors and compile failures can be
//! injected to exercise the failure paths.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;

use parking_lot::Mutex;

use crate::types::StorageHint;

use super::{BufferTarget, GlContext, NativeHandle, ObjectKind, ShaderParameter};

const GL_INVALID_VALUE: u32 = 0x0501;
const GL_INVALID_OPERATION: u32 = 0x0502;

/// A native call recorded by [`DummyContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    /// `glCreateBuffers`.
    CreateBuffer(NativeHandle),
    /// `glGenBuffers`.
    GenBuffer(NativeHandle),
    /// `glBindBuffer`.
    BindBuffer {
        target: BufferTarget,
        buffer: Option<NativeHandle>,
    },
    /// `glBufferData`.
    BufferData {
        target: BufferTarget,
        size: u32,
        hint: StorageHint,
    },
    /// `glNamedBufferData`.
    NamedBufferData {
        buffer: NativeHandle,
        size: u32,
        hint: StorageHint,
    },
    /// `glDeleteBuffers`.
    DeleteBuffer(NativeHandle),
    /// `glCreateShader`.
    CreateShader {
        shader: NativeHandle,
        shader_type: u32,
    },
    /// `glShaderSource`.
    ShaderSource { shader: NativeHandle, length: usize },
    /// `glCompileShader`.
    CompileShader(NativeHandle),
    /// `glGetShaderiv`.
    GetShaderIv {
        shader: NativeHandle,
        parameter: ShaderParameter,
    },
    /// `glGetShaderInfoLog`.
    GetShaderInfoLog(NativeHandle),
    /// `glDeleteShader`.
    DeleteShader(NativeHandle),
    /// `glObjectLabel`.
    ObjectLabel {
        kind: ObjectKind,
        object: NativeHandle,
        label: String,
    },
}

impl NativeCall {
    /// GL entry point name of this call.
    pub fn gl_name(&self) -> &'static str {
        match self {
            Self::CreateBuffer(_) => "glCreateBuffers",
            Self::GenBuffer(_) => "glGenBuffers",
            Self::BindBuffer { .. } => "glBindBuffer",
            Self::BufferData { .. } => "glBufferData",
            Self::NamedBufferData { .. } => "glNamedBufferData",
            Self::DeleteBuffer(_) => "glDeleteBuffers",
            Self::CreateShader { .. } => "glCreateShader",
            Self::ShaderSource { .. } => "glShaderSource",
            Self::CompileShader(_) => "glCompileShader",
            Self::GetShaderIv { .. } => "glGetShaderiv",
            Self::GetShaderInfoLog(_) => "glGetShaderInfoLog",
            Self::DeleteShader(_) => "glDeleteShader",
            Self::ObjectLabel { .. } => "glObjectLabel",
        }
    }
}

/// Storage allocated for a dummy buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferAllocation {
    /// Size in bytes.
    pub size: u32,
    /// Storage hint the buffer was sized with.
    pub hint: StorageHint,
}

#[derive(Debug)]
struct DummyShader {
    shader_type: u32,
    source: Vec<u8>,
    compiled: bool,
    info_log: Option<String>,
}

#[derive(Debug)]
enum CompileFailure {
    WithLog(String),
    NullLog,
}

#[derive(Debug, Default)]
struct DummyState {
    next_object: u32,
    calls: Vec<NativeCall>,
    pending_errors: VecDeque<u32>,
    injected_errors: Vec<(&'static str, u32)>,
    compile_failures: VecDeque<CompileFailure>,
    buffers: HashMap<NativeHandle, Option<BufferAllocation>>,
    bindings: HashMap<BufferTarget, NativeHandle>,
    shaders: HashMap<NativeHandle, DummyShader>,
    labels: HashMap<(ObjectKind, NativeHandle), String>,
}

impl DummyState {
    fn allocate_name(&mut self) -> NativeHandle {
        self.next_object += 1;
        NativeHandle(NonZeroU32::MIN.saturating_add(self.next_object - 1))
    }

    fn record(&mut self, call: NativeCall) {
        let name = call.gl_name();
        self.calls.push(call);
        if let Some(index) = self.injected_errors.iter().position(|(n, _)| *n == name) {
            let (_, code) = self.injected_errors.remove(index);
            self.pending_errors.push_back(code);
        }
    }

    fn raise(&mut self, code: u32) {
        self.pending_errors.push_back(code);
    }
}

/// Recording GL context.
#[derive(Debug, Default)]
pub struct DummyContext {
    state: Mutex<DummyState>,
}

impl DummyContext {
    /// Create a new dummy context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `code` right after the next call to the GL entry point `call`.
    pub fn fail_next(&self, call: &'static str, code: u32) {
        self.state.lock().injected_errors.push((call, code));
    }

    /// Make the next compilation fail with the given info log.
    pub fn fail_next_compile(&self, log: impl Into<String>) {
        self.state
            .lock()
            .compile_failures
            .push_back(CompileFailure::WithLog(log.into()));
    }

    /// Make the next compilation fail without providing any info log.
    pub fn fail_next_compile_without_log(&self) {
        self.state
            .lock()
            .compile_failures
            .push_back(CompileFailure::NullLog);
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls to the GL entry point `call`.
    pub fn call_count(&self, call: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.gl_name() == call)
            .count()
    }

    /// Forget recorded calls, keeping object state.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Storage of a live buffer, if it has been sized.
    pub fn buffer_allocation(&self, buffer: NativeHandle) -> Option<BufferAllocation> {
        self.state.lock().buffers.get(&buffer).copied().flatten()
    }

    /// Number of buffer objects that have not been deleted.
    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Number of shader objects that have not been deleted.
    pub fn live_shaders(&self) -> usize {
        self.state.lock().shaders.len()
    }

    /// Source last supplied to a live shader.
    pub fn shader_source_of(&self, shader: NativeHandle) -> Option<Vec<u8>> {
        self.state
            .lock()
            .shaders
            .get(&shader)
            .map(|s| s.source.clone())
    }

    /// Native shader type of a live shader.
    pub fn shader_type_of(&self, shader: NativeHandle) -> Option<u32> {
        self.state.lock().shaders.get(&shader).map(|s| s.shader_type)
    }

    /// Current debug label of a live object.
    pub fn label_of(&self, kind: ObjectKind, object: NativeHandle) -> Option<String> {
        self.state.lock().labels.get(&(kind, object)).cloned()
    }
}

impl GlContext for DummyContext {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn get_error(&self) -> u32 {
        self.state
            .lock()
            .pending_errors
            .pop_front()
            .unwrap_or(super::GL_NO_ERROR)
    }

    fn create_buffer(&self) -> Option<NativeHandle> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let buffer = state.allocate_name();
        state.buffers.insert(buffer, None);
        state.record(NativeCall::CreateBuffer(buffer));
        Some(buffer)
    }

    fn gen_buffer(&self) -> Option<NativeHandle> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let buffer = state.allocate_name();
        state.buffers.insert(buffer, None);
        state.record(NativeCall::GenBuffer(buffer));
        Some(buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<NativeHandle>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match buffer {
            Some(b) if !state.buffers.contains_key(&b) => state.raise(GL_INVALID_VALUE),
            Some(b) => {
                state.bindings.insert(target, b);
            }
            None => {
                state.bindings.remove(&target);
            }
        }
        state.record(NativeCall::BindBuffer { target, buffer });
    }

    fn buffer_data(&self, target: BufferTarget, size: u32, hint: StorageHint) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.bindings.get(&target).copied() {
            Some(buffer) => {
                state
                    .buffers
                    .insert(buffer, Some(BufferAllocation { size, hint }));
            }
            None => state.raise(GL_INVALID_OPERATION),
        }
        state.record(NativeCall::BufferData { target, size, hint });
    }

    fn named_buffer_data(&self, buffer: NativeHandle, size: u32, hint: StorageHint) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.buffers.get_mut(&buffer) {
            Some(allocation) => *allocation = Some(BufferAllocation { size, hint }),
            None => state.raise(GL_INVALID_OPERATION),
        }
        state.record(NativeCall::NamedBufferData { buffer, size, hint });
    }

    fn delete_buffer(&self, buffer: NativeHandle) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        // Deleting an unknown name is silently ignored, as in GL.
        state.buffers.remove(&buffer);
        state.bindings.retain(|_, bound| *bound != buffer);
        state.labels.remove(&(ObjectKind::Buffer, buffer));
        state.record(NativeCall::DeleteBuffer(buffer));
    }

    fn create_shader(&self, shader_type: u32) -> Option<NativeHandle> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let shader = state.allocate_name();
        state.shaders.insert(
            shader,
            DummyShader {
                shader_type,
                source: Vec::new(),
                compiled: false,
                info_log: None,
            },
        );
        state.record(NativeCall::CreateShader {
            shader,
            shader_type,
        });
        Some(shader)
    }

    fn shader_source(&self, shader: NativeHandle, source: &[u8]) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.shaders.get_mut(&shader) {
            Some(s) => s.source = source.to_vec(),
            None => state.raise(GL_INVALID_VALUE),
        }
        state.record(NativeCall::ShaderSource {
            shader,
            length: source.len(),
        });
    }

    fn compile_shader(&self, shader: NativeHandle) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let injected = state.compile_failures.pop_front();
        match state.shaders.get_mut(&shader) {
            Some(s) => {
                let outcome = match injected {
                    Some(CompileFailure::WithLog(log)) => Err(Some(log)),
                    Some(CompileFailure::NullLog) => Err(None),
                    None if std::str::from_utf8(&s.source).is_err() => {
                        Err(Some("0:1(1): error: source is not valid UTF-8".to_string()))
                    }
                    None => Ok(()),
                };
                match outcome {
                    Ok(()) => {
                        s.compiled = true;
                        s.info_log = Some(String::new());
                    }
                    Err(log) => {
                        s.compiled = false;
                        s.info_log = log;
                    }
                }
            }
            None => state.raise(GL_INVALID_VALUE),
        }
        state.record(NativeCall::CompileShader(shader));
    }

    fn get_shader_iv(&self, shader: NativeHandle, parameter: ShaderParameter) -> i32 {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let value = match state.shaders.get(&shader) {
            Some(s) => match parameter {
                ShaderParameter::CompileStatus => i32::from(s.compiled),
                // GL counts the terminating NUL; an empty log reports zero.
                ShaderParameter::InfoLogLength => match &s.info_log {
                    Some(log) if !log.is_empty() => log.len() as i32 + 1,
                    _ => 0,
                },
            },
            None => {
                state.raise(GL_INVALID_VALUE);
                0
            }
        };
        state.record(NativeCall::GetShaderIv { shader, parameter });
        value
    }

    fn get_shader_info_log(&self, shader: NativeHandle, buffer: &mut [u8]) -> Option<usize> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let written = match state.shaders.get(&shader) {
            Some(s) => s.info_log.as_ref().map(|log| {
                // At most len - 1 characters, leaving room for the NUL.
                let count = log.len().min(buffer.len().saturating_sub(1));
                buffer[..count].copy_from_slice(&log.as_bytes()[..count]);
                if let Some(terminator) = buffer.get_mut(count) {
                    *terminator = 0;
                }
                count
            }),
            None => {
                state.raise(GL_INVALID_VALUE);
                None
            }
        };
        state.record(NativeCall::GetShaderInfoLog(shader));
        written
    }

    fn delete_shader(&self, shader: NativeHandle) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.shaders.remove(&shader);
        state.labels.remove(&(ObjectKind::Shader, shader));
        state.record(NativeCall::DeleteShader(shader));
    }

    fn object_label(&self, kind: ObjectKind, object: NativeHandle, label: &str) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let exists = match kind {
            ObjectKind::Buffer => state.buffers.contains_key(&object),
            ObjectKind::Shader => state.shaders.contains_key(&object),
        };
        if exists {
            state.labels.insert((kind, object), label.to_string());
        } else {
            state.raise(GL_INVALID_VALUE);
        }
        state.record(NativeCall::ObjectLabel {
            kind,
            object,
            label: label.to_string(),
        });
    }
}
