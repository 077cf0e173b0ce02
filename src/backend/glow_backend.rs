//! OpenGL context through `glow`.
//!
//! Wraps a [`glow::Context`] made current on the calling thread. All native
//! calls are `unsafe` in `glow`; the safety requirement is that the context
//! is current, which [`GlExecutor`](crate::GlExecutor) upholds by never
//! leaving the thread it was created on.

use glow::HasContext;

use crate::types::StorageHint;

use super::{BufferTarget, GlContext, NativeHandle, ObjectKind, ShaderParameter};

/// A real OpenGL context.
pub struct GlowContext {
    gl: glow::Context,
}

impl GlowContext {
    /// Wrap a context that is current on this thread.
    pub fn new(gl: glow::Context) -> Self {
        log::info!("GlowContext: {:?}", gl.version());
        Self { gl }
    }
}

fn buffer(handle: NativeHandle) -> glow::NativeBuffer {
    glow::NativeBuffer(handle.as_non_zero())
}

fn shader(handle: NativeHandle) -> glow::NativeShader {
    glow::NativeShader(handle.as_non_zero())
}

fn object<T>(
    result: Result<T, String>,
    call: &str,
    raw: impl FnOnce(T) -> u32,
) -> Option<NativeHandle> {
    match result {
        Ok(object) => NativeHandle::new(raw(object)),
        Err(e) => {
            log::warn!("GlowContext: {} returned no object: {}", call, e);
            None
        }
    }
}

impl GlContext for GlowContext {
    fn name(&self) -> &'static str {
        "OpenGL (glow)"
    }

    fn get_error(&self) -> u32 {
        // SAFETY: the context is current on this thread.
        unsafe { self.gl.get_error() }
    }

    fn create_buffer(&self) -> Option<NativeHandle> {
        // SAFETY: the context is current on this thread.
        let result = unsafe { self.gl.create_named_buffer() };
        object(result, "glCreateBuffers", |b| b.0.get())
    }

    fn gen_buffer(&self) -> Option<NativeHandle> {
        // SAFETY: the context is current on this thread.
        let result = unsafe { self.gl.create_buffer() };
        object(result, "glGenBuffers", |b| b.0.get())
    }

    fn bind_buffer(&self, target: BufferTarget, handle: Option<NativeHandle>) {
        // SAFETY: the context is current on this thread.
        unsafe { self.gl.bind_buffer(target.gl_enum(), handle.map(buffer)) }
    }

    fn buffer_data(&self, target: BufferTarget, size: u32, hint: StorageHint) {
        // glow takes a signed size; larger requests are clamped and fail in the driver.
        let size = i32::try_from(size).unwrap_or(i32::MAX);
        // SAFETY: the context is current on this thread.
        unsafe { self.gl.buffer_data_size(target.gl_enum(), size, hint.gl_enum()) }
    }

    fn named_buffer_data(&self, handle: NativeHandle, size: u32, hint: StorageHint) {
        let zeroed = vec![0u8; size as usize];
        // SAFETY: the context is current on this thread.
        unsafe {
            self.gl
                .named_buffer_data_u8_slice(buffer(handle), &zeroed, hint.gl_enum())
        }
    }

    fn delete_buffer(&self, handle: NativeHandle) {
        // SAFETY: the context is current on this thread.
        unsafe { self.gl.delete_buffer(buffer(handle)) }
    }

    fn create_shader(&self, shader_type: u32) -> Option<NativeHandle> {
        // SAFETY: the context is current on this thread.
        let result = unsafe { self.gl.create_shader(shader_type) };
        object(result, "glCreateShader", |s| s.0.get())
    }

    fn shader_source(&self, handle: NativeHandle, source: &[u8]) {
        // glow takes the source as text; invalid bytes surface as a compile error.
        let source = String::from_utf8_lossy(source);
        // SAFETY: the context is current on this thread.
        unsafe { self.gl.shader_source(shader(handle), &source) }
    }

    fn compile_shader(&self, handle: NativeHandle) {
        // SAFETY: the context is current on this thread.
        unsafe { self.gl.compile_shader(shader(handle)) }
    }

    fn get_shader_iv(&self, handle: NativeHandle, parameter: ShaderParameter) -> i32 {
        // SAFETY: the context is current on this thread.
        unsafe {
            match parameter {
                ShaderParameter::CompileStatus => {
                    i32::from(self.gl.get_shader_compile_status(shader(handle)))
                }
                ShaderParameter::InfoLogLength => {
                    match self.gl.get_shader_info_log(shader(handle)).len() {
                        0 => 0,
                        len => i32::try_from(len + 1).unwrap_or(i32::MAX),
                    }
                }
            }
        }
    }

    fn get_shader_info_log(&self, handle: NativeHandle, out: &mut [u8]) -> Option<usize> {
        // SAFETY: the context is current on this thread.
        let log = unsafe { self.gl.get_shader_info_log(shader(handle)) };
        let count = log.len().min(out.len().saturating_sub(1));
        out[..count].copy_from_slice(&log.as_bytes()[..count]);
        Some(count)
    }

    fn delete_shader(&self, handle: NativeHandle) {
        // SAFETY: the context is current on this thread.
        unsafe { self.gl.delete_shader(shader(handle)) }
    }

    fn object_label(&self, kind: ObjectKind, handle: NativeHandle, label: &str) {
        // SAFETY: the context is current on this thread.
        unsafe {
            self.gl
                .object_label(kind.gl_identifier(), handle.get(), Some(label))
        }
    }
}

impl std::fmt::Debug for GlowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowContext")
            .field("version", self.gl.version())
            .finish()
    }
}
