//! Native GL call surface.
//!
//! This module treats the native graphics API as an opaque set of calls.
//! Resources never talk to a driver directly: they go through a
//! [`GlContext`], and every call they make is paired with an error check
//! through [`checked`] or [`checked_object`].
//!
//! # Available Contexts
//!
//! - `dummy` (default): recording context for tests and headless development
//! - `glow-backend`: real OpenGL through [`glow`](https://docs.rs/glow)
//!
//! # Threading
//!
//! A [`GlContext`] is only ever reached through a
//! [`GlExecutor`](crate::GlExecutor), which is pinned to the thread that owns
//! the native context.

#[cfg(feature = "dummy")]
pub mod dummy;

#[cfg(all(feature = "glow-backend", not(target_arch = "wasm32")))]
pub mod glow_backend;

use std::fmt;
use std::num::NonZeroU32;

use crate::error::GraphicsError;
use crate::types::StorageHint;

#[cfg(feature = "dummy")]
pub use dummy::{DummyContext, NativeCall};

#[cfg(all(feature = "glow-backend", not(target_arch = "wasm32")))]
pub use glow_backend::GlowContext;

/// `GL_NO_ERROR`.
pub const GL_NO_ERROR: u32 = 0;

/// Name of a native GL object.
///
/// GL reserves `0` as "no object", so a handle is always non-zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(NonZeroU32);

impl NativeHandle {
    /// Wrap a raw object name, returning `None` for `0`.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw object name.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Raw object name as a [`NonZeroU32`].
    pub fn as_non_zero(self) -> NonZeroU32 {
        self.0
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({})", self.0)
    }
}

/// Kind of GL object, used as the identifier for debug labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A buffer object.
    Buffer,
    /// A shader object.
    Shader,
}

impl ObjectKind {
    /// `GL_BUFFER` / `GL_SHADER` identifier passed to `glObjectLabel`.
    pub fn gl_identifier(self) -> u32 {
        match self {
            Self::Buffer => 0x82E0,
            Self::Shader => 0x82E1,
        }
    }
}

/// Buffer binding targets used when sizing buffers without direct state access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// `GL_COPY_READ_BUFFER`. Binding here leaves draw state untouched.
    CopyRead,
}

impl BufferTarget {
    /// Native enum value.
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::CopyRead => 0x8F36,
        }
    }
}

impl StorageHint {
    /// Native usage enum (`GL_STATIC_DRAW` / `GL_DYNAMIC_DRAW`).
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Static => 0x88E4,
            Self::Dynamic => 0x88E8,
        }
    }
}

/// Integer shader parameters queried after compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderParameter {
    /// `GL_COMPILE_STATUS`.
    CompileStatus,
    /// `GL_INFO_LOG_LENGTH`.
    InfoLogLength,
}

impl ShaderParameter {
    /// Native enum value.
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::CompileStatus => 0x8B81,
            Self::InfoLogLength => 0x8B84,
        }
    }
}

/// The native GL entry points used by deferred resources.
///
/// Calls mirror their GL counterparts and report failure the way GL does:
/// through [`get_error`](GlContext::get_error) after the fact. Creation calls
/// return `None` when the driver hands back object `0`.
pub trait GlContext {
    /// Get the context name.
    fn name(&self) -> &'static str;

    /// `glGetError`: pop the oldest pending error flag.
    fn get_error(&self) -> u32;

    /// `glCreateBuffers` (direct state access).
    fn create_buffer(&self) -> Option<NativeHandle>;

    /// `glGenBuffers`.
    fn gen_buffer(&self) -> Option<NativeHandle>;

    /// `glBindBuffer`.
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<NativeHandle>);

    /// `glBufferData` with no initial data.
    fn buffer_data(&self, target: BufferTarget, size: u32, hint: StorageHint);

    /// `glNamedBufferData` with no initial data.
    fn named_buffer_data(&self, buffer: NativeHandle, size: u32, hint: StorageHint);

    /// `glDeleteBuffers`.
    fn delete_buffer(&self, buffer: NativeHandle);

    /// `glCreateShader`.
    fn create_shader(&self, shader_type: u32) -> Option<NativeHandle>;

    /// `glShaderSource` with a single fragment of exactly `source.len()` bytes.
    fn shader_source(&self, shader: NativeHandle, source: &[u8]);

    /// `glCompileShader`.
    fn compile_shader(&self, shader: NativeHandle);

    /// `glGetShaderiv`.
    fn get_shader_iv(&self, shader: NativeHandle, parameter: ShaderParameter) -> i32;

    /// `glGetShaderInfoLog` into `buffer`.
    ///
    /// Returns the number of bytes written, or `None` when the driver
    /// provides no log at all.
    fn get_shader_info_log(&self, shader: NativeHandle, buffer: &mut [u8]) -> Option<usize>;

    /// `glDeleteShader`.
    fn delete_shader(&self, shader: NativeHandle);

    /// `glObjectLabel`.
    fn object_label(&self, kind: ObjectKind, object: NativeHandle, label: &str);
}

/// Convert a pending native error signal into [`GraphicsError::NativeCallFailed`].
pub fn check_last_error(gl: &dyn GlContext, call: &'static str) -> Result<(), GraphicsError> {
    match gl.get_error() {
        GL_NO_ERROR => Ok(()),
        code => Err(GraphicsError::NativeCallFailed { call, code }),
    }
}

/// Run one native call and check for an error signal immediately after it.
pub fn checked<T>(
    gl: &dyn GlContext,
    call: &'static str,
    f: impl FnOnce(&dyn GlContext) -> T,
) -> Result<T, GraphicsError> {
    let value = f(gl);
    check_last_error(gl, call)?;
    Ok(value)
}

/// Like [`checked`], for calls that allocate an object.
pub fn checked_object(
    gl: &dyn GlContext,
    call: &'static str,
    f: impl FnOnce(&dyn GlContext) -> Option<NativeHandle>,
) -> Result<NativeHandle, GraphicsError> {
    checked(gl, call, f)?.ok_or(GraphicsError::NativeCallFailed { call, code: 0 })
}
