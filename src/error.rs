//! Graphics error types.

use crate::types::ShaderStage;

/// Errors that can occur while creating or destroying deferred GL resources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// A resource description was rejected before any native call was made.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A native call raised an error signal, or produced no object.
    #[error("{call} failed: {} ({code:#06x})", gl_error_name(*.code))]
    NativeCallFailed {
        /// Name of the native entry point.
        call: &'static str,
        /// Native error code; `0` when the call returned no object.
        code: u32,
    },

    /// The native compiler rejected shader source.
    #[error("unable to compile shader code for shader [{name}] of type {stage}: {log}")]
    CompilationFailed {
        /// Display name of the shader.
        name: String,
        /// Stage the shader was compiled for.
        stage: ShaderStage,
        /// Decoded compiler info log.
        log: String,
    },

    /// The resource was logically disposed and must not be used.
    #[error("resource [{name}] was disposed and can no longer be used")]
    ResourceDisposed {
        /// Display name of the resource.
        name: String,
    },

    /// The resource's native object has already been released.
    #[error("resource [{name}] has already been destroyed")]
    ResourceDestroyed {
        /// Display name of the resource.
        name: String,
    },
}

impl GraphicsError {
    /// Returns `true` for errors raised by the native layer, as opposed to
    /// misuse detected by this crate.
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Self::NativeCallFailed { .. } | Self::CompilationFailed { .. }
        )
    }
}

/// Symbolic name of a GL error code.
pub fn gl_error_name(code: u32) -> &'static str {
    match code {
        0 => "no object returned",
        0x0500 => "GL_INVALID_ENUM",
        0x0501 => "GL_INVALID_VALUE",
        0x0502 => "GL_INVALID_OPERATION",
        0x0503 => "GL_STACK_OVERFLOW",
        0x0504 => "GL_STACK_UNDERFLOW",
        0x0505 => "GL_OUT_OF_MEMORY",
        0x0506 => "GL_INVALID_FRAMEBUFFER_OPERATION",
        0x0507 => "GL_CONTEXT_LOST",
        _ => "unknown GL error",
    }
}
