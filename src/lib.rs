//! # Deferred GL
//!
//! Deferred lifecycle management for GPU resources on a single-threaded GL
//! context.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Creates resources from any thread and collects disposed ones
//! - [`GlExecutor`] - Owns the native context; creates and destroys native objects
//! - [`Buffer`] and [`Shader`] - Resources whose native objects are created on first use
//! - [`StagingMemoryPool`] - Pooled blocks that carry shader source to the context thread
//! - Multiple contexts: Dummy (for testing) and OpenGL through `glow`
//!
//! ## Example
//!
//! ```
//! use deferred_gl::{DeviceDescriptor, DummyContext, GlExecutor, GraphicsDevice, ShaderDescriptor};
//!
//! let device = GraphicsDevice::new(DeviceDescriptor::new());
//! let mut executor = GlExecutor::new(device.clone(), DummyContext::new());
//!
//! // Any thread: describe the resource.
//! let shader = device
//!     .create_shader(&ShaderDescriptor::fragment(b"void main(){}".to_vec(), "main"))
//!     .unwrap();
//! shader.set_name("fullscreen_fs");
//!
//! // Context thread: compile on first use, destroy after dispose.
//! executor.ensure_created(shader.as_ref()).unwrap();
//! shader.dispose();
//! executor.drain_disposals();
//! assert!(!shader.is_created());
//! ```

pub mod backend;
pub mod capabilities;
pub mod deferred;
pub mod device;
pub mod error;
pub mod executor;
pub mod resources;
pub mod staging;
pub mod types;

// Re-export main types for convenience
pub use backend::{GlContext, NativeHandle, ObjectKind};
#[cfg(feature = "dummy")]
pub use backend::{DummyContext, NativeCall};
#[cfg(all(feature = "glow-backend", not(target_arch = "wasm32")))]
pub use backend::GlowContext;
pub use capabilities::{DeviceCapabilities, GlVersion};
pub use deferred::{DeferredLifecycle, DeferredResource, DisposalQueue};
pub use device::{DeviceDescriptor, GraphicsDevice};
pub use error::GraphicsError;
pub use executor::{ContextScope, DrainReport, GlExecutor};
pub use resources::{Buffer, Shader};
pub use staging::{StagingBlock, StagingMemoryPool, StagingPoolStats};
pub use types::{BufferDescriptor, BufferUsage, ShaderDescriptor, ShaderStage, StorageHint};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
///
/// Optional; nothing in the crate depends on it having been called.
pub fn init() {
    log::info!("Deferred GL v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_context() {
        let gl = DummyContext::new();
        assert_eq!(gl.name(), "Dummy");
    }
}
