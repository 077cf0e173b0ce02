//! Deferred GPU resources.
//!
//! This module contains the resource types created by [`GraphicsDevice`]:
//! - [`Buffer`] - fixed-size GPU memory allocation
//! - [`Shader`] - a shader stage compiled from source text
//!
//! Resources are reference-counted with [`Arc`] and can be named and disposed
//! from any thread. Their native objects are created and destroyed by a
//! [`GlExecutor`] on the context thread.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice
//! [`GlExecutor`]: crate::GlExecutor
//! [`Arc`]: std::sync::Arc

mod buffer;
mod shader;

pub use buffer::Buffer;
pub use shader::Shader;
