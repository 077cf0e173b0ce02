//! Common types and descriptors for deferred resources.
//!
//! This module contains usage flags, stage enums, and descriptor structs
//! used when requesting buffers and shaders from a
//! [`GraphicsDevice`](crate::GraphicsDevice).

mod buffer;
mod shader;

pub use buffer::{BufferDescriptor, BufferUsage, StorageHint};
pub use shader::{ShaderDescriptor, ShaderStage};
