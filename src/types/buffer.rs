//! Buffer types and descriptors.

use bitflags::bitflags;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be used as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// Buffer can be read as a storage buffer.
        const STORAGE_READ = 1 << 3;
        /// Buffer can be read and written as a storage buffer.
        const STORAGE_READ_WRITE = 1 << 4;
        /// Buffer can be used as an indirect buffer.
        const INDIRECT = 1 << 5;
        /// Buffer contents are updated frequently from the CPU.
        const DYNAMIC = 1 << 6;
        /// Buffer is only used to move data between the CPU and the GPU.
        const STAGING = 1 << 7;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

impl BufferUsage {
    /// Storage hint implied by these usage flags.
    pub fn storage_hint(self) -> StorageHint {
        if self.contains(Self::DYNAMIC) {
            StorageHint::Dynamic
        } else {
            StorageHint::Static
        }
    }
}

/// Storage hint passed to the native allocation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageHint {
    /// Contents are written once and drawn many times (`GL_STATIC_DRAW`).
    #[default]
    Static,
    /// Contents are rewritten often (`GL_DYNAMIC_DRAW`).
    Dynamic,
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u32,
    /// Usage flags.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u32, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
