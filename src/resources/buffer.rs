//! GPU buffer resource.

use std::sync::{Arc, Weak};

use crate::backend::{
    checked, checked_object, BufferTarget, GlContext, NativeHandle, ObjectKind,
};
use crate::deferred::{DeferredLifecycle, DeferredResource, Lifecycle};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::executor::ContextScope;
use crate::types::{BufferDescriptor, BufferUsage, StorageHint};

/// A GPU buffer resource.
///
/// Buffers are created by [`GraphicsDevice::create_buffer`] and are
/// reference-counted. They hold a weak reference back to their parent device,
/// which receives them when they are disposed.
///
/// The native object is allocated on first use, zero-initialized, with the
/// storage hint derived from [`BufferUsage::DYNAMIC`] at construction.
///
/// # Example
///
/// ```ignore
/// let buffer = device.create_buffer(&BufferDescriptor::new(256, BufferUsage::UNIFORM))?;
/// buffer.set_name("camera_uniforms");
/// executor.ensure_created(buffer.as_ref())?;
/// buffer.dispose();
/// ```
pub struct Buffer {
    device: Weak<GraphicsDevice>,
    lifecycle: Lifecycle,
    size: u32,
    usage: BufferUsage,
    hint: StorageHint,
}

impl Buffer {
    /// Create a new buffer (called by GraphicsDevice).
    pub(crate) fn new(device: Weak<GraphicsDevice>, descriptor: &BufferDescriptor) -> Self {
        Self {
            device,
            lifecycle: Lifecycle::new(ObjectKind::Buffer, descriptor.label.clone()),
            size: descriptor.size,
            usage: descriptor.usage,
            hint: descriptor.usage.storage_hint(),
        }
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the buffer size in bytes.
    pub fn size_in_bytes(&self) -> u32 {
        self.size
    }

    /// Get the usage flags.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Get the storage hint used when the native object is sized.
    pub fn storage_hint(&self) -> StorageHint {
        self.hint
    }

    /// Get the display name.
    pub fn name(&self) -> String {
        self.lifecycle.name()
    }

    /// Set the display name. It is applied as a debug label the next time
    /// the buffer is prepared for use on the context thread.
    pub fn set_name(&self, name: impl Into<String>) {
        self.lifecycle.set_name(name.into());
    }

    /// Get the native buffer name, if the native object exists.
    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.lifecycle.native_handle()
    }

    /// Whether the buffer was disposed. A disposed buffer must not be used,
    /// even if its native object has not been released yet.
    pub fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    /// Whether the native object currently exists.
    pub fn is_created(&self) -> bool {
        self.lifecycle.is_created()
    }

    /// Release the buffer.
    ///
    /// Callable from any thread; only the first call has an effect. The
    /// native object is released later, when the context thread drains the
    /// device's disposal queue.
    pub fn dispose(self: &Arc<Self>) {
        if !self.lifecycle.request_dispose() {
            return;
        }
        match self.device.upgrade() {
            Some(device) => device.enqueue_disposal(DeferredResource::Buffer(Arc::clone(self))),
            None => log::warn!(
                "Buffer [{}]: disposed after its device was dropped",
                self.name()
            ),
        }
    }

    fn create_native(&self, scope: &ContextScope<'_>) -> Result<NativeHandle, GraphicsError> {
        let gl = scope.gl();
        if scope.capabilities().direct_state_access {
            let buffer = checked_object(gl, "glCreateBuffers", |gl| gl.create_buffer())?;
            let sized = checked(gl, "glNamedBufferData", |gl| {
                gl.named_buffer_data(buffer, self.size, self.hint)
            });
            self.discard_on_error(gl, buffer, sized)?;
            Ok(buffer)
        } else {
            let buffer = checked_object(gl, "glGenBuffers", |gl| gl.gen_buffer())?;
            let sized = checked(gl, "glBindBuffer", |gl| {
                gl.bind_buffer(BufferTarget::CopyRead, Some(buffer))
            })
            .and_then(|()| {
                checked(gl, "glBufferData", |gl| {
                    gl.buffer_data(BufferTarget::CopyRead, self.size, self.hint)
                })
            });
            self.discard_on_error(gl, buffer, sized)?;
            Ok(buffer)
        }
    }

    /// Delete a half-initialized object so a failed creation leaves nothing behind.
    fn discard_on_error(
        &self,
        gl: &dyn GlContext,
        buffer: NativeHandle,
        result: Result<(), GraphicsError>,
    ) -> Result<(), GraphicsError> {
        if result.is_err() {
            if let Err(e) = checked(gl, "glDeleteBuffers", |gl| gl.delete_buffer(buffer)) {
                log::warn!("Buffer [{}]: failed to discard {:?}: {}", self.name(), buffer, e);
            }
        }
        result
    }
}

impl DeferredLifecycle for Buffer {
    fn ensure_resources_created(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError> {
        self.lifecycle
            .ensure_created(scope, || self.create_native(scope))
            .map(|_| ())
    }

    fn destroy_gl_resources(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError> {
        let gl = scope.gl();
        self.lifecycle.destroy(
            |buffer| checked(gl, "glDeleteBuffers", |gl| gl.delete_buffer(buffer)),
            || {},
        )
    }

    fn is_created(&self) -> bool {
        self.lifecycle.is_created()
    }

    fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    fn name(&self) -> String {
        self.lifecycle.name()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(handle) = self.lifecycle.native_handle() {
            log::warn!(
                "Buffer [{}]: dropped without dispose(), leaking {:?}",
                self.lifecycle.name(),
                handle
            );
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.lifecycle.name())
            .field("size", &self.size)
            .field("usage", &self.usage)
            .field("native", &self.lifecycle.native_handle())
            .field("disposed", &self.lifecycle.is_disposed())
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::{DummyContext, NativeCall};
    use crate::capabilities::DeviceCapabilities;
    use crate::staging::StagingMemoryPool;

    fn detached(size: u32, usage: BufferUsage) -> Buffer {
        Buffer::new(Weak::new(), &BufferDescriptor::new(size, usage))
    }

    #[test]
    fn test_buffer_debug() {
        let buffer = detached(1024, BufferUsage::VERTEX);
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("Buffer"));
        assert!(debug.contains("1024"));
    }

    #[test]
    fn test_dynamic_hint_fixed_at_construction() {
        let buffer = detached(64, BufferUsage::UNIFORM | BufferUsage::DYNAMIC);
        assert_eq!(buffer.storage_hint(), StorageHint::Dynamic);
        assert_eq!(detached(64, BufferUsage::UNIFORM).storage_hint(), StorageHint::Static);
    }

    #[test]
    fn test_direct_path_calls() {
        let gl = DummyContext::new();
        let caps = DeviceCapabilities::default();
        let pool = StagingMemoryPool::new();
        let scope = ContextScope::new(&gl, &caps, &pool);

        let buffer = detached(256, BufferUsage::VERTEX);
        buffer.ensure_resources_created(&scope).unwrap();
        let handle = buffer.native_handle().unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                NativeCall::CreateBuffer(handle),
                NativeCall::NamedBufferData {
                    buffer: handle,
                    size: 256,
                    hint: StorageHint::Static
                },
            ]
        );
        buffer.destroy_gl_resources(&scope).unwrap();
    }

    #[test]
    fn test_indirect_path_calls() {
        let gl = DummyContext::new();
        let caps = DeviceCapabilities::minimal();
        let pool = StagingMemoryPool::new();
        let scope = ContextScope::new(&gl, &caps, &pool);

        let buffer = detached(128, BufferUsage::DYNAMIC);
        buffer.ensure_resources_created(&scope).unwrap();
        let handle = buffer.native_handle().unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                NativeCall::GenBuffer(handle),
                NativeCall::BindBuffer {
                    target: BufferTarget::CopyRead,
                    buffer: Some(handle)
                },
                NativeCall::BufferData {
                    target: BufferTarget::CopyRead,
                    size: 128,
                    hint: StorageHint::Dynamic
                },
            ]
        );
        buffer.destroy_gl_resources(&scope).unwrap();
    }

    #[test]
    fn test_failed_sizing_discards_object() {
        let gl = DummyContext::new();
        let caps = DeviceCapabilities::default();
        let pool = StagingMemoryPool::new();
        let scope = ContextScope::new(&gl, &caps, &pool);
        gl.fail_next("glNamedBufferData", 0x0505);

        let buffer = detached(1 << 20, BufferUsage::STORAGE_READ);
        let result = buffer.ensure_resources_created(&scope);
        assert_eq!(
            result,
            Err(GraphicsError::NativeCallFailed {
                call: "glNamedBufferData",
                code: 0x0505
            })
        );
        assert!(!buffer.is_created());
        assert_eq!(gl.live_buffers(), 0);

        // Destroying a never-created buffer issues no delete.
        gl.clear_calls();
        buffer.destroy_gl_resources(&scope).unwrap();
        assert!(gl.calls().is_empty());
    }
}
