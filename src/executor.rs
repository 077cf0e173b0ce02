//! Context-thread executor.
//!
//! A [`GlExecutor`] owns the native context together with a handle to the
//! [`GraphicsDevice`] whose resources it services. It is neither `Send` nor
//! `Sync`, so everything that reaches a native call stays on the thread that
//! constructed it.
//!
//! # Example
//!
//! ```
//! use deferred_gl::{
//!     BufferDescriptor, BufferUsage, DeviceDescriptor, DummyContext, GlExecutor,
//!     GraphicsDevice,
//! };
//!
//! let device = GraphicsDevice::new(DeviceDescriptor::new().with_label("main"));
//! let mut executor = GlExecutor::new(device.clone(), DummyContext::new());
//!
//! let buffer = device
//!     .create_buffer(&BufferDescriptor::new(256, BufferUsage::VERTEX))
//!     .unwrap();
//! executor.ensure_created(buffer.as_ref()).unwrap();
//! assert!(buffer.is_created());
//!
//! buffer.dispose();
//! let report = executor.drain_disposals();
//! assert_eq!(report.destroyed, 1);
//! assert!(report.is_clean());
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::backend::GlContext;
use crate::capabilities::DeviceCapabilities;
use crate::deferred::DeferredLifecycle;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::staging::StagingMemoryPool;

/// Borrowed view of the context-thread state handed to
/// [`DeferredLifecycle`] methods.
///
/// Only the crate can construct one, so the lifecycle methods are
/// unreachable without a [`GlExecutor`].
pub struct ContextScope<'a> {
    gl: &'a dyn GlContext,
    capabilities: &'a DeviceCapabilities,
    staging: &'a StagingMemoryPool,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ContextScope<'a> {
    pub(crate) fn new(
        gl: &'a dyn GlContext,
        capabilities: &'a DeviceCapabilities,
        staging: &'a StagingMemoryPool,
    ) -> Self {
        Self {
            gl,
            capabilities,
            staging,
            _not_send: PhantomData,
        }
    }

    /// The native context.
    pub fn gl(&self) -> &'a dyn GlContext {
        self.gl
    }

    /// Capabilities of the native context, fixed at device creation.
    pub fn capabilities(&self) -> &'a DeviceCapabilities {
        self.capabilities
    }

    /// The staging pool that owns source blocks.
    pub fn staging(&self) -> &'a StagingMemoryPool {
        self.staging
    }
}

/// Outcome of one [`GlExecutor::drain_disposals`] pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Number of resources taken from the queue and destroyed.
    pub destroyed: usize,
    /// Errors reported while destroying, in queue order.
    pub failures: Vec<GraphicsError>,
}

impl DrainReport {
    /// Returns `true` if every resource was destroyed without error.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owner of the native context, pinned to the thread it was created on.
pub struct GlExecutor<C: GlContext> {
    device: Arc<GraphicsDevice>,
    gl: C,
    _not_send: PhantomData<*const ()>,
}

impl<C: GlContext> GlExecutor<C> {
    /// Bind a native context to a device.
    pub fn new(device: Arc<GraphicsDevice>, gl: C) -> Self {
        log::info!(
            "GlExecutor: servicing device [{}] with {} context",
            device.label(),
            gl.name()
        );
        Self {
            device,
            gl,
            _not_send: PhantomData,
        }
    }

    /// Get the device this executor services.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the native context.
    pub fn context(&self) -> &C {
        &self.gl
    }

    fn scope(&self) -> ContextScope<'_> {
        ContextScope::new(
            &self.gl,
            self.device.capabilities(),
            self.device.staging_pool(),
        )
    }

    /// Prepare a resource for use: create its native object on first call and
    /// apply a pending label change.
    pub fn ensure_created<R: DeferredLifecycle + ?Sized>(
        &self,
        resource: &R,
    ) -> Result<(), GraphicsError> {
        resource.ensure_resources_created(&self.scope())
    }

    /// Destroy every resource currently queued for disposal.
    ///
    /// Resources enqueued while the drain runs are left for the next call.
    /// An error destroying one resource does not stop the others.
    pub fn drain_disposals(&mut self) -> DrainReport {
        let pending = self.device.disposal_queue().take_pending();
        let mut report = DrainReport::default();
        if pending.is_empty() {
            return report;
        }

        let scope = self.scope();
        for resource in pending {
            if let Err(e) = resource.destroy_gl_resources(&scope) {
                log::error!(
                    "GlExecutor: failed to destroy {} [{}]: {}",
                    resource.kind_name(),
                    resource.name(),
                    e
                );
                report.failures.push(e);
            }
            report.destroyed += 1;
        }

        log::debug!(
            "GlExecutor: destroyed {} resources ({} failed)",
            report.destroyed,
            report.failures.len()
        );
        report
    }
}

impl<C: GlContext> Drop for GlExecutor<C> {
    fn drop(&mut self) {
        let report = self.drain_disposals();
        if report.destroyed > 0 {
            log::debug!(
                "GlExecutor: drained {} resources on shutdown",
                report.destroyed
            );
        }
    }
}

impl<C: GlContext> std::fmt::Debug for GlExecutor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlExecutor")
            .field("context", &self.gl.name())
            .field("device", &self.device.label())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(ContextScope<'static>: Send, Sync);
