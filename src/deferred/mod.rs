//! Deferred resource lifecycle.
//!
//! Application code creates resources on any thread, but their native
//! objects may only be created and destroyed on the thread that owns the GL
//! context. This module decouples the two:
//!
//! - [`DeferredLifecycle`] is the contract every GL-object-backed resource
//!   implements: lazy creation right before first use, and a single physical
//!   destruction.
//! - [`DeferredResource`] is the closed set of resource kinds the device can
//!   hold in its [`DisposalQueue`].
//!
//! # Architecture
//!
//! ```text
//!   producer threads                      context thread (GlExecutor)
//!  ┌──────────────────────┐            ┌───────────────────────────────┐
//!  │ device.create_*()    │            │ ensure_created(&resource)     │
//!  │   -> Uninitialized   │            │   create once, sync label     │
//!  │ resource.set_name()  │            │                               │
//!  │ resource.dispose() ──┼──enqueue──▶│ drain_disposals()             │
//!  └──────────────────────┘            │   destroy once per resource   │
//!                                      └───────────────────────────────┘
//! ```

mod lifecycle;
mod queue;

use std::sync::Arc;

use crate::error::GraphicsError;
use crate::executor::ContextScope;
use crate::resources::{Buffer, Shader};

pub(crate) use lifecycle::Lifecycle;
pub use queue::DisposalQueue;

/// Context-thread side of a resource whose native object is created lazily.
///
/// The methods taking a [`ContextScope`] can only be reached through a
/// [`GlExecutor`](crate::GlExecutor), which owns the native context.
pub trait DeferredLifecycle {
    /// Create the native object if it does not exist yet, then apply a
    /// pending name change as a debug label.
    ///
    /// Safe to call repeatedly; creation runs at most once.
    fn ensure_resources_created(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError>;

    /// Release the native object, or whatever the resource holds in its place
    /// if it was never created.
    ///
    /// Only the first call has an effect. The resource is inert afterwards,
    /// even when an error is returned.
    fn destroy_gl_resources(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError>;

    /// Whether the native object currently exists.
    fn is_created(&self) -> bool;

    /// Whether the resource was logically disposed.
    fn is_disposed(&self) -> bool;

    /// Display name of the resource.
    fn name(&self) -> String;
}

/// A resource held by the device, for any of the supported kinds.
#[derive(Debug, Clone)]
pub enum DeferredResource {
    /// A GPU buffer.
    Buffer(Arc<Buffer>),
    /// A compiled shader stage.
    Shader(Arc<Shader>),
}

impl DeferredResource {
    fn as_lifecycle(&self) -> &dyn DeferredLifecycle {
        match self {
            Self::Buffer(buffer) => buffer.as_ref(),
            Self::Shader(shader) => shader.as_ref(),
        }
    }

    /// Short name of the resource kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "Buffer",
            Self::Shader(_) => "Shader",
        }
    }
}

impl DeferredLifecycle for DeferredResource {
    fn ensure_resources_created(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError> {
        self.as_lifecycle().ensure_resources_created(scope)
    }

    fn destroy_gl_resources(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError> {
        self.as_lifecycle().destroy_gl_resources(scope)
    }

    fn is_created(&self) -> bool {
        self.as_lifecycle().is_created()
    }

    fn is_disposed(&self) -> bool {
        self.as_lifecycle().is_disposed()
    }

    fn name(&self) -> String {
        self.as_lifecycle().name()
    }
}

impl From<Arc<Buffer>> for DeferredResource {
    fn from(buffer: Arc<Buffer>) -> Self {
        Self::Buffer(buffer)
    }
}

impl From<Arc<Shader>> for DeferredResource {
    fn from(shader: Arc<Shader>) -> Self {
        Self::Shader(shader)
    }
}

static_assertions::assert_impl_all!(DeferredResource: Send, Sync);
