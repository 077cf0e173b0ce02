//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating deferred GPU
//! resources. It holds everything producer threads share with the context
//! thread: the capability table, the staging pool and the disposal queue.

use std::sync::Arc;

use crate::capabilities::{DeviceCapabilities, GlVersion};
use crate::deferred::{DeferredLifecycle, DeferredResource, DisposalQueue};
use crate::error::GraphicsError;
use crate::resources::{Buffer, Shader};
use crate::staging::StagingMemoryPool;
use crate::types::{BufferDescriptor, BufferUsage, ShaderDescriptor, ShaderStage};

/// Configuration for a [`GraphicsDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Debug label of the device.
    pub label: String,
    /// Version of the native context the device will be serviced by.
    pub version: GlVersion,
    /// Capabilities of the native context the device will be serviced by.
    pub capabilities: DeviceCapabilities,
    /// Reject questionable descriptors at creation time.
    pub validate_usage: bool,
    /// Upper bound on freed staging memory kept for reuse.
    pub max_retained_staging_bytes: usize,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            label: "Device".to_string(),
            version: GlVersion::default(),
            capabilities: DeviceCapabilities::default(),
            validate_usage: cfg!(debug_assertions),
            max_retained_staging_bytes: StagingMemoryPool::DEFAULT_MAX_RETAINED_BYTES,
        }
    }
}

impl DeviceDescriptor {
    /// Create a descriptor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the context version. Validation messages name what this API needs.
    pub fn with_version(mut self, version: GlVersion) -> Self {
        self.version = version;
        self
    }

    /// Detect capabilities from the context version and extensions, and
    /// record the version.
    pub fn with_detected<'a>(
        self,
        version: GlVersion,
        extensions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.with_version(version)
            .with_capabilities(DeviceCapabilities::detect(version, extensions))
    }

    /// Set the context capabilities.
    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Enable or disable descriptor validation.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_usage = enabled;
        self
    }

    /// Set how much freed staging memory is kept for reuse.
    pub fn with_staging_retention(mut self, bytes: usize) -> Self {
        self.max_retained_staging_bytes = bytes;
        self
    }
}

/// A graphics device for creating deferred GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync`. Resources can be created, named and
/// disposed from any thread; their native objects are handled by the
/// [`GlExecutor`](crate::GlExecutor) that services the device.
///
/// # Example
///
/// ```
/// use deferred_gl::{BufferDescriptor, BufferUsage, DeviceDescriptor, GraphicsDevice};
///
/// let device = GraphicsDevice::new(DeviceDescriptor::new().with_label("main"));
/// let buffer = device
///     .create_buffer(&BufferDescriptor::new(1024, BufferUsage::VERTEX).with_label("vertices"))
///     .unwrap();
/// assert!(!buffer.is_created());
/// buffer.dispose();
/// assert_eq!(device.pending_disposals(), 1);
/// ```
pub struct GraphicsDevice {
    label: String,
    version: GlVersion,
    capabilities: DeviceCapabilities,
    validate_usage: bool,
    staging: StagingMemoryPool,
    disposals: DisposalQueue,
}

impl GraphicsDevice {
    /// Create a new graphics device.
    pub fn new(descriptor: DeviceDescriptor) -> Arc<Self> {
        log::info!(
            "GraphicsDevice: created [{}] for {} with {:?} (validation: {})",
            descriptor.label,
            descriptor.version,
            descriptor.capabilities,
            descriptor.validate_usage
        );
        Arc::new(Self {
            label: descriptor.label,
            version: descriptor.version,
            capabilities: descriptor.capabilities,
            validate_usage: descriptor.validate_usage,
            staging: StagingMemoryPool::with_max_retained_bytes(
                descriptor.max_retained_staging_bytes,
            ),
            disposals: DisposalQueue::new(),
        })
    }

    /// Get the device label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the version of the servicing context.
    pub fn version(&self) -> GlVersion {
        self.version
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Whether descriptors are validated at creation time.
    pub fn validates_usage(&self) -> bool {
        self.validate_usage
    }

    /// Get the staging pool backing shader sources.
    pub fn staging_pool(&self) -> &StagingMemoryPool {
        &self.staging
    }

    /// Get the number of disposed resources awaiting destruction.
    pub fn pending_disposals(&self) -> usize {
        self.disposals.pending_count()
    }

    pub(crate) fn disposal_queue(&self) -> &DisposalQueue {
        &self.disposals
    }

    pub(crate) fn enqueue_disposal(&self, resource: DeferredResource) {
        log::trace!(
            "GraphicsDevice: queued {} [{}] for destruction",
            resource.kind_name(),
            resource.name()
        );
        self.disposals.enqueue(resource);
    }

    /// Create a GPU buffer.
    ///
    /// No native call is made here; the buffer is allocated the first time
    /// it is prepared on the context thread.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ValidationFailed`] if the size is zero, or,
    /// with validation enabled, if the usage flags are contradictory.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if descriptor.size == 0 {
            return Err(GraphicsError::ValidationFailed(
                "buffer size cannot be zero".to_string(),
            ));
        }

        if self.validate_usage {
            let usage = descriptor.usage;
            if usage.contains(BufferUsage::STAGING) && usage != BufferUsage::STAGING {
                return Err(GraphicsError::ValidationFailed(format!(
                    "STAGING buffers cannot have other usages, got {:?}",
                    usage
                )));
            }
            if usage.contains(BufferUsage::DYNAMIC | BufferUsage::STORAGE_READ_WRITE) {
                return Err(GraphicsError::ValidationFailed(
                    "DYNAMIC is not allowed for STORAGE_READ_WRITE buffers".to_string(),
                ));
            }
        }

        let buffer = Arc::new(Buffer::new(Arc::downgrade(self), descriptor));

        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );

        Ok(buffer)
    }

    /// Create a shader.
    ///
    /// The source is copied into a staging block here; it is compiled the
    /// first time the shader is prepared on the context thread.
    ///
    /// # Errors
    ///
    /// With validation enabled, returns [`GraphicsError::ValidationFailed`]
    /// for compute shaders on a device without compute support, or for an
    /// empty entry point.
    pub fn create_shader(
        self: &Arc<Self>,
        descriptor: &ShaderDescriptor,
    ) -> Result<Arc<Shader>, GraphicsError> {
        if self.validate_usage {
            if descriptor.stage == ShaderStage::Compute && !self.capabilities.compute_shaders {
                return Err(GraphicsError::ValidationFailed(format!(
                    "compute shaders require {}, device context is {}",
                    self.version.compute_requirement(),
                    self.version
                )));
            }
            if descriptor.entry_point.is_empty() {
                return Err(GraphicsError::ValidationFailed(
                    "shader entry point cannot be empty".to_string(),
                ));
            }
        }

        let block = self.staging.acquire_with(&descriptor.source);
        let shader = Arc::new(Shader::new(Arc::downgrade(self), descriptor, block));

        log::trace!(
            "GraphicsDevice: created {} shader {:?}, {} bytes of source",
            descriptor.stage,
            descriptor.label,
            descriptor.source.len()
        );

        Ok(shader)
    }
}

impl Drop for GraphicsDevice {
    fn drop(&mut self) {
        let pending = self.disposals.pending_count();
        if pending > 0 {
            log::warn!(
                "GraphicsDevice [{}]: dropped with {} resources awaiting destruction",
                self.label,
                pending
            );
        }
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("label", &self.label)
            .field("version", &self.version)
            .field("capabilities", &self.capabilities)
            .field("validate_usage", &self.validate_usage)
            .field("disposals", &self.disposals)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
