//! Common utilities for lifecycle integration tests.
//!
//! Tests run against the recording [`DummyContext`] so every native call can
//! be asserted on, under each combination of context capabilities.

use std::sync::Arc;

use deferred_gl::{
    DeviceCapabilities, DeviceDescriptor, DummyContext, GlExecutor, GraphicsDevice,
};

// ============================================================================
// Context Configurations
// ============================================================================

/// Creation path selected by the context capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Path {
    /// Objects are created and sized without binding.
    Direct,
    /// Objects are generated, bound, then sized.
    Indirect,
}

/// Capability set for a creation path with labeling on or off.
pub fn capabilities(path: Path, labels: bool) -> DeviceCapabilities {
    DeviceCapabilities {
        direct_state_access: path == Path::Direct,
        debug_labeling: labels,
        compute_shaders: true,
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A device plus the executor servicing it.
pub struct TestContext {
    pub device: Arc<GraphicsDevice>,
    pub executor: GlExecutor<DummyContext>,
}

impl TestContext {
    /// Create a validating device for the given capabilities.
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        init_logging();
        let device = GraphicsDevice::new(
            DeviceDescriptor::new()
                .with_label("integration")
                .with_capabilities(capabilities)
                .with_validation(true),
        );
        let executor = GlExecutor::new(device.clone(), DummyContext::new());
        Self { device, executor }
    }

    /// The recording context.
    pub fn gl(&self) -> &DummyContext {
        self.executor.context()
    }
}

/// Route `log` output to the test harness; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
