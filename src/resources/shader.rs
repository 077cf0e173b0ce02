//! Shader resource.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{
    checked, checked_object, GlContext, NativeHandle, ObjectKind, ShaderParameter,
};
use crate::deferred::{DeferredLifecycle, DeferredResource, Lifecycle};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::executor::ContextScope;
use crate::staging::StagingBlock;
use crate::types::{ShaderDescriptor, ShaderStage};

/// Log text reported when the driver provides no info log at all.
const NULL_INFO_LOG: &str = "<null>";

/// A shader stage compiled from source text.
///
/// The source bytes are copied into a [`StagingBlock`] when the shader is
/// created. The block travels with the shader until the context thread
/// either compiles it successfully or destroys the shader, and is then
/// returned to the device's staging pool. A shader dropped without
/// [`dispose`](Shader::dispose) hands its block back as well.
pub struct Shader {
    device: Weak<GraphicsDevice>,
    lifecycle: Lifecycle,
    stage: ShaderStage,
    entry_point: String,
    source: Mutex<Option<StagingBlock>>,
}

impl Shader {
    /// Create a new shader (called by GraphicsDevice).
    pub(crate) fn new(
        device: Weak<GraphicsDevice>,
        descriptor: &ShaderDescriptor,
        source: StagingBlock,
    ) -> Self {
        Self {
            device,
            lifecycle: Lifecycle::new(ObjectKind::Shader, descriptor.label.clone()),
            stage: descriptor.stage,
            entry_point: descriptor.entry_point.clone(),
            source: Mutex::new(Some(source)),
        }
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the shader stage.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Get the entry point name.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Get the display name.
    pub fn name(&self) -> String {
        self.lifecycle.name()
    }

    /// Set the display name, applied as a debug label on next use.
    pub fn set_name(&self, name: impl Into<String>) {
        self.lifecycle.set_name(name.into());
    }

    /// Get the native shader name, if the native object exists.
    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.lifecycle.native_handle()
    }

    /// Whether the shader was disposed.
    pub fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    /// Whether the native object currently exists.
    pub fn is_created(&self) -> bool {
        self.lifecycle.is_created()
    }

    /// Whether the source bytes are still held by this shader.
    pub fn holds_source(&self) -> bool {
        self.source.lock().is_some()
    }

    /// Release the shader. See [`Buffer::dispose`](crate::Buffer::dispose).
    pub fn dispose(self: &Arc<Self>) {
        if !self.lifecycle.request_dispose() {
            return;
        }
        match self.device.upgrade() {
            Some(device) => device.enqueue_disposal(DeferredResource::Shader(Arc::clone(self))),
            None => log::warn!(
                "Shader [{}]: disposed after its device was dropped",
                self.name()
            ),
        }
    }

    fn create_native(&self, scope: &ContextScope<'_>) -> Result<NativeHandle, GraphicsError> {
        let gl = scope.gl();
        let mut source = self.source.lock();
        let block = source
            .as_ref()
            .ok_or_else(|| GraphicsError::ResourceDestroyed { name: self.name() })?;

        let shader = checked_object(gl, "glCreateShader", |gl| {
            gl.create_shader(self.stage.gl_shader_type())
        })?;

        if let Err(e) = self.compile(gl, shader, block.as_slice()) {
            if let Err(delete) = checked(gl, "glDeleteShader", |gl| gl.delete_shader(shader)) {
                log::warn!("Shader [{}]: failed to discard {:?}: {}", self.name(), shader, delete);
            }
            return Err(e);
        }

        if let Some(block) = source.take() {
            scope.staging().free(block);
        }
        Ok(shader)
    }

    fn compile(
        &self,
        gl: &dyn GlContext,
        shader: NativeHandle,
        source: &[u8],
    ) -> Result<(), GraphicsError> {
        checked(gl, "glShaderSource", |gl| gl.shader_source(shader, source))?;
        checked(gl, "glCompileShader", |gl| gl.compile_shader(shader))?;

        let status = checked(gl, "glGetShaderiv", |gl| {
            gl.get_shader_iv(shader, ShaderParameter::CompileStatus)
        })?;
        if status == 1 {
            return Ok(());
        }

        let log = Self::info_log(gl, shader)?;
        log::error!(
            "Shader [{}]: {} stage failed to compile: {}",
            self.name(),
            self.stage,
            log
        );
        Err(GraphicsError::CompilationFailed {
            name: self.name(),
            stage: self.stage,
            log,
        })
    }

    fn info_log(gl: &dyn GlContext, shader: NativeHandle) -> Result<String, GraphicsError> {
        let length = checked(gl, "glGetShaderiv", |gl| {
            gl.get_shader_iv(shader, ShaderParameter::InfoLogLength)
        })?;
        let mut buffer = vec![0u8; usize::try_from(length).unwrap_or(0)];
        let written = checked(gl, "glGetShaderInfoLog", |gl| {
            gl.get_shader_info_log(shader, &mut buffer)
        })?;
        Ok(match written {
            Some(count) => String::from_utf8_lossy(&buffer[..count.min(buffer.len())]).into_owned(),
            None => NULL_INFO_LOG.to_string(),
        })
    }
}

impl DeferredLifecycle for Shader {
    fn ensure_resources_created(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError> {
        self.lifecycle
            .ensure_created(scope, || self.create_native(scope))
            .map(|_| ())
    }

    fn destroy_gl_resources(&self, scope: &ContextScope<'_>) -> Result<(), GraphicsError> {
        let gl = scope.gl();
        self.lifecycle.destroy(
            |shader| checked(gl, "glDeleteShader", |gl| gl.delete_shader(shader)),
            || {
                if let Some(block) = self.source.lock().take() {
                    scope.staging().free(block);
                }
            },
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

impl Drop for Shader {
    fn drop(&mut self) {
        if let Some(handle) = self.lifecycle.native_handle() {
            log::warn!(
                "Shader [{}]: dropped without dispose(), leaking {:?}",
                self.lifecycle.name(),
                handle
            );
        }
        if let Some(block) = self.source.get_mut().take() {
            log::warn!(
                "Shader [{}]: dropped without dispose(), reclaiming {} bytes of source",
                self.lifecycle.name(),
                block.size_in_bytes()
            );
            if let Some(device) = self.device.upgrade() {
                device.staging_pool().free(block);
            }
        }
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.lifecycle.name())
            .field("stage", &self.stage)
            .field("entry_point", &self.entry_point)
            .field("native", &self.lifecycle.native_handle())
            .field("disposed", &self.lifecycle.is_disposed())
            .finish()
    }
}

static_assertions::assert_impl_all!(Shader: Send, Sync);
