//! Shader stages and descriptors.

use std::fmt;

/// Shader stage in the graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
    /// Compute shader.
    Compute,
    /// Geometry shader.
    Geometry,
    /// Tessellation control shader.
    TessellationControl,
    /// Tessellation evaluation shader.
    TessellationEvaluation,
}

impl ShaderStage {
    /// Native shader type enum for this stage.
    pub fn gl_shader_type(self) -> u32 {
        match self {
            Self::Vertex => 0x8B31,
            Self::Fragment => 0x8B30,
            Self::Compute => 0x91B9,
            Self::Geometry => 0x8DD9,
            Self::TessellationControl => 0x8E88,
            Self::TessellationEvaluation => 0x8E87,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vertex => "Vertex",
            Self::Fragment => "Fragment",
            Self::Compute => "Compute",
            Self::Geometry => "Geometry",
            Self::TessellationControl => "TessellationControl",
            Self::TessellationEvaluation => "TessellationEvaluation",
        };
        f.write_str(name)
    }
}

/// Descriptor for creating a shader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderDescriptor {
    /// Debug label for the shader.
    pub label: Option<String>,
    /// The shader stage.
    pub stage: ShaderStage,
    /// Shader source text, passed to the native compiler with its exact length.
    pub source: Vec<u8>,
    /// Entry point function name.
    pub entry_point: String,
}

impl ShaderDescriptor {
    /// Create a new shader descriptor.
    pub fn new(
        stage: ShaderStage,
        source: impl Into<Vec<u8>>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            label: None,
            stage,
            source: source.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Create a vertex shader descriptor.
    pub fn vertex(source: impl Into<Vec<u8>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Vertex, source, entry_point)
    }

    /// Create a fragment shader descriptor.
    pub fn fragment(source: impl Into<Vec<u8>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Fragment, source, entry_point)
    }

    /// Create a compute shader descriptor.
    pub fn compute(source: impl Into<Vec<u8>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Compute, source, entry_point)
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_native_types() {
        assert_eq!(ShaderStage::Vertex.gl_shader_type(), 0x8B31);
        assert_eq!(ShaderStage::Fragment.gl_shader_type(), 0x8B30);
        assert_eq!(ShaderStage::Compute.gl_shader_type(), 0x91B9);
    }

    #[test]
    fn test_fragment_descriptor() {
        let desc = ShaderDescriptor::fragment(b"void main(){}".to_vec(), "main").with_label("fs");
        assert_eq!(desc.stage, ShaderStage::Fragment);
        assert_eq!(desc.source.len(), 13);
        assert_eq!(desc.entry_point, "main");
        assert_eq!(desc.label.as_deref(), Some("fs"));
    }
}
