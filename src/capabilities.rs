//! Device capability table.
//!
//! Capabilities are determined once when a device is created and are
//! read-only afterwards, so they can be read from any thread without
//! synchronization.

/// A GL or GLES version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Whether this is an OpenGL ES context.
    pub es: bool,
}

impl GlVersion {
    /// Desktop OpenGL version.
    pub fn gl(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            es: false,
        }
    }

    /// OpenGL ES version.
    pub fn gles(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            es: true,
        }
    }

    fn desktop_at_least(&self, major: u32, minor: u32) -> bool {
        !self.es && (self.major, self.minor) >= (major, minor)
    }

    fn es_at_least(&self, major: u32, minor: u32) -> bool {
        self.es && (self.major, self.minor) >= (major, minor)
    }

    /// The lowest version, or extension, that provides compute shaders on this API.
    pub fn compute_requirement(&self) -> &'static str {
        if self.es {
            "OpenGL ES 3.1"
        } else {
            "OpenGL 4.3 or GL_ARB_compute_shader"
        }
    }
}

impl Default for GlVersion {
    fn default() -> Self {
        Self::gl(4, 6)
    }
}

impl std::fmt::Display for GlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api = if self.es { "OpenGL ES" } else { "OpenGL" };
        write!(f, "{} {}.{}", api, self.major, self.minor)
    }
}

/// Features of the native context that select between creation paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Objects can be created and sized without binding (`ARB_direct_state_access`).
    pub direct_state_access: bool,
    /// Objects can carry debug labels (`KHR_debug`).
    pub debug_labeling: bool,
    /// Compute shader stages are supported.
    pub compute_shaders: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            direct_state_access: true,
            debug_labeling: true,
            compute_shaders: true,
        }
    }
}

impl DeviceCapabilities {
    /// A context with none of the optional features.
    pub fn minimal() -> Self {
        Self {
            direct_state_access: false,
            debug_labeling: false,
            compute_shaders: false,
        }
    }

    /// Detect capabilities from the context version and its extension strings.
    ///
    /// ```
    /// use deferred_gl::{DeviceCapabilities, GlVersion};
    ///
    /// let caps = DeviceCapabilities::detect(GlVersion::gl(3, 3), ["GL_KHR_debug"]);
    /// assert!(caps.debug_labeling);
    /// assert!(!caps.direct_state_access);
    /// ```
    pub fn detect<'a>(version: GlVersion, extensions: impl IntoIterator<Item = &'a str>) -> Self {
        let mut caps = Self {
            direct_state_access: version.desktop_at_least(4, 5),
            debug_labeling: version.desktop_at_least(4, 3) || version.es_at_least(3, 2),
            compute_shaders: version.desktop_at_least(4, 3) || version.es_at_least(3, 1),
        };

        for extension in extensions {
            match extension {
                "GL_ARB_direct_state_access" if !version.es => caps.direct_state_access = true,
                "GL_KHR_debug" => caps.debug_labeling = true,
                "GL_ARB_compute_shader" if !version.es => caps.compute_shaders = true,
                _ => {}
            }
        }

        log::debug!("DeviceCapabilities: detected {:?} for {:?}", caps, version);
        caps
    }
}
