/// Knobs for adapter selection and device creation.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Wrap pipeline creation and submission in wgpu validation error scopes.
    pub validation: bool,
    /// Never request `TEXTURE_COMPRESSION_BC`, even when the adapter offers it.
    pub disable_texture_compression: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::PRIMARY),
            power_preference: wgpu::PowerPreference::HighPerformance,
            validation: false,
            disable_texture_compression: false,
        }
    }
}

/// Environment variable switches accept `1`, `true`, `yes` and `on` (case-insensitive).
pub fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };

    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

pub(crate) fn negotiated_features_for_available(
    available: wgpu::Features,
    backend_is_gl: bool,
    disable_texture_compression: bool,
) -> wgpu::Features {
    let mut requested = wgpu::Features::empty();

    // BC on the GL backend is unreliable on software adapters; DXT content falls back to
    // `WrongTextureFormat` there instead.
    if !disable_texture_compression
        && !backend_is_gl
        && available.contains(wgpu::Features::TEXTURE_COMPRESSION_BC)
    {
        requested |= wgpu::Features::TEXTURE_COMPRESSION_BC;
    }

    requested
}
