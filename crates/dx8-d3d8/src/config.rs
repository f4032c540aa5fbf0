use dx8_gpu::{env_var_truthy, BackendConfig};

pub const UNIFORM_SLOTS_ENV: &str = "DX8_WGPU_UNIFORM_SLOTS";
pub const VALIDATION_ENV: &str = "DX8_WGPU_VALIDATION";
pub const DISABLE_TEXTURE_COMPRESSION_ENV: &str = "DX8_WGPU_DISABLE_TEXTURE_COMPRESSION";

/// Device-wide settings fixed at creation.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Uniform states the arena holds before a draw forces a flush.
    pub uniform_slots: u32,
    pub backend: BackendConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            uniform_slots: 1000,
            backend: BackendConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Defaults overridden by `DX8_WGPU_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(slots) = std::env::var(UNIFORM_SLOTS_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|&slots| slots > 0)
        {
            config.uniform_slots = slots;
        }
        config.backend.validation = env_var_truthy(VALIDATION_ENV);
        config.backend.disable_texture_compression =
            env_var_truthy(DISABLE_TEXTURE_COMPRESSION_ENV);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_reads_overrides() {
        std::env::set_var(UNIFORM_SLOTS_ENV, "64");
        std::env::set_var(VALIDATION_ENV, "on");
        let config = DeviceConfig::from_env();
        assert_eq!(config.uniform_slots, 64);
        assert!(config.backend.validation);

        std::env::set_var(UNIFORM_SLOTS_ENV, "0");
        assert_eq!(DeviceConfig::from_env().uniform_slots, 1000);

        std::env::remove_var(UNIFORM_SLOTS_ENV);
        std::env::remove_var(VALIDATION_ENV);
    }
}
