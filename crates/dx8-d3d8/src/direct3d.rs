//! The `IDirect3D8` entry object: adapter enumeration, format queries and device creation.

use dx8_gpu::{AdapterIdentifier, GpuInstance, WgpuBackend, WindowHandles};
use tracing::info;

use crate::caps::Caps;
use crate::config::DeviceConfig;
use crate::device::{Device, DisplayMode};
use crate::error::{D3dError, D3dResult};
use crate::format::D3dFormat;

/// Only one display mode is advertised; the back buffer is sized by the present parameters.
const DEFAULT_MODE: DisplayMode = DisplayMode {
    width: 800,
    height: 600,
    refresh_rate: 60,
    format: D3dFormat::A8R8G8B8,
};

/// Texture limit reported before a device exists.
const INSTANCE_MAX_TEXTURE_DIMENSION: u32 = 4096;

/// `D3DPRESENT_PARAMETERS`, reduced to what the translation honors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentParameters {
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
    pub back_buffer_format: D3dFormat,
    pub windowed: bool,
    pub enable_auto_depth_stencil: bool,
    pub auto_depth_stencil_format: D3dFormat,
}

impl Default for PresentParameters {
    fn default() -> Self {
        Self {
            back_buffer_width: DEFAULT_MODE.width,
            back_buffer_height: DEFAULT_MODE.height,
            back_buffer_format: D3dFormat::A8R8G8B8,
            windowed: true,
            enable_auto_depth_stencil: true,
            auto_depth_stencil_format: D3dFormat::D24S8,
        }
    }
}

pub struct Direct3D8 {
    instance: GpuInstance,
    config: DeviceConfig,
}

impl Direct3D8 {
    pub fn new(config: DeviceConfig) -> Self {
        let instance = GpuInstance::new(config.backend.clone());
        Self { instance, config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn adapter_count(&self) -> u32 {
        self.instance.adapter_count() as u32
    }

    fn check_adapter(&self, adapter: u32) -> D3dResult<()> {
        if adapter >= self.adapter_count() {
            return Err(D3dError::InvalidCall("adapter out of range"));
        }
        Ok(())
    }

    pub fn adapter_identifier(&self, adapter: u32) -> D3dResult<AdapterIdentifier> {
        self.instance
            .adapter_identifier(adapter as usize)
            .ok_or(D3dError::InvalidCall("adapter out of range"))
    }

    pub fn adapter_mode_count(&self, adapter: u32) -> D3dResult<u32> {
        self.check_adapter(adapter)?;
        Ok(1)
    }

    pub fn enum_adapter_modes(&self, adapter: u32, mode: u32) -> D3dResult<DisplayMode> {
        self.check_adapter(adapter)?;
        if mode != 0 {
            return Err(D3dError::InvalidCall("mode out of range"));
        }
        Ok(DEFAULT_MODE)
    }

    pub fn adapter_display_mode(&self, adapter: u32) -> D3dResult<DisplayMode> {
        self.check_adapter(adapter)?;
        Ok(DEFAULT_MODE)
    }

    pub fn device_caps(&self, adapter: u32) -> D3dResult<Caps> {
        self.check_adapter(adapter)?;
        Ok(Caps {
            adapter_ordinal: adapter,
            ..Caps::for_backend(INSTANCE_MAX_TEXTURE_DIMENSION)
        })
    }

    /// Only the back-buffer and depth formats are accepted; usage and resource type do not
    /// change the answer.
    pub fn check_device_format(
        &self,
        adapter: u32,
        _adapter_format: u32,
        _usage: u32,
        _resource_type: u32,
        format: u32,
    ) -> D3dResult<()> {
        self.check_adapter(adapter)?;
        match D3dFormat::from_raw(format) {
            Some(D3dFormat::A8R8G8B8 | D3dFormat::D32 | D3dFormat::D24S8) => Ok(()),
            _ => Err(D3dError::WrongTextureFormat(format)),
        }
    }

    pub fn check_depth_stencil_match(&self, adapter: u32) -> D3dResult<()> {
        self.check_adapter(adapter)
    }

    /// Creates a device presenting into `window`, or into an offscreen back buffer when `None`.
    pub fn create_device(
        &self,
        adapter: u32,
        window: Option<WindowHandles>,
        params: &PresentParameters,
    ) -> D3dResult<Device<WgpuBackend>> {
        self.check_adapter(adapter)?;
        let backend = self.instance.create_backend(
            adapter as usize,
            window,
            params.back_buffer_width,
            params.back_buffer_height,
        )?;
        info!(
            adapter,
            width = params.back_buffer_width,
            height = params.back_buffer_height,
            windowed = params.windowed,
            "created device"
        );
        Device::new(backend, &self.config)
    }
}
