//! `D3DCAPS8` as reported by both the instance and the device.

use bitflags::bitflags;

use crate::uniforms::{MAX_LIGHTS, MAX_TEXTURE_STAGES};

bitflags! {
    /// `D3DDEVCAPS_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DevCaps: u32 {
        const HWTRANSFORMANDLIGHT = 0x0001_0000;
        const NPATCHES = 0x0100_0000;
    }
}

bitflags! {
    /// `D3DPRASTERCAPS_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RasterCaps: u32 {
        const ZBIAS = 0x0000_4000;
        const FOGRANGE = 0x0001_0000;
    }
}

bitflags! {
    /// `D3DTEXOPCAPS_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextureOpCaps: u32 {
        const DISABLE = 0x0000_0001;
        const SELECTARG1 = 0x0000_0002;
        const SELECTARG2 = 0x0000_0004;
        const MODULATE = 0x0000_0008;
        const MODULATE2X = 0x0000_0010;
        const MODULATE4X = 0x0000_0020;
        const ADD = 0x0000_0040;
        const ADDSIGNED = 0x0000_0080;
        const ADDSIGNED2X = 0x0000_0100;
        const SUBTRACT = 0x0000_0200;
        const ADDSMOOTH = 0x0000_0400;
        const BLENDDIFFUSEALPHA = 0x0000_0800;
        const BLENDTEXTUREALPHA = 0x0000_1000;
        const BLENDFACTORALPHA = 0x0000_2000;
        const BLENDCURRENTALPHA = 0x0000_8000;
        const BUMPENVMAP = 0x0020_0000;
        const BUMPENVMAPLUMINANCE = 0x0040_0000;
        const DOTPRODUCT3 = 0x0080_0000;
    }
}

bitflags! {
    /// `D3DPTFILTERCAPS_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextureFilterCaps: u32 {
        const MINFPOINT = 0x0000_0100;
        const MINFLINEAR = 0x0000_0200;
        const MINFANISOTROPIC = 0x0000_0400;
        const MIPFPOINT = 0x0001_0000;
        const MIPFLINEAR = 0x0002_0000;
        const MAGFPOINT = 0x0100_0000;
        const MAGFLINEAR = 0x0200_0000;
        const MAGFANISOTROPIC = 0x0400_0000;
    }
}

bitflags! {
    /// `D3DCAPS2_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Caps2: u32 {
        const FULLSCREENGAMMA = 0x0002_0000;
    }
}

pub const D3DDEVTYPE_HAL: u32 = 1;

/// The subset of `D3DCAPS8` that content inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caps {
    pub adapter_ordinal: u32,
    pub device_type: u32,
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    pub max_simultaneous_textures: u32,
    pub max_texture_blend_stages: u32,
    pub max_active_lights: u32,
    pub dev_caps: DevCaps,
    pub raster_caps: RasterCaps,
    pub texture_op_caps: TextureOpCaps,
    pub texture_filter_caps: TextureFilterCaps,
    pub caps2: Caps2,
    pub vertex_shader_version: u32,
    pub pixel_shader_version: u32,
}

impl Caps {
    /// Capabilities of the fixed-function translation, clamped to the backend's texture limit.
    pub fn for_backend(max_texture_dimension_2d: u32) -> Self {
        let max_texture = max_texture_dimension_2d.min(4096);
        Self {
            adapter_ordinal: 0,
            device_type: D3DDEVTYPE_HAL,
            max_texture_width: max_texture,
            max_texture_height: max_texture,
            max_simultaneous_textures: MAX_TEXTURE_STAGES as u32,
            max_texture_blend_stages: MAX_TEXTURE_STAGES as u32,
            max_active_lights: MAX_LIGHTS as u32,
            dev_caps: DevCaps::HWTRANSFORMANDLIGHT | DevCaps::NPATCHES,
            raster_caps: RasterCaps::FOGRANGE | RasterCaps::ZBIAS,
            // Everything the fixed-function shader implements; bump mapping is not.
            texture_op_caps: TextureOpCaps::all()
                - TextureOpCaps::BUMPENVMAP
                - TextureOpCaps::BUMPENVMAPLUMINANCE,
            texture_filter_caps: TextureFilterCaps::MAGFLINEAR
                | TextureFilterCaps::MINFANISOTROPIC
                | TextureFilterCaps::MAGFANISOTROPIC
                | TextureFilterCaps::MINFLINEAR
                | TextureFilterCaps::MIPFLINEAR,
            caps2: Caps2::FULLSCREENGAMMA,
            vertex_shader_version: 0,
            pixel_shader_version: 0,
        }
    }
}
