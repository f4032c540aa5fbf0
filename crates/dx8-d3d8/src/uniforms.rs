//! CPU mirror of the fixed-function shader's uniform block.
//!
//! Every struct here is `#[repr(C)]` and laid out exactly like its WGSL counterpart in
//! `fixed_function.wgsl` (uniform address space rules: 16-byte aligned nested structs, explicit
//! padding words). The whole [`UniformState`] is copied into the uniform arena byte-for-byte.

use bytemuck::{Pod, Zeroable};

use crate::d3d8;

pub const MAX_TEXTURE_STAGES: usize = 2;
pub const MAX_LIGHTS: usize = 4;
/// WORLD, VIEW, PROJECTION and TEXTURE0..=TEXTURE7.
pub const TRANSFORM_SLOTS: usize = 11;

pub type Matrix = [[f32; 4]; 4];

pub const IDENTITY: Matrix = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

pub const WORLD_SLOT: usize = 0;
pub const VIEW_SLOT: usize = 1;
pub const PROJECTION_SLOT: usize = 2;

/// Maps a `D3DTRANSFORMSTATETYPE` to its index in [`UniformState::transforms`].
pub fn transform_slot(state: u32) -> Option<usize> {
    match state {
        d3d8::D3DTS_WORLD => Some(WORLD_SLOT),
        d3d8::D3DTS_VIEW => Some(VIEW_SLOT),
        d3d8::D3DTS_PROJECTION => Some(PROJECTION_SLOT),
        d3d8::D3DTS_TEXTURE0..=d3d8::D3DTS_TEXTURE7 => {
            Some(3 + (state - d3d8::D3DTS_TEXTURE0) as usize)
        }
        _ => None,
    }
}

/// Decodes a packed `D3DCOLOR` (`0xAARRGGBB`) into RGBA floats.
pub fn argb_to_rgba(argb: u32) -> [f32; 4] {
    let channel = |shift: u32| ((argb >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), channel(24)]
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TextureStageUniforms {
    pub color_op: u32,
    pub color_arg1: u32,
    pub color_arg2: u32,
    pub alpha_op: u32,
    pub alpha_arg1: u32,
    pub alpha_arg2: u32,
    pub texcoord_index: u32,
    pub transform_flags: u32,
}

impl TextureStageUniforms {
    fn stage_default(stage: u32) -> Self {
        let (color_op, alpha_op) = if stage == 0 {
            (d3d8::D3DTOP_MODULATE, d3d8::D3DTOP_SELECTARG1)
        } else {
            (d3d8::D3DTOP_DISABLE, d3d8::D3DTOP_DISABLE)
        };
        Self {
            color_op,
            color_arg1: d3d8::D3DTA_TEXTURE,
            color_arg2: d3d8::D3DTA_CURRENT,
            alpha_op,
            alpha_arg1: d3d8::D3DTA_TEXTURE,
            alpha_arg2: d3d8::D3DTA_CURRENT,
            texcoord_index: stage,
            transform_flags: d3d8::D3DTTFF_DISABLE,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderStateUniforms {
    pub alpha_test_enable: u32,
    /// `D3DRS_ALPHAREF / 255`.
    pub alpha_ref: f32,
    pub alpha_func: u32,
    pub lighting_enable: u32,
    pub ambient: [f32; 4],
    pub texture_factor: [f32; 4],
    pub specular_enable: u32,
    pub ambient_source: u32,
    pub diffuse_source: u32,
    pub specular_source: u32,
    pub emissive_source: u32,
    pub color_vertex: u32,
    pub _pad: [u32; 2],
}

impl Default for RenderStateUniforms {
    fn default() -> Self {
        Self {
            alpha_test_enable: 0,
            alpha_ref: 0.0,
            alpha_func: d3d8::D3DCMP_ALWAYS,
            lighting_enable: 1,
            ambient: [0.0; 4],
            texture_factor: [1.0; 4],
            specular_enable: 0,
            ambient_source: d3d8::D3DMCS_MATERIAL,
            diffuse_source: d3d8::D3DMCS_COLOR1,
            specular_source: d3d8::D3DMCS_COLOR2,
            emissive_source: d3d8::D3DMCS_MATERIAL,
            color_vertex: 1,
            _pad: [0; 2],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightType {
    Point,
    Spot,
    Directional,
}

impl LightType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            d3d8::D3DLIGHT_POINT => Some(Self::Point),
            d3d8::D3DLIGHT_SPOT => Some(Self::Spot),
            d3d8::D3DLIGHT_DIRECTIONAL => Some(Self::Directional),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Point => d3d8::D3DLIGHT_POINT,
            Self::Spot => d3d8::D3DLIGHT_SPOT,
            Self::Directional => d3d8::D3DLIGHT_DIRECTIONAL,
        }
    }
}

/// `D3DLIGHT8`. Colors are RGBA.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightType,
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub ambient: [f32; 4],
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub range: f32,
    pub falloff: f32,
    pub attenuation0: f32,
    pub attenuation1: f32,
    pub attenuation2: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightType::Directional,
            diffuse: [1.0, 1.0, 1.0, 0.0],
            specular: [0.0; 4],
            ambient: [0.0; 4],
            position: [0.0; 3],
            direction: [0.0, 0.0, 1.0],
            range: 0.0,
            falloff: 0.0,
            attenuation0: 0.0,
            attenuation1: 0.0,
            attenuation2: 0.0,
            theta: 0.0,
            phi: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightUniforms {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub ambient: [f32; 4],
    pub position: [f32; 3],
    pub range: f32,
    pub direction: [f32; 3],
    pub falloff: f32,
    pub attenuation: [f32; 3],
    pub theta: f32,
    pub kind: u32,
    pub phi: f32,
    pub _pad: [u32; 2],
}

impl From<&Light> for LightUniforms {
    fn from(light: &Light) -> Self {
        Self {
            diffuse: light.diffuse,
            specular: light.specular,
            ambient: light.ambient,
            position: light.position,
            range: light.range,
            direction: light.direction,
            falloff: light.falloff,
            attenuation: [light.attenuation0, light.attenuation1, light.attenuation2],
            theta: light.theta,
            kind: light.kind.raw(),
            phi: light.phi,
            _pad: [0; 2],
        }
    }
}

/// `D3DMATERIAL8`. Colors are RGBA.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [1.0; 4],
            ambient: [0.0; 4],
            specular: [0.0; 4],
            emissive: [0.0; 4],
            power: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub power: f32,
    pub _pad: [u32; 3],
}

impl From<&Material> for MaterialUniforms {
    fn from(material: &Material) -> Self {
        Self {
            diffuse: material.diffuse,
            ambient: material.ambient,
            specular: material.specular,
            emissive: material.emissive,
            power: material.power,
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct UniformState {
    pub transforms: [Matrix; TRANSFORM_SLOTS],
    pub stages: [TextureStageUniforms; MAX_TEXTURE_STAGES],
    pub render: RenderStateUniforms,
    pub lights: [LightUniforms; MAX_LIGHTS],
    pub material: MaterialUniforms,
    pub light_enable_bits: u32,
    pub _pad: [u32; 3],
}

impl Default for UniformState {
    fn default() -> Self {
        let light = LightUniforms::from(&Light::default());
        Self {
            transforms: [IDENTITY; TRANSFORM_SLOTS],
            stages: [
                TextureStageUniforms::stage_default(0),
                TextureStageUniforms::stage_default(1),
            ],
            render: RenderStateUniforms::default(),
            lights: [light; MAX_LIGHTS],
            material: MaterialUniforms::from(&Material::default()),
            light_enable_bits: 0,
            _pad: [0; 3],
        }
    }
}

impl UniformState {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
