//! Render state that has to be baked into a compiled pipeline.

use crate::d3d8;
use crate::fvf::Fvf;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Largest meaningful `D3DRS_ZBIAS`.
pub const MAX_Z_BIAS: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
    SrcAlphaSat,
}

impl BlendFactor {
    pub fn to_wgpu(self) -> wgpu::BlendFactor {
        match self {
            Self::Zero => wgpu::BlendFactor::Zero,
            Self::One => wgpu::BlendFactor::One,
            Self::SrcColor => wgpu::BlendFactor::Src,
            Self::InvSrcColor => wgpu::BlendFactor::OneMinusSrc,
            Self::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            Self::InvSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            Self::DestAlpha => wgpu::BlendFactor::DstAlpha,
            Self::InvDestAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
            Self::DestColor => wgpu::BlendFactor::Dst,
            Self::InvDestColor => wgpu::BlendFactor::OneMinusDst,
            Self::SrcAlphaSat => wgpu::BlendFactor::SrcAlphaSaturated,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Zero => d3d8::D3DBLEND_ZERO,
            Self::One => d3d8::D3DBLEND_ONE,
            Self::SrcColor => d3d8::D3DBLEND_SRCCOLOR,
            Self::InvSrcColor => d3d8::D3DBLEND_INVSRCCOLOR,
            Self::SrcAlpha => d3d8::D3DBLEND_SRCALPHA,
            Self::InvSrcAlpha => d3d8::D3DBLEND_INVSRCALPHA,
            Self::DestAlpha => d3d8::D3DBLEND_DESTALPHA,
            Self::InvDestAlpha => d3d8::D3DBLEND_INVDESTALPHA,
            Self::DestColor => d3d8::D3DBLEND_DESTCOLOR,
            Self::InvDestColor => d3d8::D3DBLEND_INVDESTCOLOR,
            Self::SrcAlphaSat => d3d8::D3DBLEND_SRCALPHASAT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunc {
    pub fn to_wgpu(self) -> wgpu::CompareFunction {
        match self {
            Self::Never => wgpu::CompareFunction::Never,
            Self::Less => wgpu::CompareFunction::Less,
            Self::Equal => wgpu::CompareFunction::Equal,
            Self::LessEqual => wgpu::CompareFunction::LessEqual,
            Self::Greater => wgpu::CompareFunction::Greater,
            Self::NotEqual => wgpu::CompareFunction::NotEqual,
            Self::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            Self::Always => wgpu::CompareFunction::Always,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Never => d3d8::D3DCMP_NEVER,
            Self::Less => d3d8::D3DCMP_LESS,
            Self::Equal => d3d8::D3DCMP_EQUAL,
            Self::LessEqual => d3d8::D3DCMP_LESSEQUAL,
            Self::Greater => d3d8::D3DCMP_GREATER,
            Self::NotEqual => d3d8::D3DCMP_NOTEQUAL,
            Self::GreaterEqual => d3d8::D3DCMP_GREATEREQUAL,
            Self::Always => d3d8::D3DCMP_ALWAYS,
        }
    }
}

pub fn d3d8_blend_factor(value: u32) -> Option<BlendFactor> {
    Some(match value {
        d3d8::D3DBLEND_ZERO => BlendFactor::Zero,
        d3d8::D3DBLEND_ONE => BlendFactor::One,
        d3d8::D3DBLEND_SRCCOLOR => BlendFactor::SrcColor,
        d3d8::D3DBLEND_INVSRCCOLOR => BlendFactor::InvSrcColor,
        d3d8::D3DBLEND_SRCALPHA => BlendFactor::SrcAlpha,
        d3d8::D3DBLEND_INVSRCALPHA => BlendFactor::InvSrcAlpha,
        d3d8::D3DBLEND_DESTALPHA => BlendFactor::DestAlpha,
        d3d8::D3DBLEND_INVDESTALPHA => BlendFactor::InvDestAlpha,
        d3d8::D3DBLEND_DESTCOLOR => BlendFactor::DestColor,
        d3d8::D3DBLEND_INVDESTCOLOR => BlendFactor::InvDestColor,
        d3d8::D3DBLEND_SRCALPHASAT => BlendFactor::SrcAlphaSat,
        _ => return None,
    })
}

pub fn d3d8_compare_func(value: u32) -> Option<CompareFunc> {
    Some(match value {
        d3d8::D3DCMP_NEVER => CompareFunc::Never,
        d3d8::D3DCMP_LESS => CompareFunc::Less,
        d3d8::D3DCMP_EQUAL => CompareFunc::Equal,
        d3d8::D3DCMP_LESSEQUAL => CompareFunc::LessEqual,
        d3d8::D3DCMP_GREATER => CompareFunc::Greater,
        d3d8::D3DCMP_NOTEQUAL => CompareFunc::NotEqual,
        d3d8::D3DCMP_GREATEREQUAL => CompareFunc::GreaterEqual,
        d3d8::D3DCMP_ALWAYS => CompareFunc::Always,
        _ => return None,
    })
}

/// Pipeline cache key: everything that changes the compiled pipeline object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineState {
    pub fvf: Fvf,
    pub alpha_blend_enable: bool,
    pub src_blend: BlendFactor,
    pub dst_blend: BlendFactor,
    pub z_write_enable: bool,
    pub z_bias: u32,
    pub z_func: CompareFunc,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            fvf: Fvf::empty(),
            alpha_blend_enable: false,
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::Zero,
            z_write_enable: true,
            z_bias: 0,
            z_func: CompareFunc::LessEqual,
        }
    }
}

impl PipelineState {
    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        if !self.alpha_blend_enable {
            return None;
        }
        let component = wgpu::BlendComponent {
            src_factor: self.src_blend.to_wgpu(),
            dst_factor: self.dst_blend.to_wgpu(),
            operation: wgpu::BlendOperation::Add,
        };
        Some(wgpu::BlendState {
            color: component,
            alpha: component,
        })
    }

    /// `D3DRS_ZBIAS` is an integer in 0..=16 where larger values pull geometry towards the
    /// viewer.
    pub fn depth_stencil_state(&self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.z_write_enable,
            depth_compare: self.z_func.to_wgpu(),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: -(self.z_bias.min(MAX_Z_BIAS) as i32),
                slope_scale: 0.0,
                clamp: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_disable_blending_and_write_depth() {
        let state = PipelineState::default();
        assert_eq!(state.blend_state(), None);
        let depth = state.depth_stencil_state();
        assert!(depth.depth_write_enabled);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::LessEqual);
        assert_eq!(depth.bias.constant, 0);
    }

    #[test]
    fn alpha_blend_translates_factors() {
        let state = PipelineState {
            alpha_blend_enable: true,
            src_blend: BlendFactor::SrcAlpha,
            dst_blend: BlendFactor::InvSrcAlpha,
            ..PipelineState::default()
        };
        let blend = state.blend_state().unwrap();
        assert_eq!(blend.color, wgpu::BlendState::ALPHA_BLENDING.color);
        assert_eq!(blend.alpha, blend.color);
    }

    #[test]
    fn z_bias_pulls_towards_viewer() {
        let state = PipelineState {
            z_bias: 3,
            ..PipelineState::default()
        };
        assert_eq!(state.depth_stencil_state().bias.constant, -3);
    }

    #[test]
    fn raw_values_round_trip() {
        for raw in d3d8::D3DBLEND_ZERO..=d3d8::D3DBLEND_SRCALPHASAT {
            assert_eq!(d3d8_blend_factor(raw).map(BlendFactor::raw), Some(raw));
        }
        for raw in d3d8::D3DCMP_NEVER..=d3d8::D3DCMP_ALWAYS {
            assert_eq!(d3d8_compare_func(raw).map(CompareFunc::raw), Some(raw));
        }
        assert_eq!(d3d8_blend_factor(d3d8::D3DBLEND_BOTHSRCALPHA), None);
        assert_eq!(d3d8_compare_func(0), None);
    }
}
