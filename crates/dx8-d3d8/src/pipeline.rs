//! Pipeline cache keyed on [`PipelineState`] plus the descriptor builder behind it.

use dx8_gpu::{PipelineId, RenderPipelineDesc, ShaderModuleId, VertexBufferLayoutDesc};
use tracing::debug;

use crate::fvf::{VertexAttribute, VertexFormatDescriptor};
use crate::state::PipelineState;

/// WGSL source of the fixed-function vertex and fragment stages.
pub const FIXED_FUNCTION_WGSL: &str = include_str!("fixed_function.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Bind group of the uniform arena; the texture stages follow it.
pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP_BASE: u32 = 1;

/// Vertex buffer slot of the application's stream 0.
pub const STREAM_SLOT: u32 = 0;
/// Vertex buffer slot of the zero-stride buffer supplying defaults for absent attributes.
pub const CONSTANT_SLOT: u32 = 1;

const CONSTANT_ZERO_OFFSET: u64 = 0;
const CONSTANT_BLACK_OFFSET: u64 = 16;
const CONSTANT_WHITE_OFFSET: u64 = 20;

/// Contents of the constant vertex buffer: 16 zero bytes, then opaque black and opaque white
/// `D3DCOLOR`s.
pub const CONSTANT_VERTEX_DATA: [u8; 24] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0xff, //
    0xff, 0xff, 0xff, 0xff,
];

/// Default for an attribute the vertex format does not supply.
fn constant_attribute(attribute: VertexAttribute) -> (wgpu::VertexFormat, u64) {
    match attribute {
        VertexAttribute::Position | VertexAttribute::Normal => {
            (wgpu::VertexFormat::Float32x3, CONSTANT_ZERO_OFFSET)
        }
        VertexAttribute::BlendWeights => (wgpu::VertexFormat::Float32x4, CONSTANT_ZERO_OFFSET),
        VertexAttribute::BlendIndices => (wgpu::VertexFormat::Uint8x4, CONSTANT_ZERO_OFFSET),
        VertexAttribute::Diffuse => (wgpu::VertexFormat::Unorm8x4, CONSTANT_WHITE_OFFSET),
        VertexAttribute::Specular => (wgpu::VertexFormat::Unorm8x4, CONSTANT_BLACK_OFFSET),
        VertexAttribute::TexCoord0 | VertexAttribute::TexCoord1 => {
            (wgpu::VertexFormat::Float32x2, CONSTANT_ZERO_OFFSET)
        }
    }
}

/// Builds the pipeline descriptor for `state`.
///
/// Every shader input is fed from exactly one of the two vertex buffers, so the shader's input
/// layout does not depend on the vertex format.
pub fn pipeline_desc(state: &PipelineState, shader: ShaderModuleId) -> RenderPipelineDesc {
    let layout = VertexFormatDescriptor::new(state.fvf);

    let mut stream = VertexBufferLayoutDesc {
        array_stride: layout.stride,
        attributes: Vec::with_capacity(layout.attributes.len()),
    };
    let mut constant = VertexBufferLayoutDesc {
        array_stride: 0,
        attributes: Vec::new(),
    };

    for attribute in VertexAttribute::ALL {
        let shader_location = attribute.shader_location();
        match layout.attribute(attribute) {
            Some(present) => stream.attributes.push(wgpu::VertexAttribute {
                format: present.format,
                offset: present.offset,
                shader_location,
            }),
            None => {
                let (format, offset) = constant_attribute(attribute);
                constant.attributes.push(wgpu::VertexAttribute {
                    format,
                    offset,
                    shader_location,
                });
            }
        }
    }

    RenderPipelineDesc {
        label: "d3d8 fixed function",
        shader,
        vertex_entry: VERTEX_ENTRY,
        fragment_entry: FRAGMENT_ENTRY,
        vertex_buffers: vec![stream, constant],
        topology: wgpu::PrimitiveTopology::TriangleList,
        blend: state.blend_state(),
        depth_stencil: Some(state.depth_stencil_state()),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Compiled pipelines for every [`PipelineState`] seen so far.
///
/// Lookup is a linear scan: a session only ever sees a handful of distinct states. Entries live
/// as long as the device.
#[derive(Debug, Default)]
pub struct PipelineCache {
    entries: Vec<(PipelineState, PipelineId)>,
    hits: u64,
    misses: u64,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &PipelineState) -> Option<PipelineId> {
        self.entries
            .iter()
            .find(|(key, _)| key == state)
            .map(|(_, id)| *id)
    }

    pub fn get_or_create<E>(
        &mut self,
        state: &PipelineState,
        create: impl FnOnce(&PipelineState) -> Result<PipelineId, E>,
    ) -> Result<PipelineId, E> {
        if let Some(id) = self.get(state) {
            self.hits += 1;
            return Ok(id);
        }
        self.misses += 1;
        let id = create(state)?;
        debug!(
            fvf = state.fvf.bits(),
            alpha_blend = state.alpha_blend_enable,
            src_blend = ?state.src_blend,
            dst_blend = ?state.dst_blend,
            z_write = state.z_write_enable,
            z_bias = state.z_bias,
            z_func = ?state.z_func,
            entries = self.entries.len() + 1,
            "built fixed-function pipeline"
        );
        self.entries.push((*state, id));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fvf::Fvf;
    use crate::state::{BlendFactor, CompareFunc};
    use pretty_assertions::assert_eq;

    fn counter() -> impl FnMut(&PipelineState) -> Result<PipelineId, ()> {
        let mut next = 0;
        move |_| {
            next += 1;
            Ok(PipelineId(next))
        }
    }

    #[test]
    fn equal_states_share_a_pipeline() {
        let mut cache = PipelineCache::new();
        let mut create = counter();
        let state = PipelineState {
            fvf: Fvf::XYZ | Fvf::DIFFUSE,
            ..PipelineState::default()
        };
        let same = PipelineState { ..state };
        let a = cache.get_or_create(&state, &mut create).unwrap();
        let b = cache.get_or_create(&same, &mut create).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn each_differing_field_adds_one_entry() {
        let mut cache = PipelineCache::new();
        let mut create = counter();
        let base = PipelineState::default();
        let variants = [
            PipelineState {
                fvf: Fvf::XYZ,
                ..base
            },
            PipelineState {
                alpha_blend_enable: true,
                ..base
            },
            PipelineState {
                src_blend: BlendFactor::SrcAlpha,
                ..base
            },
            PipelineState {
                dst_blend: BlendFactor::InvSrcAlpha,
                ..base
            },
            PipelineState {
                z_write_enable: false,
                ..base
            },
            PipelineState {
                z_bias: 1,
                ..base
            },
            PipelineState {
                z_func: CompareFunc::Always,
                ..base
            },
        ];

        let first = cache.get_or_create(&base, &mut create).unwrap();
        for (i, variant) in variants.iter().enumerate() {
            let id = cache.get_or_create(variant, &mut create).unwrap();
            assert_ne!(id, first);
            assert_eq!(cache.len(), i + 2);
        }
    }

    #[test]
    fn creation_errors_are_not_cached() {
        let mut cache = PipelineCache::new();
        let state = PipelineState::default();
        let err = cache.get_or_create(&state, |_| Err::<PipelineId, _>("boom"));
        assert_eq!(err, Err("boom"));
        assert!(cache.is_empty());
    }

    #[test]
    fn absent_attributes_come_from_the_constant_buffer() {
        let state = PipelineState {
            fvf: Fvf::XYZ | Fvf::DIFFUSE,
            ..PipelineState::default()
        };
        let desc = pipeline_desc(&state, ShaderModuleId(1));
        assert_eq!(desc.vertex_buffers.len(), 2);

        let stream = &desc.vertex_buffers[STREAM_SLOT as usize];
        assert_eq!(stream.array_stride, 16);
        let locations: Vec<u32> = stream.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 4]);

        let constant = &desc.vertex_buffers[CONSTANT_SLOT as usize];
        assert_eq!(constant.array_stride, 0);
        let specular = constant
            .attributes
            .iter()
            .find(|a| a.shader_location == VertexAttribute::Specular.shader_location())
            .unwrap();
        assert_eq!(specular.offset, CONSTANT_BLACK_OFFSET);
        assert_eq!(
            &CONSTANT_VERTEX_DATA[specular.offset as usize..][..4],
            &[0, 0, 0, 0xff]
        );
        assert_eq!(constant.attributes.len() + stream.attributes.len(), 8);
        for attribute in &constant.attributes {
            assert!(attribute.offset + attribute.format.size() <= CONSTANT_VERTEX_DATA.len() as u64);
        }
    }
}
