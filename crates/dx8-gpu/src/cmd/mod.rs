//! Backend-agnostic GPU command stream.
//!
//! The device context records render and copy work as plain [`GpuCmd`] values and hands whole
//! streams to [`crate::GpuBackend::submit`]. Nothing in a stream borrows a GPU object, so a stream
//! can be kept open across arbitrarily many API calls and encoded in one go at submission time.

mod encode;

pub use encode::{Encoder, ResourceProvider};

/// Lightweight handle to a compiled render pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineId(pub u32);

/// Lightweight handle to a bind group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindGroupId(pub u32);

/// Lightweight handle to a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Lightweight handle to a 2D texture (and its default view).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Lightweight handle to a shader module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderModuleId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl IndexFormat {
    pub fn byte_size(self) -> u32 {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT_BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Decodes a packed `D3DCOLOR` (`0xAARRGGBB`).
    pub fn from_argb(argb: u32) -> Self {
        let channel = |shift: u32| f64::from((argb >> shift) & 0xff) / 255.0;
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
            a: channel(24),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadOp<T> {
    Load,
    Clear(T),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthAttachment {
    pub texture: TextureId,
    pub load: LoadOp<f32>,
}

/// A render pass always targets the back buffer; the depth attachment is optional.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPassDesc {
    pub color_load: LoadOp<Color>,
    pub depth: Option<DepthAttachment>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// Copy of a `width`x`height` region between two texture mip levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureCopy {
    pub src: TextureId,
    pub src_level: u32,
    pub src_origin: [u32; 2],
    pub dst: TextureId,
    pub dst_level: u32,
    pub dst_origin: [u32; 2],
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GpuCmd {
    BeginRenderPass(RenderPassDesc),
    EndRenderPass,

    SetPipeline(PipelineId),
    SetBindGroup {
        slot: u32,
        bind_group: BindGroupId,
        dynamic_offsets: Vec<u32>,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: BufferId,
        offset: u64,
    },
    SetIndexBuffer {
        buffer: BufferId,
        format: IndexFormat,
        offset: u64,
    },
    SetViewport(Viewport),

    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    },

    /// Only legal outside a render pass.
    CopyTextureToTexture(TextureCopy),
}

impl GpuCmd {
    pub fn draw_indexed(first_index: u32, index_count: u32, base_vertex: i32) -> Self {
        Self::DrawIndexed {
            index_count,
            instance_count: 1,
            first_index,
            base_vertex,
            first_instance: 0,
        }
    }

    fn is_pass_scoped(&self) -> bool {
        !matches!(
            self,
            Self::BeginRenderPass(_) | Self::EndRenderPass | Self::CopyTextureToTexture(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("missing render pipeline {0:?}")]
    MissingPipeline(PipelineId),
    #[error("missing bind group {0:?}")]
    MissingBindGroup(BindGroupId),
    #[error("missing buffer {0:?}")]
    MissingBuffer(BufferId),
    #[error("missing texture {0:?}")]
    MissingTexture(TextureId),
    #[error("no back buffer is available to render into")]
    MissingBackBuffer,
    #[error("arithmetic overflow while encoding {0}")]
    ArithmeticOverflow(&'static str),
    #[error("unexpected EndRenderPass at command {0}")]
    UnexpectedEndRenderPass(usize),
    #[error("command {0} must be recorded inside a render pass")]
    UnexpectedCommandOutsideRenderPass(usize),
    #[error("texture copy at command {0} recorded inside a render pass")]
    CopyInsideRenderPass(usize),
    #[error("render pass begun at command {0} is never ended")]
    UnterminatedRenderPass(usize),
}

/// Counts gathered while validating a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub render_passes: u32,
    pub draws: u32,
    pub copies: u32,
}

/// Checks the pass structure of a command stream without touching any GPU object.
pub fn validate_stream(cmds: &[GpuCmd]) -> Result<StreamSummary, EncodeError> {
    let mut summary = StreamSummary::default();
    let mut open_pass: Option<usize> = None;

    for (i, cmd) in cmds.iter().enumerate() {
        match cmd {
            GpuCmd::BeginRenderPass(_) => {
                if let Some(begin) = open_pass {
                    return Err(EncodeError::UnterminatedRenderPass(begin));
                }
                open_pass = Some(i);
                summary.render_passes += 1;
            }
            GpuCmd::EndRenderPass => {
                if open_pass.take().is_none() {
                    return Err(EncodeError::UnexpectedEndRenderPass(i));
                }
            }
            GpuCmd::CopyTextureToTexture(_) => {
                if open_pass.is_some() {
                    return Err(EncodeError::CopyInsideRenderPass(i));
                }
                summary.copies += 1;
            }
            other => {
                debug_assert!(other.is_pass_scoped());
                if open_pass.is_none() {
                    return Err(EncodeError::UnexpectedCommandOutsideRenderPass(i));
                }
                if matches!(other, GpuCmd::DrawIndexed { .. }) {
                    summary.draws += 1;
                }
            }
        }
    }

    match open_pass {
        Some(begin) => Err(EncodeError::UnterminatedRenderPass(begin)),
        None => Ok(summary),
    }
}
