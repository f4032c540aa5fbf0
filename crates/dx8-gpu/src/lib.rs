//! Explicit-GPU boundary for the D3D8 translation layer.
//!
//! Everything above this crate talks to the GPU through [`GpuBackend`]: resources are referred to
//! by lightweight ids and rendering work is expressed as a [`GpuCmd`] stream that the backend
//! encodes at submission time. [`WgpuBackend`] is the production implementation; the
//! `recording` feature adds [`RecordingBackend`], which keeps every call in memory for tests.

mod backend;
pub mod cmd;
mod config;
mod error;
mod wgpu_backend;

#[cfg(feature = "recording")]
mod recording;

pub use backend::{
    BackendCapabilities, BufferDesc, GpuBackend, RenderPipelineDesc, TextureDesc,
    VertexBufferLayoutDesc,
};
pub use cmd::{
    validate_stream, BindGroupId, BufferId, Color, DepthAttachment, EncodeError, GpuCmd,
    IndexFormat, LoadOp, PipelineId, RenderPassDesc, ShaderModuleId, StreamSummary, TextureCopy,
    TextureId, Viewport,
};
pub use config::{env_var_truthy, BackendConfig};
pub use error::GpuError;
pub use wgpu_backend::{AdapterIdentifier, GpuInstance, WgpuBackend, WindowHandles};

#[cfg(feature = "recording")]
pub use recording::{BufferWrite, RecordingBackend, TextureWrite};

/// Rounds `value` up to the next multiple of `alignment` (which must be a power of two).
pub fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::align_up;

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(4, 4), 4);
        assert_eq!(align_up(1392, 256), 1536);
    }
}
