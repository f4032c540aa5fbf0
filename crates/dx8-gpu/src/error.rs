use crate::cmd::EncodeError;

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("wgpu adapter not found")]
    AdapterNotFound,
    #[error("adapter index {0} out of range")]
    AdapterOutOfRange(usize),
    #[error("request_device failed: {0}")]
    RequestDevice(String),
    #[error("create_surface failed: {0}")]
    CreateSurface(String),
    #[error("surface does not support a {width}x{height} configuration on this adapter")]
    UnsupportedSurface { width: u32, height: u32 },
    #[error("surface error: {0}")]
    Surface(String),
    #[error("surface lost")]
    SurfaceLost,
    #[error("wgpu validation error: {0}")]
    Validation(String),
    #[error("unknown shader module {0}")]
    UnknownShaderModule(u32),
    #[error("unknown buffer {0}")]
    UnknownBuffer(u32),
    #[error("unknown texture {0}")]
    UnknownTexture(u32),
    #[error("buffer write out of bounds (buffer size {buffer_size}, write end {write_end})")]
    BufferWriteOutOfBounds { buffer_size: u64, write_end: u64 },
    #[error("texture update for mip {mip_level} expects {expected} bytes but got {actual}")]
    TextureUpdateSizeMismatch {
        mip_level: u32,
        expected: usize,
        actual: usize,
    },
    #[error("readback is only available on headless backends")]
    ReadbackUnavailable,
    #[error("buffer map failed: {0}")]
    BufferMap(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
