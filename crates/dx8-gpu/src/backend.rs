use crate::cmd::{BindGroupId, BufferId, GpuCmd, PipelineId, ShaderModuleId, TextureId};
use crate::GpuError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub min_uniform_buffer_offset_alignment: u32,
    pub max_texture_dimension_2d: u32,
    pub texture_compression_bc: bool,
    /// Back buffer size in pixels.
    pub back_buffer_size: (u32, u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub label: &'static str,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VertexBufferLayoutDesc {
    pub array_stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

/// Everything needed to compile a pipeline against the backend's fixed layout.
///
/// The pipeline layout is owned by the backend: group 0 is a uniform buffer bound with a dynamic
/// offset, groups 1 and 2 are one texture + sampler each. The color target always uses the back
/// buffer format.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPipelineDesc {
    pub label: &'static str,
    pub shader: ShaderModuleId,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub vertex_buffers: Vec<VertexBufferLayoutDesc>,
    pub topology: wgpu::PrimitiveTopology,
    pub blend: Option<wgpu::BlendState>,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
}

/// The narrow interface the D3D8 device context drives.
///
/// Creation and write calls take effect on the GPU queue immediately; command streams are only
/// executed when passed to [`GpuBackend::submit`], in submission order.
pub trait GpuBackend {
    fn capabilities(&self) -> BackendCapabilities;

    fn create_shader_module(
        &mut self,
        label: &'static str,
        wgsl: &str,
    ) -> Result<ShaderModuleId, GpuError>;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, GpuError>;
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8])
        -> Result<(), GpuError>;
    fn destroy_buffer(&mut self, buffer: BufferId);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, GpuError>;
    /// Replaces the full contents of one mip level. `data` is tightly packed.
    fn write_texture(
        &mut self,
        texture: TextureId,
        mip_level: u32,
        data: &[u8],
    ) -> Result<(), GpuError>;
    fn destroy_texture(&mut self, texture: TextureId);

    /// Bind group for the texture slots (groups 1 and 2) with the shared sampler.
    fn create_texture_bind_group(&mut self, texture: TextureId) -> Result<BindGroupId, GpuError>;
    /// Bind group for group 0 exposing `binding_size` bytes of `buffer` at a dynamic offset.
    fn create_uniform_bind_group(
        &mut self,
        buffer: BufferId,
        binding_size: u64,
    ) -> Result<BindGroupId, GpuError>;
    fn destroy_bind_group(&mut self, bind_group: BindGroupId);

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDesc,
    ) -> Result<PipelineId, GpuError>;

    fn submit(&mut self, label: &'static str, cmds: &[GpuCmd]) -> Result<(), GpuError>;
    fn present(&mut self) -> Result<(), GpuError>;
}
