use hashbrown::{HashMap, HashSet};

use crate::backend::{
    BackendCapabilities, BufferDesc, GpuBackend, RenderPipelineDesc, TextureDesc,
};
use crate::cmd::{
    validate_stream, BindGroupId, BufferId, GpuCmd, PipelineId, ShaderModuleId, TextureId,
};
use crate::GpuError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferWrite {
    pub buffer: BufferId,
    pub offset: u64,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureWrite {
    pub texture: TextureId,
    pub mip_level: u32,
    pub data: Vec<u8>,
}

/// In-memory [`GpuBackend`] that records every call instead of touching a GPU.
///
/// Submissions go through the same structural validation as the wgpu backend, and references
/// to unknown or destroyed objects are reported the way a real device would reject them.
#[derive(Debug)]
pub struct RecordingBackend {
    pub capabilities: BackendCapabilities,
    pub shader_modules: Vec<String>,
    pub buffers: HashMap<BufferId, BufferDesc>,
    pub textures: HashMap<TextureId, TextureDesc>,
    pub bind_groups: HashSet<BindGroupId>,
    pub pipelines: Vec<(PipelineId, RenderPipelineDesc)>,
    pub buffer_writes: Vec<BufferWrite>,
    pub texture_writes: Vec<TextureWrite>,
    pub submissions: Vec<(&'static str, Vec<GpuCmd>)>,
    pub destroyed_buffers: Vec<BufferId>,
    pub destroyed_textures: Vec<TextureId>,
    pub presents: u32,
    next_id: u32,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_capabilities(BackendCapabilities {
            min_uniform_buffer_offset_alignment: 256,
            max_texture_dimension_2d: 8192,
            texture_compression_bc: true,
            back_buffer_size: (width, height),
        })
    }

    pub fn with_capabilities(capabilities: BackendCapabilities) -> Self {
        Self {
            capabilities,
            shader_modules: Vec::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            bind_groups: HashSet::new(),
            pipelines: Vec::new(),
            buffer_writes: Vec::new(),
            texture_writes: Vec::new(),
            submissions: Vec::new(),
            destroyed_buffers: Vec::new(),
            destroyed_textures: Vec::new(),
            presents: 0,
            next_id: 1,
        }
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Every recorded command across all submissions, in submission order.
    pub fn submitted_commands(&self) -> impl Iterator<Item = &GpuCmd> {
        self.submissions.iter().flat_map(|(_, cmds)| cmds.iter())
    }

    pub fn writes_to(&self, buffer: BufferId) -> impl Iterator<Item = &BufferWrite> {
        self.buffer_writes.iter().filter(move |w| w.buffer == buffer)
    }

    fn check_references(&self, cmds: &[GpuCmd]) -> Result<(), GpuError> {
        for cmd in cmds {
            match cmd {
                GpuCmd::SetPipeline(id) => {
                    if !self.pipelines.iter().any(|(p, _)| p == id) {
                        return Err(GpuError::Validation(format!("unknown pipeline {id:?}")));
                    }
                }
                GpuCmd::SetBindGroup { bind_group, .. } => {
                    if !self.bind_groups.contains(bind_group) {
                        return Err(GpuError::Validation(format!(
                            "unknown bind group {bind_group:?}"
                        )));
                    }
                }
                GpuCmd::SetVertexBuffer { buffer, .. } | GpuCmd::SetIndexBuffer { buffer, .. } => {
                    if !self.buffers.contains_key(buffer) {
                        return Err(GpuError::UnknownBuffer(buffer.0));
                    }
                }
                GpuCmd::CopyTextureToTexture(copy) => {
                    for texture in [copy.src, copy.dst] {
                        if !self.textures.contains_key(&texture) {
                            return Err(GpuError::UnknownTexture(texture.0));
                        }
                    }
                }
                GpuCmd::BeginRenderPass(desc) => {
                    if let Some(depth) = desc.depth {
                        if !self.textures.contains_key(&depth.texture) {
                            return Err(GpuError::UnknownTexture(depth.texture.0));
                        }
                    }
                }
                GpuCmd::EndRenderPass | GpuCmd::SetViewport(_) | GpuCmd::DrawIndexed { .. } => {}
            }
        }
        Ok(())
    }
}

impl GpuBackend for RecordingBackend {
    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn create_shader_module(
        &mut self,
        _label: &'static str,
        wgsl: &str,
    ) -> Result<ShaderModuleId, GpuError> {
        self.shader_modules.push(wgsl.to_owned());
        Ok(ShaderModuleId(self.alloc_id()))
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, GpuError> {
        let id = BufferId(self.alloc_id());
        self.buffers.insert(id, desc.clone());
        Ok(id)
    }

    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let desc = self
            .buffers
            .get(&buffer)
            .ok_or(GpuError::UnknownBuffer(buffer.0))?;
        let buffer_size = crate::align_up(desc.size, wgpu::COPY_BUFFER_ALIGNMENT);
        let write_end = offset + data.len() as u64;
        if write_end > buffer_size {
            return Err(GpuError::BufferWriteOutOfBounds {
                buffer_size,
                write_end,
            });
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0
            || data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0
        {
            return Err(GpuError::Validation(format!(
                "unaligned buffer write at {offset} of {} bytes",
                data.len()
            )));
        }
        self.buffer_writes.push(BufferWrite {
            buffer,
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.destroyed_buffers.push(buffer);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, GpuError> {
        let id = TextureId(self.alloc_id());
        self.textures.insert(id, desc.clone());
        Ok(id)
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        mip_level: u32,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let desc = self
            .textures
            .get(&texture)
            .ok_or(GpuError::UnknownTexture(texture.0))?;
        if mip_level >= desc.mip_level_count {
            return Err(GpuError::Validation(format!(
                "mip level {mip_level} out of range"
            )));
        }
        self.texture_writes.push(TextureWrite {
            texture,
            mip_level,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.destroyed_textures.push(texture);
    }

    fn create_texture_bind_group(&mut self, texture: TextureId) -> Result<BindGroupId, GpuError> {
        if !self.textures.contains_key(&texture) {
            return Err(GpuError::UnknownTexture(texture.0));
        }
        let id = BindGroupId(self.alloc_id());
        self.bind_groups.insert(id);
        Ok(id)
    }

    fn create_uniform_bind_group(
        &mut self,
        buffer: BufferId,
        _binding_size: u64,
    ) -> Result<BindGroupId, GpuError> {
        if !self.buffers.contains_key(&buffer) {
            return Err(GpuError::UnknownBuffer(buffer.0));
        }
        let id = BindGroupId(self.alloc_id());
        self.bind_groups.insert(id);
        Ok(id)
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupId) {
        self.bind_groups.remove(&bind_group);
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDesc,
    ) -> Result<PipelineId, GpuError> {
        let id = PipelineId(self.alloc_id());
        self.pipelines.push((id, desc.clone()));
        Ok(id)
    }

    fn submit(&mut self, label: &'static str, cmds: &[GpuCmd]) -> Result<(), GpuError> {
        validate_stream(cmds)?;
        self.check_references(cmds)?;
        if !cmds.is_empty() {
            self.submissions.push((label, cmds.to_vec()));
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), GpuError> {
        self.presents += 1;
        Ok(())
    }
}
