use super::{
    validate_stream, BindGroupId, BufferId, Color, EncodeError, GpuCmd, IndexFormat, LoadOp,
    PipelineId, RenderPassDesc, StreamSummary, TextureCopy, TextureId,
};

/// Lookup interface that maps lightweight ids in [`GpuCmd`] to wgpu objects.
pub trait ResourceProvider {
    fn pipeline(&self, id: PipelineId) -> Option<&wgpu::RenderPipeline>;
    fn bind_group(&self, id: BindGroupId) -> Option<&wgpu::BindGroup>;
    fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer>;
    fn texture(&self, id: TextureId) -> Option<&wgpu::Texture>;
    fn texture_view(&self, id: TextureId) -> Option<&wgpu::TextureView>;
    fn back_buffer_view(&self) -> Option<&wgpu::TextureView>;
}

/// Turns a validated [`GpuCmd`] stream into a single wgpu command buffer.
pub struct Encoder<'a, R: ResourceProvider> {
    device: &'a wgpu::Device,
    resources: &'a R,
}

impl<'a, R: ResourceProvider> Encoder<'a, R> {
    pub fn new(device: &'a wgpu::Device, resources: &'a R) -> Self {
        Self { device, resources }
    }

    pub fn encode(
        &self,
        label: &str,
        cmds: &[GpuCmd],
    ) -> Result<(wgpu::CommandBuffer, StreamSummary), EncodeError> {
        let summary = validate_stream(cmds)?;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

        let mut i = 0;
        while i < cmds.len() {
            match &cmds[i] {
                GpuCmd::BeginRenderPass(desc) => {
                    i = self.encode_render_pass(&mut encoder, desc, cmds, i + 1)?;
                }
                GpuCmd::CopyTextureToTexture(copy) => {
                    self.encode_copy(&mut encoder, copy)?;
                    i += 1;
                }
                // `validate_stream` already rejected everything else at top level.
                _ => return Err(EncodeError::UnexpectedCommandOutsideRenderPass(i)),
            }
        }

        Ok((encoder.finish(), summary))
    }

    fn encode_copy(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        copy: &TextureCopy,
    ) -> Result<(), EncodeError> {
        let src = self
            .resources
            .texture(copy.src)
            .ok_or(EncodeError::MissingTexture(copy.src))?;
        let dst = self
            .resources
            .texture(copy.dst)
            .ok_or(EncodeError::MissingTexture(copy.dst))?;

        encoder.copy_texture_to_texture(
            wgpu::ImageCopyTexture {
                texture: src,
                mip_level: copy.src_level,
                origin: wgpu::Origin3d {
                    x: copy.src_origin[0],
                    y: copy.src_origin[1],
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyTexture {
                texture: dst,
                mip_level: copy.dst_level,
                origin: wgpu::Origin3d {
                    x: copy.dst_origin[0],
                    y: copy.dst_origin[1],
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: copy.width,
                height: copy.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn encode_render_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        desc: &RenderPassDesc,
        cmds: &[GpuCmd],
        mut i: usize,
    ) -> Result<usize, EncodeError> {
        let color_view = self
            .resources
            .back_buffer_view()
            .ok_or(EncodeError::MissingBackBuffer)?;

        let depth_stencil_attachment = match &desc.depth {
            Some(depth) => Some(wgpu::RenderPassDepthStencilAttachment {
                view: self
                    .resources
                    .texture_view(depth.texture)
                    .ok_or(EncodeError::MissingTexture(depth.texture))?,
                depth_ops: Some(wgpu::Operations {
                    load: depth.load.into(),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            None => None,
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("dx8-scene-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: match desc.color_load {
                        LoadOp::Load => wgpu::LoadOp::Load,
                        LoadOp::Clear(color) => wgpu::LoadOp::Clear(color.into()),
                    },
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        while i < cmds.len() {
            match &cmds[i] {
                GpuCmd::EndRenderPass => return Ok(i + 1),
                GpuCmd::SetPipeline(id) => {
                    let pipeline = self
                        .resources
                        .pipeline(*id)
                        .ok_or(EncodeError::MissingPipeline(*id))?;
                    pass.set_pipeline(pipeline);
                }
                GpuCmd::SetBindGroup {
                    slot,
                    bind_group,
                    dynamic_offsets,
                } => {
                    let bg = self
                        .resources
                        .bind_group(*bind_group)
                        .ok_or(EncodeError::MissingBindGroup(*bind_group))?;
                    pass.set_bind_group(*slot, bg, dynamic_offsets);
                }
                GpuCmd::SetVertexBuffer {
                    slot,
                    buffer,
                    offset,
                } => {
                    let buf = self
                        .resources
                        .buffer(*buffer)
                        .ok_or(EncodeError::MissingBuffer(*buffer))?;
                    pass.set_vertex_buffer(*slot, buf.slice(*offset..));
                }
                GpuCmd::SetIndexBuffer {
                    buffer,
                    format,
                    offset,
                } => {
                    let buf = self
                        .resources
                        .buffer(*buffer)
                        .ok_or(EncodeError::MissingBuffer(*buffer))?;
                    pass.set_index_buffer(buf.slice(*offset..), (*format).into());
                }
                GpuCmd::SetViewport(vp) => {
                    pass.set_viewport(
                        vp.x,
                        vp.y,
                        vp.width,
                        vp.height,
                        vp.min_depth,
                        vp.max_depth,
                    );
                }
                GpuCmd::DrawIndexed {
                    index_count,
                    instance_count,
                    first_index,
                    base_vertex,
                    first_instance,
                } => {
                    let idx_end = first_index
                        .checked_add(*index_count)
                        .ok_or(EncodeError::ArithmeticOverflow("draw indexed range"))?;
                    let inst_end = first_instance
                        .checked_add(*instance_count)
                        .ok_or(EncodeError::ArithmeticOverflow("draw instance range"))?;
                    pass.draw_indexed(*first_index..idx_end, *base_vertex, *first_instance..inst_end);
                }
                GpuCmd::BeginRenderPass(_) | GpuCmd::CopyTextureToTexture(_) => {
                    return Err(EncodeError::UnterminatedRenderPass(i));
                }
            }
            i += 1;
        }

        Err(EncodeError::UnterminatedRenderPass(i))
    }
}

impl From<IndexFormat> for wgpu::IndexFormat {
    fn from(value: IndexFormat) -> Self {
        match value {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

impl From<Color> for wgpu::Color {
    fn from(value: Color) -> Self {
        Self {
            r: value.r,
            g: value.g,
            b: value.b,
            a: value.a,
        }
    }
}

impl From<LoadOp<f32>> for wgpu::LoadOp<f32> {
    fn from(value: LoadOp<f32>) -> Self {
        match value {
            LoadOp::Load => wgpu::LoadOp::Load,
            LoadOp::Clear(v) => wgpu::LoadOp::Clear(v),
        }
    }
}
