use futures_intrusive::channel::shared::oneshot_channel;
use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::backend::{
    BackendCapabilities, BufferDesc, GpuBackend, RenderPipelineDesc, TextureDesc,
};
use crate::cmd::{
    BindGroupId, BufferId, Encoder, GpuCmd, PipelineId, ResourceProvider, ShaderModuleId,
    TextureId,
};
use crate::config::negotiated_features_for_available;
use crate::{align_up, BackendConfig, GpuError};

const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// Native window the swap chain presents into.
#[derive(Clone, Copy, Debug)]
pub struct WindowHandles {
    window: wgpu::rwh::RawWindowHandle,
    display: wgpu::rwh::RawDisplayHandle,
}

impl WindowHandles {
    /// # Safety
    ///
    /// Both handles must stay valid for as long as any backend created from them is alive.
    pub unsafe fn new(
        window: wgpu::rwh::RawWindowHandle,
        display: wgpu::rwh::RawDisplayHandle,
    ) -> Self {
        Self { window, display }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterIdentifier {
    pub name: String,
    pub driver: String,
    pub driver_info: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub backend: wgpu::Backend,
}

impl From<wgpu::AdapterInfo> for AdapterIdentifier {
    fn from(info: wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name,
            driver: info.driver,
            driver_info: info.driver_info,
            vendor_id: info.vendor,
            device_id: info.device,
            backend: info.backend,
        }
    }
}

/// Adapter-enumerating entry point; one per process is enough.
pub struct GpuInstance {
    config: BackendConfig,
    instance: wgpu::Instance,
    adapters: Vec<wgpu::Adapter>,
}

impl GpuInstance {
    pub fn new(config: BackendConfig) -> Self {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let mut adapters = instance.enumerate_adapters(config.backends);
        if adapters.is_empty() {
            let fallback = pollster::block_on(instance.request_adapter(
                &wgpu::RequestAdapterOptions {
                    power_preference: config.power_preference,
                    compatible_surface: None,
                    force_fallback_adapter: true,
                },
            ));
            adapters.extend(fallback);
        }
        // The preferred adapter becomes the default (index 0).
        adapters.sort_by_key(|adapter| {
            let ty = adapter.get_info().device_type;
            match (config.power_preference, ty) {
                (wgpu::PowerPreference::HighPerformance, wgpu::DeviceType::DiscreteGpu) => 0,
                (wgpu::PowerPreference::LowPower, wgpu::DeviceType::IntegratedGpu) => 0,
                (_, wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu) => 1,
                (_, wgpu::DeviceType::Cpu) => 3,
                _ => 2,
            }
        });

        debug!(adapters = adapters.len(), "dx8-gpu enumerated adapters");
        Self {
            config,
            instance,
            adapters,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn adapter_identifier(&self, adapter: usize) -> Option<AdapterIdentifier> {
        self.adapters
            .get(adapter)
            .map(|a| AdapterIdentifier::from(a.get_info()))
    }

    /// Creates a device on `adapter`. With `window == None` rendering goes to an offscreen
    /// back buffer that can be read back with [`WgpuBackend::read_back_buffer`].
    pub fn create_backend(
        &self,
        adapter: usize,
        window: Option<WindowHandles>,
        width: u32,
        height: u32,
    ) -> Result<WgpuBackend, GpuError> {
        let adapter = self
            .adapters
            .get(adapter)
            .ok_or(GpuError::AdapterOutOfRange(adapter))?;
        let info = adapter.get_info();

        let surface = match window {
            Some(handles) => {
                // SAFETY: `WindowHandles::new` requires the handles to outlive the backend.
                let surface = unsafe {
                    self.instance
                        .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                            raw_display_handle: handles.display,
                            raw_window_handle: handles.window,
                        })
                }
                .map_err(|e| GpuError::CreateSurface(e.to_string()))?;
                if !adapter.is_surface_supported(&surface) {
                    return Err(GpuError::UnsupportedSurface { width, height });
                }
                Some(surface)
            }
            None => None,
        };

        let backend_is_gl = info.backend == wgpu::Backend::Gl;
        let adapter_features = adapter.features();
        let required_features = negotiated_features_for_available(
            adapter_features,
            backend_is_gl,
            self.config.disable_texture_compression,
        );
        debug!(
            adapter = %info.name,
            backend = ?info.backend,
            ?required_features,
            "dx8-gpu negotiated wgpu features"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("dx8-device"),
                required_features,
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        ))
        .map_err(|e| GpuError::RequestDevice(e.to_string()))?;

        let target = match surface {
            Some(surface) => {
                let config = surface
                    .get_default_config(adapter, width, height)
                    .ok_or(GpuError::UnsupportedSurface { width, height })?;
                surface.configure(&device, &config);
                RenderTarget::Surface {
                    surface,
                    config,
                    frame: None,
                }
            }
            None => {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("dx8-headless-back-buffer"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: HEADLESS_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                RenderTarget::Headless {
                    texture,
                    view,
                    width,
                    height,
                }
            }
        };

        Ok(WgpuBackend::new(self.config.clone(), device, queue, target))
    }
}

enum RenderTarget {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        frame: Option<(wgpu::SurfaceTexture, wgpu::TextureView)>,
    },
    Headless {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
        width: u32,
        height: u32,
    },
}

impl RenderTarget {
    fn format(&self) -> wgpu::TextureFormat {
        match self {
            Self::Surface { config, .. } => config.format,
            Self::Headless { .. } => HEADLESS_FORMAT,
        }
    }

    fn size(&self) -> (u32, u32) {
        match self {
            Self::Surface { config, .. } => (config.width, config.height),
            Self::Headless { width, height, .. } => (*width, *height),
        }
    }

    fn view(&self) -> Option<&wgpu::TextureView> {
        match self {
            Self::Surface { frame, .. } => frame.as_ref().map(|(_, view)| view),
            Self::Headless { view, .. } => Some(view),
        }
    }
}

struct TextureEntry {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

#[derive(Default)]
struct ResourceTables {
    shader_modules: HashMap<u32, wgpu::ShaderModule>,
    buffers: HashMap<u32, wgpu::Buffer>,
    textures: HashMap<u32, TextureEntry>,
    bind_groups: HashMap<u32, wgpu::BindGroup>,
    pipelines: HashMap<u32, wgpu::RenderPipeline>,
}

struct Resources<'a> {
    tables: &'a ResourceTables,
    back_buffer: Option<&'a wgpu::TextureView>,
}

impl ResourceProvider for Resources<'_> {
    fn pipeline(&self, id: PipelineId) -> Option<&wgpu::RenderPipeline> {
        self.tables.pipelines.get(&id.0)
    }

    fn bind_group(&self, id: BindGroupId) -> Option<&wgpu::BindGroup> {
        self.tables.bind_groups.get(&id.0)
    }

    fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.tables.buffers.get(&id.0)
    }

    fn texture(&self, id: TextureId) -> Option<&wgpu::Texture> {
        self.tables.textures.get(&id.0).map(|t| &t.texture)
    }

    fn texture_view(&self, id: TextureId) -> Option<&wgpu::TextureView> {
        self.tables.textures.get(&id.0).map(|t| &t.view)
    }

    fn back_buffer_view(&self) -> Option<&wgpu::TextureView> {
        self.back_buffer
    }
}

/// `(block width, block height, bytes per block)` for the formats this backend uploads.
fn block_layout(format: wgpu::TextureFormat) -> Option<(u32, u32, u32)> {
    use wgpu::TextureFormat as F;
    match format {
        F::Bgra8Unorm | F::Bgra8UnormSrgb | F::Rgba8Unorm | F::Rgba8UnormSrgb => Some((1, 1, 4)),
        F::Bc1RgbaUnorm | F::Bc1RgbaUnormSrgb => Some((4, 4, 8)),
        F::Bc2RgbaUnorm | F::Bc2RgbaUnormSrgb | F::Bc3RgbaUnorm | F::Bc3RgbaUnormSrgb => {
            Some((4, 4, 16))
        }
        _ => None,
    }
}

/// wgpu implementation of [`GpuBackend`].
pub struct WgpuBackend {
    config: BackendConfig,
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: RenderTarget,
    uniform_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    resources: ResourceTables,
    next_id: u32,
}

impl WgpuBackend {
    fn new(
        config: BackendConfig,
        device: wgpu::Device,
        queue: wgpu::Queue,
        target: RenderTarget,
    ) -> Self {
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("dx8-uniform-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("dx8-texture-bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("dx8-pipeline-layout"),
            bind_group_layouts: &[
                &uniform_bind_group_layout,
                &texture_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("dx8-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            config,
            device,
            queue,
            target,
            uniform_bind_group_layout,
            texture_bind_group_layout,
            pipeline_layout,
            sampler,
            resources: ResourceTables::default(),
            next_id: 1,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn begin_validation_scope(&self) {
        if self.config.validation {
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        }
    }

    fn end_validation_scope(&self) -> Result<(), GpuError> {
        if !self.config.validation {
            return Ok(());
        }
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(GpuError::Validation(err.to_string())),
            None => Ok(()),
        }
    }

    fn acquire_frame(&mut self) -> Result<(), GpuError> {
        let RenderTarget::Surface {
            surface,
            config,
            frame,
        } = &mut self.target
        else {
            return Ok(());
        };
        if frame.is_some() {
            return Ok(());
        }

        let texture = match surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!(%err, "dx8-gpu surface needs reconfiguration");
                surface.configure(&self.device, config);
                surface.get_current_texture().map_err(|err| match err {
                    wgpu::SurfaceError::Lost => GpuError::SurfaceLost,
                    other => GpuError::Surface(other.to_string()),
                })?
            }
            Err(err) => return Err(GpuError::Surface(err.to_string())),
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        *frame = Some((texture, view));
        Ok(())
    }

    /// Reads the headless back buffer as tightly packed BGRA8 rows.
    pub fn read_back_buffer(&self) -> Result<Vec<u8>, GpuError> {
        let RenderTarget::Headless {
            texture,
            width,
            height,
            ..
        } = &self.target
        else {
            return Err(GpuError::ReadbackUnavailable);
        };

        let unpadded_bytes_per_row = *width * 4;
        let padded_bytes_per_row = align_up(
            u64::from(unpadded_bytes_per_row),
            u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
        ) as u32;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dx8-readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(*height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("dx8-readback-encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(*height),
                },
            },
            wgpu::Extent3d {
                width: *width,
                height: *height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit([encoder.finish()]);

        let slice = staging.slice(..);
        let (sender, receiver) = oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = sender.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        pollster::block_on(receiver.receive())
            .ok_or_else(|| GpuError::BufferMap("map callback dropped".into()))?
            .map_err(|e| GpuError::BufferMap(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let mut out = Vec::with_capacity((unpadded_bytes_per_row * *height) as usize);
        for row in mapped.chunks_exact(padded_bytes_per_row as usize) {
            out.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(mapped);
        staging.unmap();
        Ok(out)
    }
}

impl GpuBackend for WgpuBackend {
    fn capabilities(&self) -> BackendCapabilities {
        let limits = self.device.limits();
        BackendCapabilities {
            min_uniform_buffer_offset_alignment: limits.min_uniform_buffer_offset_alignment,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            texture_compression_bc: self
                .device
                .features()
                .contains(wgpu::Features::TEXTURE_COMPRESSION_BC),
            back_buffer_size: self.target.size(),
        }
    }

    fn create_shader_module(
        &mut self,
        label: &'static str,
        wgsl: &str,
    ) -> Result<ShaderModuleId, GpuError> {
        self.begin_validation_scope();
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(wgsl.into()),
            });
        self.end_validation_scope()?;

        let id = self.alloc_id();
        self.resources.shader_modules.insert(id, module);
        Ok(ShaderModuleId(id))
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, GpuError> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: align_up(desc.size, wgpu::COPY_BUFFER_ALIGNMENT),
            usage: desc.usage,
            mapped_at_creation: false,
        });
        let id = self.alloc_id();
        self.resources.buffers.insert(id, buffer);
        Ok(BufferId(id))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let buf = self
            .resources
            .buffers
            .get(&buffer.0)
            .ok_or(GpuError::UnknownBuffer(buffer.0))?;
        let write_end = offset + data.len() as u64;
        if write_end > buf.size() {
            return Err(GpuError::BufferWriteOutOfBounds {
                buffer_size: buf.size(),
                write_end,
            });
        }
        self.queue.write_buffer(buf, offset, data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if let Some(buf) = self.resources.buffers.remove(&buffer.0) {
            buf.destroy();
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, GpuError> {
        self.begin_validation_scope();
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: desc.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: desc.usage,
            view_formats: &[],
        });
        self.end_validation_scope()?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = self.alloc_id();
        self.resources.textures.insert(
            id,
            TextureEntry {
                texture,
                view,
                width: desc.width,
                height: desc.height,
                format: desc.format,
            },
        );
        Ok(TextureId(id))
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        mip_level: u32,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let entry = self
            .resources
            .textures
            .get(&texture.0)
            .ok_or(GpuError::UnknownTexture(texture.0))?;
        let (block_w, block_h, block_bytes) = block_layout(entry.format).ok_or_else(|| {
            GpuError::Validation(format!("texture format {:?} is not writable", entry.format))
        })?;

        let width = (entry.width >> mip_level).max(1);
        let height = (entry.height >> mip_level).max(1);
        let blocks_wide = width.div_ceil(block_w);
        let blocks_high = height.div_ceil(block_h);
        let bytes_per_row = blocks_wide * block_bytes;
        let expected = (bytes_per_row * blocks_high) as usize;
        if data.len() != expected {
            return Err(GpuError::TextureUpdateSizeMismatch {
                mip_level,
                expected,
                actual: data.len(),
            });
        }

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &entry.texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(blocks_high),
            },
            // Block-compressed copies cover whole blocks even when the mip is smaller.
            wgpu::Extent3d {
                width: blocks_wide * block_w,
                height: blocks_high * block_h,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if let Some(entry) = self.resources.textures.remove(&texture.0) {
            entry.texture.destroy();
        }
    }

    fn create_texture_bind_group(&mut self, texture: TextureId) -> Result<BindGroupId, GpuError> {
        let entry = self
            .resources
            .textures
            .get(&texture.0)
            .ok_or(GpuError::UnknownTexture(texture.0))?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("dx8-texture-bg"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&entry.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        let id = self.alloc_id();
        self.resources.bind_groups.insert(id, bind_group);
        Ok(BindGroupId(id))
    }

    fn create_uniform_bind_group(
        &mut self,
        buffer: BufferId,
        binding_size: u64,
    ) -> Result<BindGroupId, GpuError> {
        let buf = self
            .resources
            .buffers
            .get(&buffer.0)
            .ok_or(GpuError::UnknownBuffer(buffer.0))?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("dx8-uniform-bg"),
            layout: &self.uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: buf,
                    offset: 0,
                    size: wgpu::BufferSize::new(binding_size),
                }),
            }],
        });
        let id = self.alloc_id();
        self.resources.bind_groups.insert(id, bind_group);
        Ok(BindGroupId(id))
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupId) {
        self.resources.bind_groups.remove(&bind_group.0);
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDesc,
    ) -> Result<PipelineId, GpuError> {
        let module = self
            .resources
            .shader_modules
            .get(&desc.shader.0)
            .ok_or(GpuError::UnknownShaderModule(desc.shader.0))?;
        let vertex_buffers: Vec<wgpu::VertexBufferLayout<'_>> = desc
            .vertex_buffers
            .iter()
            .map(|layout| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &layout.attributes,
            })
            .collect();

        self.begin_validation_scope();
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: desc.vertex_entry,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &vertex_buffers,
                },
                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    ..Default::default()
                },
                depth_stencil: desc.depth_stencil.clone(),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: desc.fragment_entry,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target.format(),
                        blend: desc.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            });
        self.end_validation_scope()?;

        let id = self.alloc_id();
        self.resources.pipelines.insert(id, pipeline);
        Ok(PipelineId(id))
    }

    fn submit(&mut self, label: &'static str, cmds: &[GpuCmd]) -> Result<(), GpuError> {
        if cmds.is_empty() {
            return Ok(());
        }
        if cmds
            .iter()
            .any(|cmd| matches!(cmd, GpuCmd::BeginRenderPass(_)))
        {
            self.acquire_frame()?;
        }

        self.begin_validation_scope();
        let encoded = {
            let resources = Resources {
                tables: &self.resources,
                back_buffer: self.target.view(),
            };
            Encoder::new(&self.device, &resources).encode(label, cmds)
        };
        let summary = match encoded {
            Ok((command_buffer, summary)) => {
                self.queue.submit([command_buffer]);
                summary
            }
            Err(err) => {
                self.end_validation_scope()?;
                return Err(err.into());
            }
        };
        self.end_validation_scope()?;

        tracing::trace!(
            label,
            passes = summary.render_passes,
            draws = summary.draws,
            copies = summary.copies,
            "dx8-gpu submitted command stream"
        );
        Ok(())
    }

    fn present(&mut self) -> Result<(), GpuError> {
        match &mut self.target {
            RenderTarget::Surface { frame, .. } => {
                if let Some((texture, view)) = frame.take() {
                    drop(view);
                    texture.present();
                }
            }
            RenderTarget::Headless { .. } => {
                self.device.poll(wgpu::Maintain::Poll);
            }
        }
        Ok(())
    }
}
