//! The device context: turns immediate-mode state changes into pipelines, uniform slots and a
//! recorded command stream.
//!
//! Setters only touch in-memory state and raise `pipeline_dirty` / `uniform_dirty`. A draw
//! resolves both (building a pipeline through the cache, appending a uniform snapshot to the
//! arena) before recording itself into the open render pass. Texture copies go to a separate
//! stream that is always submitted ahead of the render stream.

use std::sync::mpsc::{channel, Receiver};

use bitflags::bitflags;
use dx8_gpu::{
    BindGroupId, BufferDesc, BufferId, Color, DepthAttachment, GpuBackend, GpuCmd, IndexFormat,
    LoadOp, PipelineId, RenderPassDesc, ShaderModuleId, TextureCopy, TextureDesc, TextureId,
    Viewport,
};
use tracing::{debug, trace};

use crate::caps::Caps;
use crate::config::DeviceConfig;
use crate::d3d8;
use crate::error::{D3dError, D3dResult};
use crate::format::D3dFormat;
use crate::fvf::{Fvf, VertexFormatDescriptor};
use crate::pipeline::{
    pipeline_desc, PipelineCache, CONSTANT_SLOT, CONSTANT_VERTEX_DATA, FIXED_FUNCTION_WGSL,
    STREAM_SLOT, TEXTURE_GROUP_BASE, UNIFORM_GROUP,
};
use crate::resources::{
    buffer_index_format, full_level_count, padded_len, IndexBuffer, Point, Rect, Release,
    ReleaseQueue, Surface, Texture, VertexBuffer,
};
use crate::state::{
    d3d8_blend_factor, d3d8_compare_func, BlendFactor, PipelineState, DEPTH_FORMAT, MAX_Z_BIAS,
};
use crate::uniform_arena::UniformArena;
use crate::uniforms::{
    argb_to_rgba, transform_slot, Light, LightUniforms, Material, MaterialUniforms, Matrix,
    UniformState, MAX_LIGHTS, MAX_TEXTURE_STAGES,
};

bitflags! {
    /// `D3DCLEAR_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const TARGET = 0x1;
        const ZBUFFER = 0x2;
        const STENCIL = 0x4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    Idle,
    /// A render pass is open on the render stream.
    SceneOpen,
    /// The uniform arena ran out mid-scene and the pass is being resubmitted.
    Flushing,
}

/// `D3DVIEWPORT8`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct D3dViewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

/// `D3DDISPLAYMODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub format: D3dFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    pub texture: TextureId,
    pub bind_group: BindGroupId,
}

/// Everything bound into the current pass. A new pass starts empty, so this is replayed after
/// every pass boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    pub pipeline: Option<PipelineId>,
    pub vertex_buffer: Option<BufferId>,
    pub index_buffer: Option<(BufferId, IndexFormat)>,
    pub base_vertex: u32,
    pub textures: [Option<TextureBinding>; MAX_TEXTURE_STAGES],
    pub viewport: Option<Viewport>,
    pub uniform_offset: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub pipelines_built: u64,
    pub pipeline_cache_hits: u64,
    pub uniform_writes: u64,
    pub forced_flushes: u64,
    pub draws: u64,
    pub submissions: u64,
}

const STAGE_STATE_COUNT: usize = d3d8::D3DTSS_MAX as usize;

fn default_render_states() -> [u32; d3d8::D3DRS_MAX as usize] {
    let mut states = [0; d3d8::D3DRS_MAX as usize];
    for (state, value) in [
        (d3d8::D3DRS_ZENABLE, d3d8::D3DZB_TRUE),
        (d3d8::D3DRS_FILLMODE, d3d8::D3DFILL_SOLID),
        (d3d8::D3DRS_SHADEMODE, d3d8::D3DSHADE_GOURAUD),
        (d3d8::D3DRS_ZWRITEENABLE, 1),
        (d3d8::D3DRS_SRCBLEND, d3d8::D3DBLEND_ONE),
        (d3d8::D3DRS_DESTBLEND, d3d8::D3DBLEND_ZERO),
        (d3d8::D3DRS_CULLMODE, d3d8::D3DCULL_CCW),
        (d3d8::D3DRS_ZFUNC, d3d8::D3DCMP_LESSEQUAL),
        (d3d8::D3DRS_ALPHAFUNC, d3d8::D3DCMP_ALWAYS),
        (d3d8::D3DRS_TEXTUREFACTOR, 0xffff_ffff),
        (d3d8::D3DRS_LIGHTING, 1),
        (d3d8::D3DRS_COLORVERTEX, 1),
        (d3d8::D3DRS_DIFFUSEMATERIALSOURCE, d3d8::D3DMCS_COLOR1),
        (d3d8::D3DRS_SPECULARMATERIALSOURCE, d3d8::D3DMCS_COLOR2),
        (d3d8::D3DRS_AMBIENTMATERIALSOURCE, d3d8::D3DMCS_MATERIAL),
        (d3d8::D3DRS_EMISSIVEMATERIALSOURCE, d3d8::D3DMCS_MATERIAL),
        (d3d8::D3DRS_BLENDOP, d3d8::D3DBLENDOP_ADD),
    ] {
        states[state as usize] = value;
    }
    states
}

fn default_stage_states(uniforms: &UniformState) -> [[u32; STAGE_STATE_COUNT]; MAX_TEXTURE_STAGES] {
    let mut states = [[0; STAGE_STATE_COUNT]; MAX_TEXTURE_STAGES];
    for (table, stage) in states.iter_mut().zip(&uniforms.stages) {
        for (ty, value) in [
            (d3d8::D3DTSS_COLOROP, stage.color_op),
            (d3d8::D3DTSS_COLORARG1, stage.color_arg1),
            (d3d8::D3DTSS_COLORARG2, stage.color_arg2),
            (d3d8::D3DTSS_ALPHAOP, stage.alpha_op),
            (d3d8::D3DTSS_ALPHAARG1, stage.alpha_arg1),
            (d3d8::D3DTSS_ALPHAARG2, stage.alpha_arg2),
            (d3d8::D3DTSS_TEXCOORDINDEX, stage.texcoord_index),
            (d3d8::D3DTSS_TEXTURETRANSFORMFLAGS, stage.transform_flags),
            (d3d8::D3DTSS_ADDRESSU, d3d8::D3DTADDRESS_WRAP),
            (d3d8::D3DTSS_ADDRESSV, d3d8::D3DTADDRESS_WRAP),
            (d3d8::D3DTSS_MAGFILTER, d3d8::D3DTEXF_POINT),
            (d3d8::D3DTSS_MINFILTER, d3d8::D3DTEXF_POINT),
        ] {
            table[ty as usize] = value;
        }
    }
    states
}

fn material_source(value: u32) -> D3dResult<u32> {
    if value > d3d8::D3DMCS_COLOR2 {
        return Err(D3dError::InvalidCall("invalid material source"));
    }
    Ok(value)
}

fn clamp_viewport(viewport: D3dViewport, target_width: u32, target_height: u32) -> D3dViewport {
    let min_z = viewport.min_z.clamp(0.0, 1.0);
    let max_z = viewport.max_z.clamp(min_z, 1.0);
    let x = viewport.x.min(target_width);
    let y = viewport.y.min(target_height);
    let width = viewport.width.min(target_width - x);
    let height = viewport.height.min(target_height - y);
    if width == 0 || height == 0 {
        return D3dViewport {
            x: 0,
            y: 0,
            width: target_width,
            height: target_height,
            min_z,
            max_z,
        };
    }
    D3dViewport {
        x,
        y,
        width,
        height,
        min_z,
        max_z,
    }
}

/// Copy granularity of a surface format: pixels per unit along each axis and bytes per unit.
fn copy_unit(format: D3dFormat) -> (u32, usize) {
    match format.block_bytes() {
        Some(block_bytes) => (4, block_bytes as usize),
        None => (1, (format.bits_per_pixel() / 8) as usize),
    }
}

pub struct Device<B: GpuBackend> {
    backend: B,
    scene: SceneState,
    render_cmds: Vec<GpuCmd>,
    copy_cmds: Vec<GpuCmd>,

    shader: ShaderModuleId,
    pipeline_state: PipelineState,
    pipeline_cache: PipelineCache,
    pipeline_dirty: bool,

    uniform_state: UniformState,
    uniform_dirty: bool,
    uniforms: UniformArena,

    render_states: [u32; d3d8::D3DRS_MAX as usize],
    stage_states: [[u32; STAGE_STATE_COUNT]; MAX_TEXTURE_STAGES],
    lights: [Light; MAX_LIGHTS],
    material: Material,
    viewport: D3dViewport,

    constant_vertices: BufferId,
    white_texture: TextureId,
    white_bind_group: BindGroupId,
    depth: TextureId,

    bindings: Bindings,
    releases_tx: ReleaseQueue,
    releases_rx: Receiver<Release>,
    stats: DeviceStats,
}

impl<B: GpuBackend> Device<B> {
    pub fn new(mut backend: B, config: &DeviceConfig) -> D3dResult<Self> {
        let caps = backend.capabilities();
        let (width, height) = caps.back_buffer_size;

        let shader = backend.create_shader_module("d3d8 fixed function", FIXED_FUNCTION_WGSL)?;
        let uniforms = UniformArena::new(&mut backend, config.uniform_slots)?;

        let constant_vertices = backend.create_buffer(&BufferDesc {
            label: "d3d8 constant vertex attributes",
            size: CONSTANT_VERTEX_DATA.len() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        })?;
        backend.write_buffer(constant_vertices, 0, &CONSTANT_VERTEX_DATA)?;

        let white_texture = backend.create_texture(&TextureDesc {
            label: "d3d8 default texture",
            width: 1,
            height: 1,
            mip_level_count: 1,
            format: wgpu::TextureFormat::Bgra8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        })?;
        backend.write_texture(white_texture, 0, &[0xff; 4])?;
        let white_bind_group = backend.create_texture_bind_group(white_texture)?;

        let depth = backend.create_texture(&TextureDesc {
            label: "d3d8 depth buffer",
            width,
            height,
            mip_level_count: 1,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        })?;

        let uniform_state = UniformState::default();
        let stage_states = default_stage_states(&uniform_state);
        let (releases_tx, releases_rx) = channel();

        debug!(
            width,
            height,
            uniform_slots = uniforms.capacity(),
            slot_size = uniforms.slot_size(),
            "created d3d8 device"
        );

        Ok(Self {
            backend,
            scene: SceneState::Idle,
            render_cmds: Vec::new(),
            copy_cmds: Vec::new(),
            shader,
            pipeline_state: PipelineState::default(),
            pipeline_cache: PipelineCache::new(),
            pipeline_dirty: true,
            uniform_state,
            uniform_dirty: true,
            uniforms,
            render_states: default_render_states(),
            stage_states,
            lights: [Light::default(); MAX_LIGHTS],
            material: Material::default(),
            viewport: D3dViewport {
                x: 0,
                y: 0,
                width,
                height,
                min_z: 0.0,
                max_z: 1.0,
            },
            constant_vertices,
            white_texture,
            white_bind_group,
            depth,
            bindings: Bindings::default(),
            releases_tx,
            releases_rx,
            stats: DeviceStats::default(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn scene_state(&self) -> SceneState {
        self.scene
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn pipeline_state(&self) -> &PipelineState {
        &self.pipeline_state
    }

    pub fn uniform_state(&self) -> &UniformState {
        &self.uniform_state
    }

    pub fn uniform_arena(&self) -> &UniformArena {
        &self.uniforms
    }

    pub fn stats(&self) -> DeviceStats {
        let cache = self.pipeline_cache.stats();
        DeviceStats {
            pipelines_built: cache.entries as u64,
            pipeline_cache_hits: cache.hits,
            ..self.stats
        }
    }

    fn pass_open(&self) -> bool {
        matches!(self.scene, SceneState::SceneOpen | SceneState::Flushing)
    }

    // Scene control

    pub fn begin_scene(&mut self) -> D3dResult<()> {
        if self.scene != SceneState::Idle {
            return Err(D3dError::InvalidCall("scene already open"));
        }
        self.submit_pending()?;
        self.drain_releases();

        self.bindings.uniform_offset = None;
        self.uniform_dirty = true;
        self.open_pass(LoadOp::Load, LoadOp::Load);
        self.scene = SceneState::SceneOpen;
        Ok(())
    }

    pub fn end_scene(&mut self) -> D3dResult<()> {
        if self.scene != SceneState::SceneOpen {
            return Err(D3dError::InvalidCall("no scene is open"));
        }
        self.render_cmds.push(GpuCmd::EndRenderPass);
        self.scene = SceneState::Idle;
        let submitted = self.submit_pending();

        self.uniforms.reset();
        self.uniform_dirty = true;
        self.bindings.uniform_offset = None;
        self.drain_releases();
        submitted
    }

    /// Clears the whole color and/or depth target. Sub-rectangle clears are not supported.
    pub fn clear(
        &mut self,
        rects: &[Rect],
        flags: ClearFlags,
        color: u32,
        z: f32,
        _stencil: u32,
    ) -> D3dResult<()> {
        if !rects.is_empty() {
            return Err(D3dError::InvalidCall("clear rectangles are not supported"));
        }
        let color_load = if flags.contains(ClearFlags::TARGET) {
            LoadOp::Clear(Color::from_argb(color))
        } else {
            LoadOp::Load
        };
        let depth_load = if flags.contains(ClearFlags::ZBUFFER) {
            LoadOp::Clear(z.clamp(0.0, 1.0))
        } else {
            LoadOp::Load
        };
        if color_load == LoadOp::Load && depth_load == LoadOp::Load {
            return Ok(());
        }

        if self.pass_open() {
            // Load ops are per pass, so a clear mid-scene restarts the pass.
            self.render_cmds.push(GpuCmd::EndRenderPass);
            self.open_pass(color_load, depth_load);
            return Ok(());
        }

        self.submit_pending()?;
        let cmds = [
            GpuCmd::BeginRenderPass(self.pass_desc(color_load, depth_load)),
            GpuCmd::EndRenderPass,
        ];
        self.backend.submit("d3d8 clear", &cmds)?;
        self.stats.submissions += 1;
        Ok(())
    }

    pub fn present(&mut self) -> D3dResult<()> {
        if self.scene != SceneState::Idle {
            return Err(D3dError::InvalidCall("present inside a scene"));
        }
        self.submit_pending()?;
        self.backend.present()?;
        self.drain_releases();
        Ok(())
    }

    fn pass_desc(&self, color_load: LoadOp<Color>, depth_load: LoadOp<f32>) -> RenderPassDesc {
        RenderPassDesc {
            color_load,
            depth: Some(DepthAttachment {
                texture: self.depth,
                load: depth_load,
            }),
        }
    }

    fn open_pass(&mut self, color_load: LoadOp<Color>, depth_load: LoadOp<f32>) {
        let desc = self.pass_desc(color_load, depth_load);
        self.render_cmds.push(GpuCmd::BeginRenderPass(desc));
        self.replay_bindings();
    }

    fn replay_bindings(&mut self) {
        let bindings = &self.bindings;
        let cmds = &mut self.render_cmds;

        cmds.push(GpuCmd::SetVertexBuffer {
            slot: CONSTANT_SLOT,
            buffer: self.constant_vertices,
            offset: 0,
        });
        if let Some(pipeline) = bindings.pipeline {
            cmds.push(GpuCmd::SetPipeline(pipeline));
        }
        if let Some(buffer) = bindings.vertex_buffer {
            cmds.push(GpuCmd::SetVertexBuffer {
                slot: STREAM_SLOT,
                buffer,
                offset: 0,
            });
        }
        if let Some((buffer, format)) = bindings.index_buffer {
            cmds.push(GpuCmd::SetIndexBuffer {
                buffer,
                format,
                offset: 0,
            });
        }
        for (stage, texture) in bindings.textures.iter().enumerate() {
            cmds.push(GpuCmd::SetBindGroup {
                slot: TEXTURE_GROUP_BASE + stage as u32,
                bind_group: texture.map_or(self.white_bind_group, |t| t.bind_group),
                dynamic_offsets: Vec::new(),
            });
        }
        if let Some(viewport) = bindings.viewport {
            cmds.push(GpuCmd::SetViewport(viewport));
        }
        if let Some(offset) = bindings.uniform_offset {
            cmds.push(GpuCmd::SetBindGroup {
                slot: UNIFORM_GROUP,
                bind_group: self.uniforms.bind_group(),
                dynamic_offsets: vec![offset],
            });
        }
    }

    /// Submits the copy stream, then the render stream.
    fn submit_pending(&mut self) -> D3dResult<()> {
        let copies = std::mem::take(&mut self.copy_cmds);
        let render = std::mem::take(&mut self.render_cmds);
        if !copies.is_empty() {
            self.backend.submit("d3d8 copies", &copies)?;
            self.stats.submissions += 1;
        }
        if !render.is_empty() {
            self.backend.submit("d3d8 scene", &render)?;
            self.stats.submissions += 1;
        }
        Ok(())
    }

    /// Destroys dropped resources. Only called right after a submission, once nothing recorded
    /// can still reference them.
    fn drain_releases(&mut self) {
        while let Ok(item) = self.releases_rx.try_recv() {
            match item {
                Release::Buffer(id) => {
                    if self.bindings.vertex_buffer == Some(id) {
                        self.bindings.vertex_buffer = None;
                    }
                    if matches!(self.bindings.index_buffer, Some((buffer, _)) if buffer == id) {
                        self.bindings.index_buffer = None;
                    }
                    self.backend.destroy_buffer(id);
                }
                Release::Texture(id) => {
                    for slot in &mut self.bindings.textures {
                        if matches!(slot, Some(binding) if binding.texture == id) {
                            *slot = None;
                        }
                    }
                    self.backend.destroy_texture(id);
                }
                Release::BindGroup(id) => self.backend.destroy_bind_group(id),
            }
        }
    }

    /// Submits everything recorded so far and continues the scene in a fresh pass.
    fn flush_and_rebind(&mut self) -> D3dResult<()> {
        debug!(
            capacity = self.uniforms.capacity(),
            draws = self.stats.draws,
            "uniform arena full, flushing scene"
        );
        self.scene = SceneState::Flushing;
        self.render_cmds.push(GpuCmd::EndRenderPass);
        if let Err(err) = self.submit_pending() {
            self.scene = SceneState::Idle;
            return Err(err);
        }
        self.uniforms.reset();
        self.stats.forced_flushes += 1;
        self.drain_releases();

        self.bindings.uniform_offset = None;
        self.open_pass(LoadOp::Load, LoadOp::Load);
        self.scene = SceneState::SceneOpen;
        Ok(())
    }

    fn resolve_uniforms(&mut self) -> D3dResult<()> {
        if !self.uniform_dirty {
            return Ok(());
        }
        if self.uniforms.is_full() {
            self.flush_and_rebind()?;
        }
        let offset = self
            .uniforms
            .push(&mut self.backend, &self.uniform_state)?
            .ok_or(D3dError::InvalidCall("uniform arena has no capacity"))?;
        self.render_cmds.push(GpuCmd::SetBindGroup {
            slot: UNIFORM_GROUP,
            bind_group: self.uniforms.bind_group(),
            dynamic_offsets: vec![offset],
        });
        self.bindings.uniform_offset = Some(offset);
        self.uniform_dirty = false;
        self.stats.uniform_writes += 1;
        Ok(())
    }

    fn resolve_pipeline(&mut self) -> D3dResult<()> {
        if !self.pipeline_dirty {
            return Ok(());
        }
        let shader = self.shader;
        let backend = &mut self.backend;
        let pipeline = self
            .pipeline_cache
            .get_or_create(&self.pipeline_state, |state| {
                backend.create_render_pipeline(&pipeline_desc(state, shader))
            })?;
        if self.bindings.pipeline != Some(pipeline) {
            self.render_cmds.push(GpuCmd::SetPipeline(pipeline));
            self.bindings.pipeline = Some(pipeline);
        }
        self.pipeline_dirty = false;
        Ok(())
    }

    pub fn draw_indexed_primitive(
        &mut self,
        primitive_type: u32,
        min_vertex: u32,
        vertex_count: u32,
        first_index: u32,
        primitive_count: u32,
    ) -> D3dResult<()> {
        if !self.pass_open() {
            return Err(D3dError::InvalidCall("draw outside a scene"));
        }
        if primitive_type != d3d8::D3DPT_TRIANGLELIST {
            return Err(D3dError::InvalidCall("only triangle lists are supported"));
        }
        let index_count = primitive_count
            .checked_mul(3)
            .ok_or(D3dError::InvalidCall("primitive count overflows the index count"))?;
        let base_vertex = i32::try_from(self.bindings.base_vertex)
            .map_err(|_| D3dError::InvalidCall("base vertex index out of range"))?;
        self.resolve_uniforms()?;
        self.resolve_pipeline()?;

        trace!(
            first_index,
            index_count,
            base_vertex,
            min_vertex,
            vertex_count,
            "draw_indexed_primitive"
        );
        self.render_cmds
            .push(GpuCmd::draw_indexed(first_index, index_count, base_vertex));
        self.stats.draws += 1;
        Ok(())
    }

    // State setters

    fn update_pipeline(&mut self, state: PipelineState) {
        if state != self.pipeline_state {
            self.pipeline_state = state;
            self.pipeline_dirty = true;
        }
    }

    fn update_uniforms(&mut self, update: impl FnOnce(&mut UniformState)) {
        let mut next = self.uniform_state;
        update(&mut next);
        if next != self.uniform_state {
            self.uniform_state = next;
            self.uniform_dirty = true;
        }
    }

    pub fn set_render_state(&mut self, state: u32, value: u32) -> D3dResult<()> {
        if state >= d3d8::D3DRS_MAX {
            return Err(D3dError::InvalidCall("render state out of range"));
        }
        let blend = |value| d3d8_blend_factor(value).ok_or(D3dError::InvalidCall("invalid blend"));
        let compare =
            |value| d3d8_compare_func(value).ok_or(D3dError::InvalidCall("invalid compare func"));

        let mut pipeline = self.pipeline_state;
        let mut render = self.uniform_state.render;
        match state {
            d3d8::D3DRS_ZWRITEENABLE => pipeline.z_write_enable = value != 0,
            d3d8::D3DRS_ZFUNC => pipeline.z_func = compare(value)?,
            d3d8::D3DRS_ZBIAS => pipeline.z_bias = value.min(MAX_Z_BIAS),
            d3d8::D3DRS_ALPHABLENDENABLE => pipeline.alpha_blend_enable = value != 0,
            d3d8::D3DRS_SRCBLEND => match value {
                d3d8::D3DBLEND_BOTHSRCALPHA => {
                    pipeline.src_blend = BlendFactor::SrcAlpha;
                    pipeline.dst_blend = BlendFactor::InvSrcAlpha;
                }
                d3d8::D3DBLEND_BOTHINVSRCALPHA => {
                    pipeline.src_blend = BlendFactor::InvSrcAlpha;
                    pipeline.dst_blend = BlendFactor::SrcAlpha;
                }
                _ => pipeline.src_blend = blend(value)?,
            },
            d3d8::D3DRS_DESTBLEND => pipeline.dst_blend = blend(value)?,
            d3d8::D3DRS_ALPHATESTENABLE => render.alpha_test_enable = u32::from(value != 0),
            d3d8::D3DRS_ALPHAREF => render.alpha_ref = (value & 0xff) as f32 / 255.0,
            d3d8::D3DRS_ALPHAFUNC => render.alpha_func = compare(value)?.raw(),
            d3d8::D3DRS_LIGHTING => render.lighting_enable = u32::from(value != 0),
            d3d8::D3DRS_AMBIENT => render.ambient = argb_to_rgba(value),
            d3d8::D3DRS_SPECULARENABLE => render.specular_enable = u32::from(value != 0),
            d3d8::D3DRS_TEXTUREFACTOR => render.texture_factor = argb_to_rgba(value),
            d3d8::D3DRS_COLORVERTEX => render.color_vertex = u32::from(value != 0),
            d3d8::D3DRS_DIFFUSEMATERIALSOURCE => render.diffuse_source = material_source(value)?,
            d3d8::D3DRS_SPECULARMATERIALSOURCE => {
                render.specular_source = material_source(value)?
            }
            d3d8::D3DRS_AMBIENTMATERIALSOURCE => render.ambient_source = material_source(value)?,
            d3d8::D3DRS_EMISSIVEMATERIALSOURCE => {
                render.emissive_source = material_source(value)?
            }
            _ => debug!(state, value, "render state has no fixed-function effect"),
        }

        self.render_states[state as usize] = value;
        self.update_pipeline(pipeline);
        self.update_uniforms(|uniforms| uniforms.render = render);
        Ok(())
    }

    pub fn render_state(&self, state: u32) -> D3dResult<u32> {
        self.render_states
            .get(state as usize)
            .copied()
            .ok_or(D3dError::InvalidCall("render state out of range"))
    }

    pub fn set_texture_stage_state(&mut self, stage: u32, ty: u32, value: u32) -> D3dResult<()> {
        let index = stage as usize;
        if index >= MAX_TEXTURE_STAGES || ty >= d3d8::D3DTSS_MAX {
            return Err(D3dError::InvalidCall("texture stage state out of range"));
        }
        let mut uniforms = self.uniform_state.stages[index];
        match ty {
            d3d8::D3DTSS_COLOROP => uniforms.color_op = value,
            d3d8::D3DTSS_COLORARG1 => uniforms.color_arg1 = value,
            d3d8::D3DTSS_COLORARG2 => uniforms.color_arg2 = value,
            d3d8::D3DTSS_ALPHAOP => uniforms.alpha_op = value,
            d3d8::D3DTSS_ALPHAARG1 => uniforms.alpha_arg1 = value,
            d3d8::D3DTSS_ALPHAARG2 => uniforms.alpha_arg2 = value,
            // The high word selects texgen modes, which are not supported.
            d3d8::D3DTSS_TEXCOORDINDEX => uniforms.texcoord_index = value & 0xffff,
            d3d8::D3DTSS_TEXTURETRANSFORMFLAGS => uniforms.transform_flags = value,
            _ => debug!(stage, ty, value, "texture stage state has no fixed-function effect"),
        }
        self.stage_states[index][ty as usize] = value;
        self.update_uniforms(|state| state.stages[index] = uniforms);
        Ok(())
    }

    pub fn texture_stage_state(&self, stage: u32, ty: u32) -> D3dResult<u32> {
        self.stage_states
            .get(stage as usize)
            .and_then(|states| states.get(ty as usize))
            .copied()
            .ok_or(D3dError::InvalidCall("texture stage state out of range"))
    }

    pub fn set_transform(&mut self, state: u32, matrix: &Matrix) -> D3dResult<()> {
        let slot = transform_slot(state).ok_or(D3dError::InvalidCall("invalid transform"))?;
        self.update_uniforms(|uniforms| uniforms.transforms[slot] = *matrix);
        Ok(())
    }

    pub fn get_transform(&self, state: u32) -> D3dResult<Matrix> {
        let slot = transform_slot(state).ok_or(D3dError::InvalidCall("invalid transform"))?;
        Ok(self.uniform_state.transforms[slot])
    }

    pub fn set_material(&mut self, material: &Material) {
        self.material = *material;
        self.update_uniforms(|uniforms| uniforms.material = MaterialUniforms::from(material));
    }

    pub fn get_material(&self) -> Material {
        self.material
    }

    fn light_index(index: u32) -> D3dResult<usize> {
        let index = index as usize;
        if index >= MAX_LIGHTS {
            return Err(D3dError::InvalidCall("light index out of range"));
        }
        Ok(index)
    }

    pub fn set_light(&mut self, index: u32, light: &Light) -> D3dResult<()> {
        let index = Self::light_index(index)?;
        self.lights[index] = *light;
        self.update_uniforms(|uniforms| uniforms.lights[index] = LightUniforms::from(light));
        Ok(())
    }

    pub fn get_light(&self, index: u32) -> D3dResult<Light> {
        Ok(self.lights[Self::light_index(index)?])
    }

    pub fn light_enable(&mut self, index: u32, enable: bool) -> D3dResult<()> {
        let bit = 1 << Self::light_index(index)?;
        self.update_uniforms(|uniforms| {
            if enable {
                uniforms.light_enable_bits |= bit;
            } else {
                uniforms.light_enable_bits &= !bit;
            }
        });
        Ok(())
    }

    pub fn light_enabled(&self, index: u32) -> D3dResult<bool> {
        let bit = 1 << Self::light_index(index)?;
        Ok(self.uniform_state.light_enable_bits & bit != 0)
    }

    // Bindings

    /// Binds `texture` (or the default white texture) to `stage`, immediately if a pass is open.
    pub fn set_texture(&mut self, stage: u32, texture: Option<&Texture>) -> D3dResult<()> {
        let index = stage as usize;
        if index >= MAX_TEXTURE_STAGES {
            return Err(D3dError::InvalidCall("texture stage out of range"));
        }
        let binding = texture.map(|t| TextureBinding {
            texture: t.id(),
            bind_group: t.bind_group(),
        });
        self.bindings.textures[index] = binding;
        if self.pass_open() {
            self.render_cmds.push(GpuCmd::SetBindGroup {
                slot: TEXTURE_GROUP_BASE + stage,
                bind_group: binding.map_or(self.white_bind_group, |b| b.bind_group),
                dynamic_offsets: Vec::new(),
            });
        }
        Ok(())
    }

    /// Binds stream 0. The pipeline always reads vertices with the stride of the current FVF;
    /// a different `stride` is only reported.
    pub fn set_stream_source(
        &mut self,
        stream: u32,
        buffer: Option<&VertexBuffer>,
        stride: u32,
    ) -> D3dResult<()> {
        if stream != 0 {
            return Err(D3dError::InvalidCall("only stream 0 is supported"));
        }
        if buffer.is_some() {
            let fvf_stride = VertexFormatDescriptor::new(self.pipeline_state.fvf).stride;
            if u64::from(stride) != fvf_stride {
                debug!(stride, fvf_stride, "stream stride differs from the FVF stride");
            }
        }
        self.bindings.vertex_buffer = buffer.map(VertexBuffer::id);
        if let (true, Some(buffer)) = (self.pass_open(), self.bindings.vertex_buffer) {
            self.render_cmds.push(GpuCmd::SetVertexBuffer {
                slot: STREAM_SLOT,
                buffer,
                offset: 0,
            });
        }
        Ok(())
    }

    pub fn set_indices(&mut self, buffer: Option<&IndexBuffer>, base_vertex: u32) -> D3dResult<()> {
        self.bindings.index_buffer = buffer.map(|ib| (ib.id(), ib.index_format()));
        self.bindings.base_vertex = base_vertex;
        if let (true, Some((buffer, format))) = (self.pass_open(), self.bindings.index_buffer) {
            self.render_cmds.push(GpuCmd::SetIndexBuffer {
                buffer,
                format,
                offset: 0,
            });
        }
        Ok(())
    }

    /// Selects the FVF used by subsequent draws. Programmable shader handles are not supported.
    pub fn set_vertex_shader(&mut self, fvf: u32) -> D3dResult<()> {
        let state = PipelineState {
            fvf: Fvf::from_raw(fvf),
            ..self.pipeline_state
        };
        self.update_pipeline(state);
        Ok(())
    }

    pub fn vertex_shader(&self) -> u32 {
        self.pipeline_state.fvf.bits()
    }

    pub fn set_viewport(&mut self, viewport: &D3dViewport) -> D3dResult<()> {
        let (width, height) = self.backend.capabilities().back_buffer_size;
        let clamped = clamp_viewport(*viewport, width, height);
        let recorded = Viewport {
            x: clamped.x as f32,
            y: clamped.y as f32,
            width: clamped.width as f32,
            height: clamped.height as f32,
            min_depth: clamped.min_z,
            max_depth: clamped.max_z,
        };
        self.viewport = clamped;
        self.bindings.viewport = Some(recorded);
        if self.pass_open() {
            self.render_cmds.push(GpuCmd::SetViewport(recorded));
        }
        Ok(())
    }

    pub fn viewport(&self) -> D3dViewport {
        self.viewport
    }

    // Copies

    /// Copies one rectangle (the whole source level when `src_rects` is empty) from `src` to
    /// `dst` at the first point of `dst_points` (the origin when empty).
    ///
    /// # Panics
    ///
    /// When more than one source rectangle is passed.
    pub fn copy_rects(
        &mut self,
        src: &Surface,
        src_rects: &[Rect],
        dst: &mut Surface,
        dst_points: &[Point],
    ) -> D3dResult<()> {
        assert!(
            src_rects.len() <= 1,
            "copy_rects supports at most one source rectangle"
        );
        if src.format() != dst.format() {
            return Err(D3dError::InvalidCall("copy between different formats"));
        }
        let rect = src_rects
            .first()
            .copied()
            .unwrap_or(Rect::new(0, 0, src.width(), src.height()));
        let point = dst_points.first().copied().unwrap_or_default();
        if !rect.fits(src.width(), src.height()) {
            return Err(D3dError::InvalidCall("source rectangle exceeds the surface"));
        }
        if rect.is_empty() {
            return Ok(());
        }
        let dst_rect = Rect::new(
            point.x,
            point.y,
            point.x.saturating_add(rect.width()),
            point.y.saturating_add(rect.height()),
        );
        if !dst_rect.fits(dst.width(), dst.height()) {
            return Err(D3dError::InvalidCall("destination exceeds the surface"));
        }

        let (unit, unit_bytes) = copy_unit(src.format());
        // Block-compressed copies move whole blocks; a partial block is only allowed where the
        // copy reaches the edge of both levels.
        let extent = |len: u32, src_end: u32, src_size: u32, dst_end: u32, dst_size: u32| {
            if len % unit == 0 {
                Some(len)
            } else if src_end == src_size && dst_end == dst_size {
                Some(len.div_ceil(unit) * unit)
            } else {
                None
            }
        };
        let aligned = [rect.left, rect.top, point.x, point.y]
            .iter()
            .all(|v| v % unit == 0);
        let width = extent(rect.width(), rect.right, src.width(), dst_rect.right, dst.width());
        let height = extent(
            rect.height(),
            rect.bottom,
            src.height(),
            dst_rect.bottom,
            dst.height(),
        );
        let (Some(width), Some(height), true) = (width, height, aligned) else {
            return Err(D3dError::InvalidCall("copy is not block aligned"));
        };

        self.copy_cmds.push(GpuCmd::CopyTextureToTexture(TextureCopy {
            src: src.texture_id(),
            src_level: src.level(),
            src_origin: [rect.left, rect.top],
            dst: dst.texture_id(),
            dst_level: dst.level(),
            dst_origin: [point.x, point.y],
            width,
            height,
        }));

        // Mirror the copy into the staging copy so a later lock sees it.
        let row_bytes = |surface_width: u32| surface_width.div_ceil(unit) as usize * unit_bytes;
        let (src_pitch, dst_pitch) = (row_bytes(src.width()), row_bytes(dst.width()));
        let span = rect.width().div_ceil(unit) as usize * unit_bytes;
        let rows = rect.height().div_ceil(unit) as usize;
        let (src_x, src_y) = ((rect.left / unit) as usize, (rect.top / unit) as usize);
        let (dst_x, dst_y) = ((point.x / unit) as usize, (point.y / unit) as usize);
        let src_bytes = src.staging();
        let dst_bytes = dst.staging_mut();
        for row in 0..rows {
            let from = (src_y + row) * src_pitch + src_x * unit_bytes;
            let to = (dst_y + row) * dst_pitch + dst_x * unit_bytes;
            if let (Some(from), Some(to)) = (
                src_bytes.get(from..from + span),
                dst_bytes.get_mut(to..to + span),
            ) {
                to.copy_from_slice(from);
            }
        }
        Ok(())
    }

    // Resource creation

    pub fn create_vertex_buffer(
        &mut self,
        length: u32,
        usage: u32,
        fvf: u32,
        pool: u32,
    ) -> D3dResult<VertexBuffer> {
        if length == 0 {
            return Err(D3dError::InvalidCall("zero-length vertex buffer"));
        }
        let id = self.backend.create_buffer(&BufferDesc {
            label: "d3d8 vertex buffer",
            size: padded_len(length),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        })?;
        Ok(VertexBuffer::new(
            id,
            length,
            usage,
            Fvf::from_raw(fvf),
            pool,
            self.releases_tx.clone(),
        ))
    }

    pub fn create_index_buffer(
        &mut self,
        length: u32,
        usage: u32,
        format: u32,
        pool: u32,
    ) -> D3dResult<IndexBuffer> {
        let format = D3dFormat::from_raw(format)
            .filter(|&f| buffer_index_format(f).is_some())
            .ok_or(D3dError::InvalidCall("unsupported index format"))?;
        if length == 0 {
            return Err(D3dError::InvalidCall("zero-length index buffer"));
        }
        let id = self.backend.create_buffer(&BufferDesc {
            label: "d3d8 index buffer",
            size: padded_len(length),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        })?;
        Ok(IndexBuffer::new(
            id,
            length,
            usage,
            format,
            pool,
            self.releases_tx.clone(),
        ))
    }

    /// Validates a texture format and size, returning the decoded format and its backend format.
    fn check_texture(
        &self,
        width: u32,
        height: u32,
        raw_format: u32,
    ) -> D3dResult<(D3dFormat, wgpu::TextureFormat)> {
        let format = D3dFormat::from_raw(raw_format)
            .filter(|f| f.bits_per_pixel() != 0)
            .ok_or(D3dError::InvalidCall("unknown pixel format"))?;
        let texture_format = format
            .texture_format()
            .ok_or(D3dError::WrongTextureFormat(raw_format))?;

        let caps = self.backend.capabilities();
        if width == 0 || height == 0 || width.max(height) > caps.max_texture_dimension_2d {
            return Err(D3dError::InvalidCall("invalid texture size"));
        }
        if format.image_byte_len(width, height).is_none() {
            return Err(D3dError::InvalidCall("texture is too large"));
        }
        if format.is_compressed() {
            if !caps.texture_compression_bc {
                return Err(D3dError::WrongTextureFormat(raw_format));
            }
            if width % 4 != 0 || height % 4 != 0 {
                return Err(D3dError::InvalidCall(
                    "compressed textures must be a multiple of 4 pixels",
                ));
            }
        }
        Ok((format, texture_format))
    }

    /// `levels == 0` requests the full mip chain.
    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        levels: u32,
        usage: u32,
        format: u32,
        pool: u32,
    ) -> D3dResult<Texture> {
        let (format, texture_format) = self.check_texture(width, height, format)?;
        let full = full_level_count(width, height);
        let level_count = if levels == 0 { full } else { levels.min(full) };

        let id = self.backend.create_texture(&TextureDesc {
            label: "d3d8 texture",
            width,
            height,
            mip_level_count: level_count,
            format: texture_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
        })?;
        let bind_group = match self.backend.create_texture_bind_group(id) {
            Ok(bind_group) => bind_group,
            Err(err) => {
                self.backend.destroy_texture(id);
                return Err(err.into());
            }
        };
        let texture = Texture::new(
            id,
            bind_group,
            width,
            height,
            level_count,
            format,
            usage,
            pool,
            self.releases_tx.clone(),
        );
        match &texture {
            Ok(_) => debug!(width, height, level_count, ?format, "created texture"),
            Err(_) => {
                self.backend.destroy_bind_group(bind_group);
                self.backend.destroy_texture(id);
            }
        }
        texture
    }

    pub fn create_image_surface(
        &mut self,
        width: u32,
        height: u32,
        format: u32,
    ) -> D3dResult<Surface> {
        let (format, texture_format) = self.check_texture(width, height, format)?;
        let id = self.backend.create_texture(&TextureDesc {
            label: "d3d8 image surface",
            width,
            height,
            mip_level_count: 1,
            format: texture_format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST,
        })?;
        let surface = Surface::standalone(id, format, width, height, self.releases_tx.clone());
        if surface.is_err() {
            self.backend.destroy_texture(id);
        }
        surface
    }

    // Queries

    pub fn caps(&self) -> Caps {
        Caps::for_backend(self.backend.capabilities().max_texture_dimension_2d)
    }

    pub fn display_mode(&self) -> DisplayMode {
        let (width, height) = self.backend.capabilities().back_buffer_size;
        DisplayMode {
            width,
            height,
            refresh_rate: 60,
            format: D3dFormat::A8R8G8B8,
        }
    }

    pub fn available_texture_mem(&self) -> u32 {
        0x0100_0000
    }

    pub fn test_cooperative_level(&self) -> D3dResult<()> {
        Ok(())
    }

    pub fn resource_manager_discard_bytes(&mut self, _bytes: u32) -> D3dResult<()> {
        Ok(())
    }

    /// Id of the 1x1 white texture bound to stages without a texture.
    pub fn default_texture(&self) -> TextureId {
        self.white_texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx8_gpu::RecordingBackend;
    use pretty_assertions::assert_eq;

    fn device() -> Device<RecordingBackend> {
        Device::new(RecordingBackend::new(800, 600), &DeviceConfig::default()).unwrap()
    }

    #[test]
    fn scene_calls_must_pair_up() {
        let mut dev = device();
        assert!(dev.end_scene().is_err());
        dev.begin_scene().unwrap();
        assert!(matches!(dev.begin_scene(), Err(D3dError::InvalidCall(_))));
        assert!(dev.present().is_err());
        dev.end_scene().unwrap();
        dev.present().unwrap();
        assert_eq!(dev.backend().presents, 1);
    }

    #[test]
    fn draws_outside_a_scene_or_of_other_topologies_fail() {
        let mut dev = device();
        assert!(dev
            .draw_indexed_primitive(d3d8::D3DPT_TRIANGLELIST, 0, 3, 0, 1)
            .is_err());
        dev.begin_scene().unwrap();
        assert!(dev
            .draw_indexed_primitive(d3d8::D3DPT_TRIANGLESTRIP, 0, 3, 0, 1)
            .is_err());
    }

    #[test]
    fn oversized_draw_arguments_are_rejected_without_recording() {
        let mut dev = device();
        dev.begin_scene().unwrap();
        let recorded = dev.render_cmds.len();
        assert!(matches!(
            dev.draw_indexed_primitive(d3d8::D3DPT_TRIANGLELIST, 0, 3, 0, u32::MAX / 2),
            Err(D3dError::InvalidCall(_))
        ));
        dev.set_indices(None, u32::MAX).unwrap();
        assert!(matches!(
            dev.draw_indexed_primitive(d3d8::D3DPT_TRIANGLELIST, 0, 3, 0, 1),
            Err(D3dError::InvalidCall(_))
        ));
        assert_eq!(dev.render_cmds.len(), recorded);
        assert_eq!(dev.stats().draws, 0);
    }

    #[test]
    fn z_bias_past_the_limit_shares_one_pipeline() {
        let mut dev = device();
        dev.set_vertex_shader(Fvf::XYZ.bits()).unwrap();
        dev.begin_scene().unwrap();
        dev.set_render_state(d3d8::D3DRS_ZBIAS, 17).unwrap();
        dev.draw_indexed_primitive(d3d8::D3DPT_TRIANGLELIST, 0, 3, 0, 1)
            .unwrap();
        dev.set_render_state(d3d8::D3DRS_ZBIAS, 40).unwrap();
        dev.draw_indexed_primitive(d3d8::D3DPT_TRIANGLELIST, 0, 3, 0, 1)
            .unwrap();
        dev.end_scene().unwrap();

        assert_eq!(dev.pipeline_state().z_bias, MAX_Z_BIAS);
        assert_eq!(dev.render_state(d3d8::D3DRS_ZBIAS).unwrap(), 40);
        assert_eq!(dev.stats().pipelines_built, 1);
    }

    #[test]
    fn vertex_stride_comes_from_the_fvf() {
        let mut dev = device();
        let fvf = (Fvf::XYZ | Fvf::DIFFUSE).bits();
        dev.set_vertex_shader(fvf).unwrap();
        let vb = dev
            .create_vertex_buffer(96, 0, fvf, d3d8::D3DPOOL_MANAGED)
            .unwrap();
        dev.set_stream_source(0, Some(&vb), 32).unwrap();
        dev.begin_scene().unwrap();
        dev.draw_indexed_primitive(d3d8::D3DPT_TRIANGLELIST, 0, 3, 0, 1)
            .unwrap();
        dev.end_scene().unwrap();

        let (_, desc) = dev.backend().pipelines.last().unwrap();
        assert_eq!(desc.vertex_buffers[STREAM_SLOT as usize].array_stride, 16);
    }

    #[test]
    fn both_src_alpha_sets_both_factors() {
        let mut dev = device();
        dev.set_render_state(d3d8::D3DRS_SRCBLEND, d3d8::D3DBLEND_BOTHSRCALPHA)
            .unwrap();
        assert_eq!(dev.pipeline_state().src_blend, BlendFactor::SrcAlpha);
        assert_eq!(dev.pipeline_state().dst_blend, BlendFactor::InvSrcAlpha);
        assert!(dev
            .set_render_state(d3d8::D3DRS_DESTBLEND, d3d8::D3DBLEND_BOTHSRCALPHA)
            .is_err());
    }

    #[test]
    fn render_state_values_reach_the_uniform_block() {
        let mut dev = device();
        dev.set_render_state(d3d8::D3DRS_ALPHAREF, 0x80).unwrap();
        dev.set_render_state(d3d8::D3DRS_AMBIENT, 0xff00_ff00).unwrap();
        let render = dev.uniform_state().render;
        assert_eq!(render.alpha_ref, 128.0 / 255.0);
        assert_eq!(render.ambient, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(dev.render_state(d3d8::D3DRS_AMBIENT).unwrap(), 0xff00_ff00);
        assert_eq!(
            dev.render_state(d3d8::D3DRS_ZFUNC).unwrap(),
            d3d8::D3DCMP_LESSEQUAL
        );
    }

    #[test]
    fn unknown_render_states_are_stored_only() {
        let mut dev = device();
        let before = (*dev.pipeline_state(), *dev.uniform_state());
        dev.set_render_state(d3d8::D3DRS_FOGENABLE, 1).unwrap();
        assert_eq!((*dev.pipeline_state(), *dev.uniform_state()), before);
        assert_eq!(dev.render_state(d3d8::D3DRS_FOGENABLE).unwrap(), 1);
        assert!(dev.set_render_state(d3d8::D3DRS_MAX, 0).is_err());
    }

    #[test]
    fn texture_stage_states_are_bounded() {
        let mut dev = device();
        dev.set_texture_stage_state(1, d3d8::D3DTSS_COLOROP, d3d8::D3DTOP_ADD)
            .unwrap();
        assert_eq!(dev.uniform_state().stages[1].color_op, d3d8::D3DTOP_ADD);
        assert!(dev
            .set_texture_stage_state(2, d3d8::D3DTSS_COLOROP, d3d8::D3DTOP_ADD)
            .is_err());
        assert!(dev
            .set_texture_stage_state(0, d3d8::D3DTSS_MAX, 0)
            .is_err());
        dev.set_texture_stage_state(0, d3d8::D3DTSS_MINFILTER, 2).unwrap();
        assert_eq!(
            dev.texture_stage_state(0, d3d8::D3DTSS_MINFILTER).unwrap(),
            2
        );
    }

    #[test]
    fn transforms_lights_and_material_round_trip() {
        let mut dev = device();
        let mut m = crate::uniforms::IDENTITY;
        m[3][0] = 5.0;
        dev.set_transform(d3d8::D3DTS_VIEW, &m).unwrap();
        assert_eq!(dev.get_transform(d3d8::D3DTS_VIEW).unwrap(), m);
        assert!(dev.set_transform(4, &m).is_err());

        let light = Light {
            range: 10.0,
            ..Light::default()
        };
        dev.set_light(3, &light).unwrap();
        assert_eq!(dev.get_light(3).unwrap(), light);
        assert!(dev.set_light(4, &light).is_err());
        dev.light_enable(2, true).unwrap();
        assert!(dev.light_enabled(2).unwrap());
        assert_eq!(dev.uniform_state().light_enable_bits, 0b100);

        let material = Material {
            power: 8.0,
            ..Material::default()
        };
        dev.set_material(&material);
        assert_eq!(dev.get_material(), material);
        assert_eq!(dev.uniform_state().material.power, 8.0);
    }

    #[test]
    fn viewport_is_clamped_to_the_back_buffer() {
        let mut dev = device();
        dev.set_viewport(&D3dViewport {
            x: 700,
            y: 0,
            width: 400,
            height: 600,
            min_z: 0.0,
            max_z: 2.0,
        })
        .unwrap();
        let vp = dev.viewport();
        assert_eq!((vp.x, vp.width, vp.max_z), (700, 100, 1.0));
    }

    #[test]
    fn clear_inside_a_scene_restarts_the_pass() {
        let mut dev = device();
        dev.begin_scene().unwrap();
        dev.clear(&[], ClearFlags::TARGET | ClearFlags::ZBUFFER, 0xff00_0000, 1.0, 0)
            .unwrap();
        assert!(dev.clear(&[Rect::new(0, 0, 1, 1)], ClearFlags::TARGET, 0, 1.0, 0).is_err());
        dev.end_scene().unwrap();

        let (_, cmds) = dev.backend().submissions.last().unwrap();
        let passes: Vec<&RenderPassDesc> = cmds
            .iter()
            .filter_map(|c| match c {
                GpuCmd::BeginRenderPass(desc) => Some(desc),
                _ => None,
            })
            .collect();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[1].color_load, LoadOp::Clear(Color::from_argb(0xff00_0000)));
        assert_eq!(passes[1].depth.unwrap().load, LoadOp::Clear(1.0));
    }

    #[test]
    fn clear_outside_a_scene_submits_immediately() {
        let mut dev = device();
        dev.clear(&[], ClearFlags::TARGET, 0, 1.0, 0).unwrap();
        assert_eq!(dev.backend().submissions.len(), 1);
        assert_eq!(dev.backend().submissions[0].0, "d3d8 clear");
    }

    #[test]
    fn creation_rejects_unknown_and_unsampleable_formats() {
        let mut dev = device();
        assert!(matches!(
            dev.create_texture(4, 4, 1, 0, 999, d3d8::D3DPOOL_MANAGED),
            Err(D3dError::InvalidCall(_))
        ));
        assert!(matches!(
            dev.create_texture(4, 4, 1, 0, D3dFormat::P8.raw(), d3d8::D3DPOOL_MANAGED),
            Err(D3dError::WrongTextureFormat(41))
        ));
        assert!(dev
            .create_texture(6, 4, 1, 0, D3dFormat::DXT1.raw(), d3d8::D3DPOOL_MANAGED)
            .is_err());
        assert!(dev
            .create_index_buffer(6, 0, D3dFormat::A8R8G8B8.raw(), d3d8::D3DPOOL_MANAGED)
            .is_err());
        assert!(dev
            .create_index_buffer(6, 0, D3dFormat::INDEX32.raw(), d3d8::D3DPOOL_MANAGED)
            .is_ok());
    }

    #[test]
    fn compressed_textures_need_backend_support() {
        let mut backend = RecordingBackend::new(64, 64);
        backend.capabilities.texture_compression_bc = false;
        let mut dev = Device::new(backend, &DeviceConfig::default()).unwrap();
        assert!(matches!(
            dev.create_texture(8, 8, 0, 0, D3dFormat::DXT5.raw(), d3d8::D3DPOOL_MANAGED),
            Err(D3dError::WrongTextureFormat(_))
        ));
    }

    #[test]
    fn large_textures_size_their_staging_without_overflow() {
        let mut backend = RecordingBackend::new(64, 64);
        backend.capabilities.max_texture_dimension_2d = 16384;
        let mut dev = Device::new(backend, &DeviceConfig::default()).unwrap();
        let tex = dev
            .create_texture(16384, 8192, 1, 0, D3dFormat::A8R8G8B8.raw(), d3d8::D3DPOOL_MANAGED)
            .unwrap();
        assert_eq!(tex.level_desc(0).unwrap().size, 16384 * 8192 * 4);
    }

    #[test]
    fn textures_past_the_surface_size_limit_are_rejected() {
        let mut backend = RecordingBackend::new(64, 64);
        backend.capabilities.max_texture_dimension_2d = 65536;
        let mut dev = Device::new(backend, &DeviceConfig::default()).unwrap();
        let textures = dev.backend().textures.len();
        assert!(matches!(
            dev.create_texture(65536, 65536, 1, 0, D3dFormat::A8R8G8B8.raw(), d3d8::D3DPOOL_MANAGED),
            Err(D3dError::InvalidCall(_))
        ));
        assert!(matches!(
            dev.create_image_surface(65536, 65536, D3dFormat::A8R8G8B8.raw()),
            Err(D3dError::InvalidCall(_))
        ));
        assert_eq!(dev.backend().textures.len(), textures);
    }

    #[test]
    fn copy_rects_checks_formats_and_bounds() {
        let mut dev = device();
        let src = dev
            .create_image_surface(8, 8, D3dFormat::A8R8G8B8.raw())
            .unwrap();
        let mut dst = dev
            .create_image_surface(4, 4, D3dFormat::A8R8G8B8.raw())
            .unwrap();
        let mut other = dev
            .create_image_surface(8, 8, D3dFormat::R5G6B5.raw())
            .unwrap();
        assert!(dev.copy_rects(&src, &[], &mut other, &[]).is_err());
        assert!(dev.copy_rects(&src, &[], &mut dst, &[]).is_err());
        dev.copy_rects(&src, &[Rect::new(4, 4, 8, 8)], &mut dst, &[])
            .unwrap();
    }

    #[test]
    #[should_panic(expected = "at most one source rectangle")]
    fn copy_rects_with_several_rects_is_fatal() {
        let mut dev = device();
        let src = dev
            .create_image_surface(8, 8, D3dFormat::A8R8G8B8.raw())
            .unwrap();
        let mut dst = dev
            .create_image_surface(8, 8, D3dFormat::A8R8G8B8.raw())
            .unwrap();
        let rect = Rect::new(0, 0, 1, 1);
        let _ = dev.copy_rects(&src, &[rect, rect], &mut dst, &[]);
    }
}
