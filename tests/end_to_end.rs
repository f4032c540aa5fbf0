use dx8_wgpu::d3d8::{
    d3d8, ClearFlags, D3dFormat, D3dViewport, Device, DeviceConfig, Fvf, LockFlags, Material,
};
use dx8_wgpu::gpu::{GpuCmd, IndexFormat, RecordingBackend};
use pretty_assertions::assert_eq;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    diffuse: u32,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn single_triangle_frame() {
    init_tracing();
    let mut dev = Device::new(RecordingBackend::new(800, 600), &DeviceConfig::default()).unwrap();

    let fvf = (Fvf::XYZ | Fvf::DIFFUSE).bits();
    let vertices = [
        Vertex {
            position: [0.0, 0.5, 0.5],
            diffuse: 0xffff_0000,
        },
        Vertex {
            position: [0.5, -0.5, 0.5],
            diffuse: 0xff00_ff00,
        },
        Vertex {
            position: [-0.5, -0.5, 0.5],
            diffuse: 0xff00_00ff,
        },
    ];
    let bytes = bytemuck::cast_slice::<Vertex, u8>(&vertices);
    let mut vb = dev
        .create_vertex_buffer(bytes.len() as u32, 0, fvf, d3d8::D3DPOOL_MANAGED)
        .unwrap();
    vb.lock(0, 0, LockFlags::empty()).unwrap().copy_from_slice(bytes);
    vb.unlock(&mut dev).unwrap();

    let mut ib = dev
        .create_index_buffer(6, 0, D3dFormat::INDEX16.raw(), d3d8::D3DPOOL_MANAGED)
        .unwrap();
    ib.lock(0, 0, LockFlags::empty())
        .unwrap()
        .copy_from_slice(bytemuck::cast_slice(&[0u16, 1, 2]));
    ib.unlock(&mut dev).unwrap();

    dev.set_render_state(d3d8::D3DRS_LIGHTING, 0).unwrap();
    dev.set_material(&Material::default());
    dev.set_viewport(&D3dViewport {
        x: 0,
        y: 0,
        width: 800,
        height: 600,
        min_z: 0.0,
        max_z: 1.0,
    })
    .unwrap();
    dev.set_vertex_shader(fvf).unwrap();
    dev.set_stream_source(0, Some(&vb), std::mem::size_of::<Vertex>() as u32)
        .unwrap();
    dev.set_indices(Some(&ib), 0).unwrap();

    dev.begin_scene().unwrap();
    dev.clear(&[], ClearFlags::TARGET | ClearFlags::ZBUFFER, 0xff00_0000, 1.0, 0)
        .unwrap();
    dev.draw_indexed_primitive(d3d8::D3DPT_TRIANGLELIST, 0, 3, 0, 1)
        .unwrap();
    dev.end_scene().unwrap();
    dev.present().unwrap();

    let stats = dev.stats();
    assert_eq!(stats.pipelines_built, 1);
    assert_eq!(stats.uniform_writes, 1);
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.submissions, 1);

    let backend = dev.backend();
    assert_eq!(backend.presents, 1);
    assert_eq!(backend.submissions.len(), 1);
    let (label, scene) = &backend.submissions[0];
    assert_eq!(*label, "d3d8 scene");
    let count = |pred: fn(&GpuCmd) -> bool| scene.iter().filter(|c| pred(c)).count();
    // The mid-scene clear restarts the pass before anything is drawn.
    assert_eq!(count(|c| matches!(c, GpuCmd::BeginRenderPass(_))), 2);
    assert_eq!(count(|c| matches!(c, GpuCmd::SetPipeline(_))), 1);
    assert_eq!(count(|c| matches!(c, GpuCmd::DrawIndexed { .. })), 1);
    assert_eq!(backend.pipelines.len(), 1);
    let (_, desc) = &backend.pipelines[0];
    assert_eq!(desc.vertex_buffers[0].array_stride, 16);

    let cmds: Vec<&GpuCmd> = backend.submitted_commands().collect();
    let draws: Vec<&GpuCmd> = cmds
        .iter()
        .copied()
        .filter(|c| matches!(c, GpuCmd::DrawIndexed { .. }))
        .collect();
    assert_eq!(
        draws,
        vec![&GpuCmd::DrawIndexed {
            index_count: 3,
            instance_count: 1,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }]
    );
    assert!(cmds.iter().any(|c| matches!(
        c,
        GpuCmd::SetIndexBuffer {
            format: IndexFormat::Uint16,
            ..
        }
    )));
}
