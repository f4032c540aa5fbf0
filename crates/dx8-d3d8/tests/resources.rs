use dx8_d3d8::d3d8;
use dx8_d3d8::{D3dFormat, Device, DeviceConfig, LockFlags, Point, Rect};
use dx8_gpu::{GpuCmd, RecordingBackend};
use pretty_assertions::assert_eq;

fn device() -> Device<RecordingBackend> {
    Device::new(RecordingBackend::new(640, 480), &DeviceConfig::default()).unwrap()
}

#[test]
fn texture_with_zero_levels_gets_the_full_chain() {
    let mut dev = device();
    let texture = dev
        .create_texture(
            256,
            64,
            0,
            0,
            D3dFormat::A8R8G8B8.raw(),
            d3d8::D3DPOOL_MANAGED,
        )
        .unwrap();
    assert_eq!(texture.level_count(), 7);
    let last = texture.level_desc(6).unwrap();
    assert_eq!((last.width, last.height), (4, 1));

    let capped = dev
        .create_texture(8, 8, 10, 0, D3dFormat::A8R8G8B8.raw(), d3d8::D3DPOOL_MANAGED)
        .unwrap();
    assert_eq!(capped.level_count(), 4);
}

#[test]
fn locked_pixels_survive_unlock_and_relock() {
    let mut dev = device();
    let mut texture = dev
        .create_texture(4, 4, 1, 0, D3dFormat::A8R8G8B8.raw(), d3d8::D3DPOOL_MANAGED)
        .unwrap();

    let locked = texture
        .lock_rect(0, Some(Rect::new(1, 1, 2, 2)), LockFlags::empty())
        .unwrap();
    assert_eq!(locked.pitch, 16);
    locked.bits[..4].copy_from_slice(&[0x10, 0x20, 0x30, 0x40]);
    texture.unlock_rect(0, &mut dev).unwrap();

    let write = dev.backend().texture_writes.last().unwrap();
    assert_eq!(write.data.len(), 4 * 4 * 4);
    assert_eq!(&write.data[20..24], &[0x10, 0x20, 0x30, 0x40]);

    let relocked = texture
        .lock_rect(0, None, LockFlags::READONLY)
        .unwrap();
    assert_eq!(&relocked.bits[20..24], &[0x10, 0x20, 0x30, 0x40]);
    texture.unlock_rect(0, &mut dev).unwrap();
    assert_eq!(dev.backend().texture_writes.len(), 2);
}

#[test]
fn sixteen_bit_surfaces_are_expanded_on_upload() {
    let mut dev = device();
    let mut texture = dev
        .create_texture(2, 1, 1, 0, D3dFormat::R5G6B5.raw(), d3d8::D3DPOOL_MANAGED)
        .unwrap();
    texture
        .lock_rect(0, None, LockFlags::empty())
        .unwrap()
        .bits
        .copy_from_slice(&0xf800u16.to_le_bytes().repeat(2));
    texture.unlock_rect(0, &mut dev).unwrap();

    let write = dev.backend().texture_writes.last().unwrap();
    // BGRA: pure red.
    assert_eq!(write.data, vec![0, 0, 0xff, 0xff, 0, 0, 0xff, 0xff]);
}

#[test]
fn copy_rects_records_a_gpu_copy_and_mirrors_staging() {
    let mut dev = device();
    let mut src = dev
        .create_image_surface(8, 8, D3dFormat::A8R8G8B8.raw())
        .unwrap();
    src.lock_rect(None, LockFlags::empty())
        .unwrap()
        .bits
        .iter_mut()
        .enumerate()
        .for_each(|(i, b)| *b = i as u8);
    src.unlock_rect(&mut dev).unwrap();

    let mut texture = dev
        .create_texture(16, 16, 1, 0, D3dFormat::A8R8G8B8.raw(), d3d8::D3DPOOL_MANAGED)
        .unwrap();
    let dst = texture.surface_level_mut(0).unwrap();
    dev.copy_rects(&src, &[], dst, &[Point { x: 8, y: 4 }])
        .unwrap();

    let pixel = dst.lock_rect(Some(Rect::new(8, 4, 9, 5)), LockFlags::READONLY).unwrap();
    assert_eq!(&pixel.bits[..4], &[0, 1, 2, 3]);
    dst.unlock_rect(&mut dev).unwrap();

    dev.present().unwrap();
    let (label, cmds) = &dev.backend().submissions[0];
    assert_eq!(*label, "d3d8 copies");
    match &cmds[..] {
        [GpuCmd::CopyTextureToTexture(copy)] => {
            assert_eq!(copy.dst_origin, [8, 4]);
            assert_eq!((copy.width, copy.height), (8, 8));
        }
        other => panic!("unexpected copy stream {other:?}"),
    }
}

#[test]
fn whole_surface_copy_lands_at_the_origin_and_touches_only_its_extent() {
    let mut dev = device();
    let mut src = dev
        .create_image_surface(2, 2, D3dFormat::A8R8G8B8.raw())
        .unwrap();
    src.lock_rect(None, LockFlags::empty())
        .unwrap()
        .bits
        .iter_mut()
        .enumerate()
        .for_each(|(i, b)| *b = i as u8 + 1);
    src.unlock_rect(&mut dev).unwrap();

    let mut dst = dev
        .create_image_surface(4, 4, D3dFormat::A8R8G8B8.raw())
        .unwrap();
    dst.lock_rect(None, LockFlags::empty())
        .unwrap()
        .bits
        .fill(0xaa);
    dst.unlock_rect(&mut dev).unwrap();

    dev.copy_rects(&src, &[], &mut dst, &[]).unwrap();

    let locked = dst.lock_rect(None, LockFlags::READONLY).unwrap();
    assert_eq!(locked.pitch, 16);
    for y in 0..4usize {
        for x in 0..4usize {
            let px = &locked.bits[y * 16 + x * 4..][..4];
            if x < 2 && y < 2 {
                let first = (y * 8 + x * 4) as u8 + 1;
                assert_eq!(px, &[first, first + 1, first + 2, first + 3], "pixel ({x}, {y})");
            } else {
                assert_eq!(px, &[0xaa; 4], "pixel ({x}, {y})");
            }
        }
    }
    dst.unlock_rect(&mut dev).unwrap();

    dev.present().unwrap();
    let copy = dev
        .backend()
        .submitted_commands()
        .find_map(|c| match c {
            GpuCmd::CopyTextureToTexture(copy) => Some(*copy),
            _ => None,
        })
        .unwrap();
    assert_eq!(copy.src_origin, [0, 0]);
    assert_eq!(copy.dst_origin, [0, 0]);
    assert_eq!((copy.width, copy.height), (2, 2));
}

#[test]
fn compressed_copies_move_whole_blocks() {
    let mut dev = device();
    let src = dev
        .create_texture(8, 8, 0, 0, D3dFormat::DXT1.raw(), d3d8::D3DPOOL_MANAGED)
        .unwrap();
    let mut dst = dev
        .create_texture(8, 8, 0, 0, D3dFormat::DXT1.raw(), d3d8::D3DPOOL_MANAGED)
        .unwrap();

    assert!(dev
        .copy_rects(
            src.surface_level(0).unwrap(),
            &[Rect::new(2, 0, 6, 4)],
            dst.surface_level_mut(0).unwrap(),
            &[],
        )
        .is_err());

    // The 2x2 level is smaller than one block; the copy covers the whole block.
    dev.copy_rects(
        src.surface_level(2).unwrap(),
        &[],
        dst.surface_level_mut(2).unwrap(),
        &[],
    )
    .unwrap();
    dev.present().unwrap();
    let copy = dev
        .backend()
        .submitted_commands()
        .find_map(|c| match c {
            GpuCmd::CopyTextureToTexture(copy) => Some(*copy),
            _ => None,
        })
        .unwrap();
    assert_eq!((copy.src_level, copy.width, copy.height), (2, 4, 4));
}

#[test]
fn buffer_desc_reports_creation_parameters() {
    let mut dev = device();
    let vb = dev
        .create_vertex_buffer(36, d3d8::D3DUSAGE_DYNAMIC, 0x42, d3d8::D3DPOOL_DEFAULT)
        .unwrap();
    let desc = vb.desc();
    assert_eq!(desc.size, 36);
    assert_eq!(desc.format, D3dFormat::VERTEXDATA);
    assert_eq!(desc.fvf.bits(), 0x42);
    assert_eq!(desc.usage, d3d8::D3DUSAGE_DYNAMIC);
    assert!(dev.create_vertex_buffer(0, 0, 0x42, 0).is_err());
}
