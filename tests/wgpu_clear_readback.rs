use dx8_wgpu::d3d8::{ClearFlags, D3dError, Direct3D8, DeviceConfig, PresentParameters};
use dx8_wgpu::gpu::{env_var_truthy, BackendConfig};

/// `DX8_WGPU_REQUIRE_WEBGPU=1` turns a missing adapter into a failure instead of a skip.
fn require_gpu() -> bool {
    env_var_truthy("DX8_WGPU_REQUIRE_WEBGPU")
}

fn config() -> DeviceConfig {
    DeviceConfig {
        backend: BackendConfig {
            // Prefer GL on Linux CI to avoid crashes in some Vulkan software adapters.
            backends: if cfg!(target_os = "linux") {
                wgpu::Backends::GL
            } else {
                wgpu::Backends::PRIMARY
            },
            ..BackendConfig::default()
        },
        ..DeviceConfig::default()
    }
}

#[test]
fn clear_color_reaches_the_back_buffer() {
    let d3d = Direct3D8::new(config());
    if d3d.adapter_count() == 0 {
        assert!(!require_gpu(), "no wgpu adapter available");
        eprintln!("skipping: no wgpu adapter available");
        return;
    }

    let params = PresentParameters {
        back_buffer_width: 64,
        back_buffer_height: 32,
        ..PresentParameters::default()
    };
    let mut dev = match d3d.create_device(0, None, &params) {
        Ok(dev) => dev,
        Err(err @ (D3dError::Gpu(_) | D3dError::NotAvailable(_))) => {
            assert!(!require_gpu(), "device creation failed: {err}");
            eprintln!("skipping: {err}");
            return;
        }
        Err(err) => panic!("device creation failed: {err}"),
    };

    dev.clear(&[], ClearFlags::TARGET | ClearFlags::ZBUFFER, 0xff33_66cc, 1.0, 0)
        .unwrap();
    let pixels = dev.backend().read_back_buffer().unwrap();
    assert_eq!(pixels.len(), 64 * 32 * 4);
    let center = (16 * 64 + 32) * 4;
    assert_eq!(&pixels[center..center + 4], &[0xcc, 0x66, 0x33, 0xff]);
}
