//! Direct3D 8 fixed-function rendering on top of wgpu.
//!
//! [`Direct3D8`] enumerates adapters and creates a [`Device`]. The device is an immediate-mode
//! state machine: render states, texture stage states, transforms, lights and the bound FVF
//! are folded into a cached render pipeline plus a per-draw uniform snapshot, and draws are
//! recorded into a command stream that is submitted at `end_scene`. The state is consumed by a
//! single WGSL shader (`fixed_function.wgsl`) that implements the fixed-function transform,
//! lighting and texture-stage combiner.

pub mod caps;
pub mod config;
pub mod d3d8;
pub mod device;
pub mod direct3d;
pub mod error;
pub mod format;
pub mod fvf;
pub mod pipeline;
pub mod resources;
pub mod state;
pub mod uniform_arena;
pub mod uniforms;

pub use caps::Caps;
pub use config::DeviceConfig;
pub use device::{
    Bindings, ClearFlags, D3dViewport, Device, DeviceStats, DisplayMode, SceneState,
    TextureBinding,
};
pub use direct3d::{Direct3D8, PresentParameters};
pub use error::{hresult_of, D3dError, D3dResult};
pub use format::D3dFormat;
pub use fvf::Fvf;
pub use resources::{
    IndexBuffer, IndexBufferDesc, LockFlags, LockedRect, Point, Rect, Surface, SurfaceDesc,
    Texture, VertexBuffer, VertexBufferDesc,
};
pub use uniforms::{Light, LightType, Material, Matrix, IDENTITY};
