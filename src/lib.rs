//! Direct3D 8 fixed-function rendering on wgpu.
//!
//! The work lives in two crates: [`gpu`] is the explicit GPU boundary (resource ids, a recorded
//! command stream and the wgpu backend) and [`d3d8`] is the legacy device built on top of it.

pub use dx8_d3d8 as d3d8;
pub use dx8_gpu as gpu;
