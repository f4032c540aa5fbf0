//! Buffer, texture and surface objects handed out by the device.
//!
//! Each object exclusively owns its GPU handles. Dropping one does not destroy anything right
//! away: the ids go onto the device's release queue and are destroyed after the next submission,
//! so commands that were recorded while the object was alive stay valid.

mod buffer;
mod texture;

use std::sync::mpsc::Sender;

use bitflags::bitflags;
use dx8_gpu::{BindGroupId, BufferId, TextureId};

pub use buffer::{IndexBuffer, IndexBufferDesc, VertexBuffer, VertexBufferDesc};
pub use texture::{Surface, SurfaceDesc, Texture};

pub(crate) use buffer::{index_format as buffer_index_format, padded_len};
pub(crate) use texture::full_level_count;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Release {
    Buffer(BufferId),
    Texture(TextureId),
    BindGroup(BindGroupId),
}

pub(crate) type ReleaseQueue = Sender<Release>;

pub(crate) fn release(queue: &ReleaseQueue, item: Release) {
    // The device may already be gone, in which case the backend freed everything.
    let _ = queue.send(item);
}

bitflags! {
    /// `D3DLOCK_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LockFlags: u32 {
        const READONLY = 0x0010;
        const NOSYSLOCK = 0x0800;
        const NOOVERWRITE = 0x1000;
        const DISCARD = 0x2000;

        const _ = !0;
    }
}

/// `RECT`: half-open on `right` and `bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Whether the rectangle is well formed and lies inside a `width`x`height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.left <= self.right
            && self.top <= self.bottom
            && self.right <= width
            && self.bottom <= height
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// `D3DLOCKED_RECT`: `bits` starts at the locked rectangle's first pixel and runs to the end of
/// the surface; rows are `pitch` bytes apart.
#[derive(Debug)]
pub struct LockedRect<'a> {
    pub pitch: u32,
    pub bits: &'a mut [u8],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_fits_inside_extent() {
        assert!(Rect::new(0, 0, 4, 4).fits(4, 4));
        assert!(Rect::new(2, 1, 4, 3).fits(4, 4));
        assert!(!Rect::new(0, 0, 5, 4).fits(4, 4));
        assert!(!Rect::new(3, 0, 2, 4).fits(4, 4));
        assert!(Rect::new(1, 1, 1, 3).is_empty());
    }
}
