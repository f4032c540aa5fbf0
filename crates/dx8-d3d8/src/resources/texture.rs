use dx8_gpu::{BindGroupId, GpuBackend, TextureId};

use super::{release, LockFlags, LockedRect, Rect, Release, ReleaseQueue};
use crate::d3d8;
use crate::device::Device;
use crate::error::{D3dError, D3dResult};
use crate::format::D3dFormat;

/// Extent of mip `level` of a `width`x`height` texture.
pub(crate) fn level_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    let shrink = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
    (shrink(width), shrink(height))
}

/// Length of the full mip chain down to the first 1-pixel-wide or -high level.
pub(crate) fn full_level_count(width: u32, height: u32) -> u32 {
    1 + width.min(height).max(1).ilog2()
}

/// `D3DSURFACE_DESC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub format: D3dFormat,
    pub resource_type: u32,
    pub usage: u32,
    pub pool: u32,
    pub size: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
enum Owner {
    /// A mip level of a [`Texture`], which owns the GPU texture.
    Level,
    /// An image surface that owns its single-level texture.
    Standalone(ReleaseQueue),
}

/// One mip level of a texture, or a standalone image surface.
///
/// The staging copy keeps the legacy pixel layout so a lock always returns what was last
/// written; conversion to the backend format happens on upload.
#[derive(Debug)]
pub struct Surface {
    texture: TextureId,
    level: u32,
    format: D3dFormat,
    width: u32,
    height: u32,
    usage: u32,
    pool: u32,
    staging: Vec<u8>,
    locked: Option<LockFlags>,
    owner: Owner,
}

impl Surface {
    fn level_of(
        texture: TextureId,
        level: u32,
        format: D3dFormat,
        (width, height): (u32, u32),
        usage: u32,
        pool: u32,
    ) -> D3dResult<Self> {
        let len = format
            .image_byte_len(width, height)
            .ok_or(D3dError::InvalidCall("surface is too large"))?;
        Ok(Self {
            texture,
            level,
            format,
            width,
            height,
            usage,
            pool,
            staging: vec![0; len],
            locked: None,
            owner: Owner::Level,
        })
    }

    pub(crate) fn standalone(
        texture: TextureId,
        format: D3dFormat,
        width: u32,
        height: u32,
        releases: ReleaseQueue,
    ) -> D3dResult<Self> {
        let mut surface = Self::level_of(
            texture,
            0,
            format,
            (width, height),
            0,
            d3d8::D3DPOOL_SYSTEMMEM,
        )?;
        surface.owner = Owner::Standalone(releases);
        Ok(surface)
    }

    pub(crate) fn texture_id(&self) -> TextureId {
        self.texture
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn format(&self) -> D3dFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn desc(&self) -> SurfaceDesc {
        SurfaceDesc {
            format: self.format,
            resource_type: d3d8::D3DRTYPE_SURFACE,
            usage: self.usage,
            pool: self.pool,
            size: self.staging.len() as u32,
            width: self.width,
            height: self.height,
        }
    }

    /// Row pitch in bytes, `width * bpp / 8`.
    pub fn pitch(&self) -> u32 {
        self.width * self.format.bits_per_pixel() / 8
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    pub(crate) fn staging(&self) -> &[u8] {
        &self.staging
    }

    pub(crate) fn staging_mut(&mut self) -> &mut [u8] {
        &mut self.staging
    }

    /// Locks `rect`, or the whole surface when `None`.
    pub fn lock_rect(&mut self, rect: Option<Rect>, flags: LockFlags) -> D3dResult<LockedRect<'_>> {
        if self.locked.is_some() {
            return Err(D3dError::InvalidCall("surface is already locked"));
        }
        let rect = rect.unwrap_or(Rect::new(0, 0, self.width, self.height));
        if !rect.fits(self.width, self.height) {
            return Err(D3dError::InvalidCall("lock rectangle exceeds the surface"));
        }

        let pitch = self.pitch();
        let offset =
            (rect.top * pitch + rect.left * self.format.bits_per_pixel() / 8) as usize;
        let offset = offset.min(self.staging.len());
        self.locked = Some(flags);
        Ok(LockedRect {
            pitch,
            bits: &mut self.staging[offset..],
        })
    }

    /// Uploads the whole level to the GPU.
    pub fn unlock_rect<B: GpuBackend>(&mut self, device: &mut Device<B>) -> D3dResult<()> {
        let flags = self
            .locked
            .take()
            .ok_or(D3dError::InvalidCall("surface is not locked"))?;
        if flags.contains(LockFlags::READONLY) {
            return Ok(());
        }
        self.upload(device.backend_mut())
    }

    pub(crate) fn upload<B: GpuBackend>(&self, backend: &mut B) -> D3dResult<()> {
        let data = self.format.to_backend_bytes(&self.staging);
        backend.write_texture(self.texture, self.level, &data)?;
        Ok(())
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if let Owner::Standalone(releases) = &self.owner {
            release(releases, Release::Texture(self.texture));
        }
    }
}

/// A mip-mapped 2D texture; every level is exposed as a [`Surface`].
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    bind_group: BindGroupId,
    format: D3dFormat,
    levels: Vec<Surface>,
    releases: ReleaseQueue,
}

impl Texture {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: TextureId,
        bind_group: BindGroupId,
        width: u32,
        height: u32,
        level_count: u32,
        format: D3dFormat,
        usage: u32,
        pool: u32,
        releases: ReleaseQueue,
    ) -> D3dResult<Self> {
        let levels = (0..level_count)
            .map(|level| {
                Surface::level_of(
                    id,
                    level,
                    format,
                    level_extent(width, height, level),
                    usage,
                    pool,
                )
            })
            .collect::<D3dResult<Vec<_>>>()?;
        Ok(Self {
            id,
            bind_group,
            format,
            levels,
            releases,
        })
    }

    pub(crate) fn id(&self) -> TextureId {
        self.id
    }

    pub(crate) fn bind_group(&self) -> BindGroupId {
        self.bind_group
    }

    pub fn format(&self) -> D3dFormat {
        self.format
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn level_desc(&self, level: u32) -> D3dResult<SurfaceDesc> {
        self.surface_level(level).map(Surface::desc)
    }

    pub fn surface_level(&self, level: u32) -> D3dResult<&Surface> {
        self.levels
            .get(level as usize)
            .ok_or(D3dError::InvalidCall("mip level out of range"))
    }

    pub fn surface_level_mut(&mut self, level: u32) -> D3dResult<&mut Surface> {
        self.levels
            .get_mut(level as usize)
            .ok_or(D3dError::InvalidCall("mip level out of range"))
    }

    pub fn lock_rect(
        &mut self,
        level: u32,
        rect: Option<Rect>,
        flags: LockFlags,
    ) -> D3dResult<LockedRect<'_>> {
        self.surface_level_mut(level)?.lock_rect(rect, flags)
    }

    pub fn unlock_rect<B: GpuBackend>(
        &mut self,
        level: u32,
        device: &mut Device<B>,
    ) -> D3dResult<()> {
        self.surface_level_mut(level)?.unlock_rect(device)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        release(&self.releases, Release::BindGroup(self.bind_group));
        release(&self.releases, Release::Texture(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc::channel;

    fn texture(width: u32, height: u32, format: D3dFormat) -> Texture {
        let (tx, _rx) = channel();
        let levels = full_level_count(width, height);
        Texture::new(
            TextureId(1),
            BindGroupId(2),
            width,
            height,
            levels,
            format,
            0,
            d3d8::D3DPOOL_MANAGED,
            tx,
        )
        .unwrap()
    }

    #[test]
    fn full_chain_stops_at_the_short_side() {
        assert_eq!(full_level_count(256, 64), 7);
        assert_eq!(full_level_count(1, 1), 1);
        assert_eq!(full_level_count(5, 3), 2);
        assert_eq!(level_extent(256, 64, 6), (4, 1));
        assert_eq!(level_extent(256, 64, 7), (2, 1));
        assert_eq!(level_extent(3, 3, 40), (1, 1));
    }

    #[test]
    fn level_surfaces_halve_each_step() {
        let tex = texture(256, 64, D3dFormat::A8R8G8B8);
        let extents: Vec<(u32, u32)> = (0..tex.level_count())
            .map(|l| {
                let desc = tex.level_desc(l).unwrap();
                (desc.width, desc.height)
            })
            .collect();
        assert_eq!(
            extents,
            vec![(256, 64), (128, 32), (64, 16), (32, 8), (16, 4), (8, 2), (4, 1)]
        );
        assert!(tex.level_desc(7).is_err());
    }

    #[test]
    fn locked_rect_starts_at_the_requested_pixel() {
        let mut tex = texture(8, 8, D3dFormat::R5G6B5);
        let locked = tex
            .lock_rect(0, Some(Rect::new(2, 3, 4, 4)), LockFlags::empty())
            .unwrap();
        assert_eq!(locked.pitch, 16);
        assert_eq!(locked.bits.len(), 8 * 8 * 2 - (3 * 16 + 2 * 2));
        locked.bits[0] = 0xab;
        assert_eq!(tex.levels[0].staging()[3 * 16 + 4], 0xab);
    }

    #[test]
    fn lock_rejects_rects_outside_and_double_locks() {
        let mut tex = texture(4, 4, D3dFormat::A8R8G8B8);
        assert!(tex
            .lock_rect(0, Some(Rect::new(0, 0, 5, 1)), LockFlags::empty())
            .is_err());
        tex.lock_rect(0, None, LockFlags::empty()).unwrap();
        assert!(matches!(
            tex.lock_rect(0, None, LockFlags::empty()),
            Err(D3dError::InvalidCall(_))
        ));
    }

    #[test]
    fn dropping_a_texture_releases_bind_group_then_texture() {
        let (tx, rx) = channel();
        let tex = Texture::new(
            TextureId(5),
            BindGroupId(6),
            4,
            4,
            1,
            D3dFormat::A8R8G8B8,
            0,
            d3d8::D3DPOOL_MANAGED,
            tx,
        )
        .unwrap();
        drop(tex);
        let released: Vec<Release> = rx.try_iter().collect();
        assert_eq!(
            released,
            vec![Release::BindGroup(BindGroupId(6)), Release::Texture(TextureId(5))]
        );
    }

    #[test]
    fn compressed_levels_stage_whole_blocks() {
        let tex = texture(8, 8, D3dFormat::DXT1);
        assert_eq!(tex.level_desc(0).unwrap().size, 32);
        assert_eq!(tex.level_desc(2).unwrap().size, 8);
    }
}
