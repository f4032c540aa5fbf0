use std::ops::Range;

use dx8_gpu::{align_up, BufferId, GpuBackend, IndexFormat};

use super::{release, LockFlags, Release, ReleaseQueue};
use crate::device::Device;
use crate::error::{D3dError, D3dResult};
use crate::format::D3dFormat;
use crate::fvf::Fvf;

#[derive(Debug)]
struct LockState {
    range: Range<usize>,
    read_only: bool,
}

/// CPU copy of a GPU buffer plus the currently locked range.
#[derive(Debug)]
struct BufferStorage {
    id: BufferId,
    length: u32,
    /// Padded to a multiple of 4 so every upload can be widened to the copy alignment.
    staging: Vec<u8>,
    locked: Option<LockState>,
    releases: ReleaseQueue,
}

impl BufferStorage {
    fn new(id: BufferId, length: u32, releases: ReleaseQueue) -> Self {
        Self {
            id,
            length,
            staging: vec![0; padded_len(length) as usize],
            locked: None,
            releases,
        }
    }

    fn lock(&mut self, offset: u32, size: u32, flags: LockFlags) -> D3dResult<&mut [u8]> {
        if self.locked.is_some() {
            return Err(D3dError::InvalidCall("buffer is already locked"));
        }
        let size = if size == 0 {
            self.length.saturating_sub(offset)
        } else {
            size
        };
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.length)
            .ok_or(D3dError::InvalidCall("lock range exceeds the buffer"))?;

        let range = offset as usize..end as usize;
        self.locked = Some(LockState {
            range: range.clone(),
            read_only: flags.contains(LockFlags::READONLY),
        });
        Ok(&mut self.staging[range])
    }

    fn unlock<B: GpuBackend>(&mut self, backend: &mut B) -> D3dResult<()> {
        let lock = self
            .locked
            .take()
            .ok_or(D3dError::InvalidCall("buffer is not locked"))?;
        if lock.read_only || lock.range.is_empty() {
            return Ok(());
        }
        let start = lock.range.start & !3;
        let end = align_up(lock.range.end as u64, 4) as usize;
        backend.write_buffer(self.id, start as u64, &self.staging[start..end])?;
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.locked.is_some()
    }
}

impl Drop for BufferStorage {
    fn drop(&mut self) {
        release(&self.releases, Release::Buffer(self.id));
    }
}

pub(crate) fn padded_len(length: u32) -> u64 {
    align_up(u64::from(length), wgpu::COPY_BUFFER_ALIGNMENT)
}

/// `D3DVERTEXBUFFER_DESC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferDesc {
    pub format: D3dFormat,
    pub usage: u32,
    pub pool: u32,
    pub size: u32,
    pub fvf: Fvf,
}

#[derive(Debug)]
pub struct VertexBuffer {
    storage: BufferStorage,
    usage: u32,
    pool: u32,
    fvf: Fvf,
}

impl VertexBuffer {
    pub(crate) fn new(
        id: BufferId,
        length: u32,
        usage: u32,
        fvf: Fvf,
        pool: u32,
        releases: ReleaseQueue,
    ) -> Self {
        Self {
            storage: BufferStorage::new(id, length, releases),
            usage,
            pool,
            fvf,
        }
    }

    pub(crate) fn id(&self) -> BufferId {
        self.storage.id
    }

    pub fn desc(&self) -> VertexBufferDesc {
        VertexBufferDesc {
            format: D3dFormat::VERTEXDATA,
            usage: self.usage,
            pool: self.pool,
            size: self.storage.length,
            fvf: self.fvf,
        }
    }

    /// Locks `size` bytes at `offset`; a `size` of 0 locks to the end of the buffer.
    pub fn lock(&mut self, offset: u32, size: u32, flags: LockFlags) -> D3dResult<&mut [u8]> {
        self.storage.lock(offset, size, flags)
    }

    /// Uploads the locked range.
    pub fn unlock<B: GpuBackend>(&mut self, device: &mut Device<B>) -> D3dResult<()> {
        self.storage.unlock(device.backend_mut())
    }

    pub fn is_locked(&self) -> bool {
        self.storage.is_locked()
    }
}

/// `D3DINDEXBUFFER_DESC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexBufferDesc {
    pub format: D3dFormat,
    pub usage: u32,
    pub pool: u32,
    pub size: u32,
}

#[derive(Debug)]
pub struct IndexBuffer {
    storage: BufferStorage,
    format: D3dFormat,
    usage: u32,
    pool: u32,
}

impl IndexBuffer {
    pub(crate) fn new(
        id: BufferId,
        length: u32,
        usage: u32,
        format: D3dFormat,
        pool: u32,
        releases: ReleaseQueue,
    ) -> Self {
        Self {
            storage: BufferStorage::new(id, length, releases),
            format,
            usage,
            pool,
        }
    }

    pub(crate) fn id(&self) -> BufferId {
        self.storage.id
    }

    pub(crate) fn index_format(&self) -> IndexFormat {
        index_format(self.format).unwrap_or(IndexFormat::Uint16)
    }

    pub fn desc(&self) -> IndexBufferDesc {
        IndexBufferDesc {
            format: self.format,
            usage: self.usage,
            pool: self.pool,
            size: self.storage.length,
        }
    }

    pub fn lock(&mut self, offset: u32, size: u32, flags: LockFlags) -> D3dResult<&mut [u8]> {
        self.storage.lock(offset, size, flags)
    }

    pub fn unlock<B: GpuBackend>(&mut self, device: &mut Device<B>) -> D3dResult<()> {
        self.storage.unlock(device.backend_mut())
    }

    pub fn is_locked(&self) -> bool {
        self.storage.is_locked()
    }
}

pub(crate) fn index_format(format: D3dFormat) -> Option<IndexFormat> {
    match format {
        D3dFormat::INDEX16 => Some(IndexFormat::Uint16),
        D3dFormat::INDEX32 => Some(IndexFormat::Uint32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx8_gpu::RecordingBackend;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc::channel;

    #[test]
    fn unlock_uploads_the_aligned_range() {
        let (tx, rx) = channel();
        let mut backend = RecordingBackend::new(8, 8);
        let id = backend
            .create_buffer(&dx8_gpu::BufferDesc {
                label: "test",
                size: padded_len(10),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            })
            .unwrap();
        let mut storage = BufferStorage::new(id, 10, tx);
        assert_eq!(storage.staging.len(), 12);

        storage
            .lock(5, 3, LockFlags::empty())
            .unwrap()
            .copy_from_slice(&[1, 2, 3]);
        assert!(matches!(
            storage.lock(0, 0, LockFlags::empty()),
            Err(D3dError::InvalidCall(_))
        ));
        storage.unlock(&mut backend).unwrap();

        let write = backend.writes_to(id).last().unwrap();
        assert_eq!(write.offset, 4);
        assert_eq!(write.data, vec![0, 1, 2, 3]);

        assert!(matches!(
            storage.unlock(&mut backend),
            Err(D3dError::InvalidCall(_))
        ));

        drop(storage);
        assert_eq!(rx.try_recv(), Ok(Release::Buffer(id)));
    }

    #[test]
    fn lock_size_zero_runs_to_the_end() {
        let (tx, _rx) = channel();
        let mut storage = BufferStorage::new(BufferId(1), 16, tx);
        assert_eq!(storage.lock(4, 0, LockFlags::empty()).unwrap().len(), 12);
    }

    #[test]
    fn lock_out_of_range_is_rejected_without_locking() {
        let (tx, _rx) = channel();
        let mut storage = BufferStorage::new(BufferId(1), 16, tx);
        assert!(storage.lock(8, 9, LockFlags::empty()).is_err());
        assert!(!storage.is_locked());
    }

    #[test]
    fn read_only_locks_do_not_upload() {
        let (tx, _rx) = channel();
        let mut backend = RecordingBackend::new(8, 8);
        let mut storage = BufferStorage::new(BufferId(99), 16, tx);
        storage.lock(0, 0, LockFlags::READONLY).unwrap();
        storage.unlock(&mut backend).unwrap();
        assert!(backend.buffer_writes.is_empty());
    }
}
