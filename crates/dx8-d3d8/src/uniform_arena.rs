use dx8_gpu::{align_up, BindGroupId, BufferDesc, BufferId, GpuBackend, GpuError};

use crate::uniforms::UniformState;

/// Append-only ring of [`UniformState`] snapshots in one uniform buffer.
///
/// Each draw that needs new uniforms gets the next slot and binds it with a dynamic offset, so a
/// slot is never rewritten while a recorded draw may still read it. The device resets the cursor
/// once everything recorded against the buffer has been submitted.
#[derive(Debug)]
pub struct UniformArena {
    buffer: BufferId,
    bind_group: BindGroupId,
    slot_size: u64,
    capacity: u32,
    cursor: u32,
}

impl UniformArena {
    pub fn new<B: GpuBackend>(backend: &mut B, capacity: u32) -> Result<Self, GpuError> {
        let alignment = u64::from(
            backend
                .capabilities()
                .min_uniform_buffer_offset_alignment
                .max(1),
        );
        let state_size = std::mem::size_of::<UniformState>() as u64;
        let slot_size = align_up(state_size, alignment);
        let capacity = capacity.max(1);

        let buffer = backend.create_buffer(&BufferDesc {
            label: "d3d8 uniform arena",
            size: slot_size * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })?;
        let bind_group = backend.create_uniform_bind_group(buffer, state_size)?;

        Ok(Self {
            buffer,
            bind_group,
            slot_size,
            capacity,
            cursor: 0,
        })
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn bind_group(&self) -> BindGroupId {
        self.bind_group
    }

    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Slots handed out since the last reset.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn is_full(&self) -> bool {
        self.cursor >= self.capacity
    }

    /// Reserves the next slot and returns its byte offset, or `None` when the arena is full.
    pub fn alloc(&mut self) -> Option<u32> {
        if self.is_full() {
            return None;
        }
        let offset = u64::from(self.cursor) * self.slot_size;
        self.cursor += 1;
        u32::try_from(offset).ok()
    }

    /// Writes `state` into a fresh slot and returns the dynamic offset to bind.
    pub fn push<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        state: &UniformState,
    ) -> Result<Option<u32>, GpuError> {
        let Some(offset) = self.alloc() else {
            return Ok(None);
        };
        backend.write_buffer(self.buffer, u64::from(offset), state.as_bytes())?;
        Ok(Some(offset))
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx8_gpu::RecordingBackend;
    use pretty_assertions::assert_eq;

    #[test]
    fn slots_are_aligned_to_the_dynamic_offset_alignment() {
        let mut backend = RecordingBackend::new(64, 64);
        let mut arena = UniformArena::new(&mut backend, 3).unwrap();
        assert_eq!(arena.slot_size(), 1536);
        assert_eq!(backend.buffers[&arena.buffer()].size, 1536 * 3);

        let state = UniformState::default();
        assert_eq!(arena.push(&mut backend, &state).unwrap(), Some(0));
        assert_eq!(arena.push(&mut backend, &state).unwrap(), Some(1536));
        assert_eq!(arena.push(&mut backend, &state).unwrap(), Some(3072));
        assert!(arena.is_full());
        assert_eq!(arena.push(&mut backend, &state).unwrap(), None);
        assert_eq!(backend.writes_to(arena.buffer()).count(), 3);

        arena.reset();
        assert_eq!(arena.cursor(), 0);
        assert_eq!(arena.alloc(), Some(0));
    }
}
