//! Memory collaborators for packet building.
//!
//! An [`Arena`] hands out raw byte blocks and may refuse to do so. A
//! [`BufferFactory`] sits on top of an arena and produces packet buffers of a
//! single configured capacity. Refusals surface as
//! [`Error::ErrOutOfMemory`] so callers can abort cleanly.


use bytes::BytesMut;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};

/// Source of memory blocks.
pub trait Arena {
    /// Allocates an empty buffer with at least `size` bytes of capacity.
    fn allocate(&self, size: usize) -> Result<BytesMut>;

    /// Checks that `size` more bytes can be obtained for bookkeeping that is
    /// not backed by a buffer.
    fn reserve(&self, size: usize) -> Result<()> {
        self.allocate(size).map(|_| ())
    }
}

/// Arena backed by the global allocator. Never refuses.
#[derive(Debug, Default)]
pub struct HeapArena {
    num_allocations: AtomicUsize,
    bytes_allocated: AtomicUsize,
}

impl HeapArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful allocations so far.
    pub fn num_allocations(&self) -> usize {
        self.num_allocations.load(Ordering::Relaxed)
    }

    /// Sum of the sizes of all allocations so far.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated.load(Ordering::Relaxed)
    }
}

impl Arena for HeapArena {
    fn allocate(&self, size: usize) -> Result<BytesMut> {
        self.num_allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated.fetch_add(size, Ordering::Relaxed);
        Ok(BytesMut::with_capacity(size))
    }
}

/// Produces packet buffers of a fixed capacity from an arena.
pub struct BufferFactory<'a> {
    arena: &'a dyn Arena,
    buffer_size: usize,
}

impl<'a> BufferFactory<'a> {
    pub fn new(arena: &'a dyn Arena, buffer_size: usize) -> Self {
        BufferFactory { arena, buffer_size }
    }

    /// Capacity of every buffer produced by this factory.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Allocates a new empty buffer with `buffer_size` capacity.
    pub fn new_buffer(&self) -> Result<BytesMut> {
        let buf = self.arena.allocate(self.buffer_size)?;
        if buf.capacity() < self.buffer_size {
            return Err(Error::ErrOutOfMemory);
        }
        Ok(buf)
    }
}
