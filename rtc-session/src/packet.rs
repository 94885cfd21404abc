//! Outbound packet sinks.

use std::collections::VecDeque;

use shared::TaggedBytesMut;
use shared::error::{Error, Result};

/// PacketWriter consumes fully built outbound RTCP datagrams. The
/// destination is carried in `transport.peer_addr`.
pub trait PacketWriter {
    fn write(&mut self, packet: TaggedBytesMut) -> Result<()>;
}

impl<T: PacketWriter + ?Sized> PacketWriter for &mut T {
    fn write(&mut self, packet: TaggedBytesMut) -> Result<()> {
        (**self).write(packet)
    }
}

/// FIFO of written packets, optionally bounded.
#[derive(Debug, Default)]
pub struct Queue {
    packets: VecDeque<TaggedBytesMut>,
    capacity: Option<usize>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that refuses writes once `capacity` packets are pending.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packets: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Pops the oldest packet.
    pub fn read(&mut self) -> Result<TaggedBytesMut> {
        self.packets.pop_front().ok_or(Error::ErrNoData)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedBytesMut> {
        self.packets.iter()
    }
}

impl PacketWriter for Queue {
    fn write(&mut self, packet: TaggedBytesMut) -> Result<()> {
        if self.capacity.is_some_and(|cap| self.packets.len() >= cap) {
            return Err(Error::ErrBufferFull);
        }
        self.packets.push_back(packet);
        Ok(())
    }
}
