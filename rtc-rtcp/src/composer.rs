//! Assembly of outbound compound RTCP datagrams.


use std::fmt;

use bytes::BytesMut;
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize};

use crate::packet::Packet;

/// Composer collects RTCP packets and serializes them back to back into a
/// single compound datagram no larger than `max_size`.
#[derive(Debug)]
pub struct Composer {
    packets: Vec<Box<dyn Packet>>,
    max_size: usize,
}

impl fmt::Display for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Composer ({} packets, {}/{} bytes):",
            self.packets.len(),
            self.marshal_size(),
            self.max_size
        )?;
        for p in &self.packets {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

impl Composer {
    pub fn new(max_size: usize) -> Self {
        Composer {
            packets: vec![],
            max_size,
        }
    }

    /// Upper bound of the serialized datagram.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Appends a packet. Nothing is checked until the datagram is composed,
    /// callers decide placement with [`Composer::fits`] first.
    pub fn push(&mut self, packet: Box<dyn Packet>) {
        self.packets.push(packet);
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn packets(&self) -> &[Box<dyn Packet>] {
        &self.packets
    }

    /// Reports whether `extra` more bytes would still fit in the datagram.
    pub fn fits(&self, extra: usize) -> bool {
        self.marshal_size() + extra <= self.max_size
    }

    /// Bytes left before the size bound is reached.
    pub fn remaining(&self) -> usize {
        self.max_size.saturating_sub(self.marshal_size())
    }

    /// Removes every packet, keeping the size bound.
    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Serializes the datagram at the end of `buf` without growing it past
    /// its capacity. Returns the number of bytes written.
    pub fn compose(&self, buf: &mut BytesMut) -> Result<usize> {
        let size = self.marshal_size();
        if size > self.max_size || buf.capacity() - buf.len() < size {
            return Err(Error::BufferTooShort);
        }

        let start = buf.len();
        buf.resize(start + size, 0);
        match self.marshal_to(&mut buf[start..]) {
            Ok(n) => {
                buf.truncate(start + n);
                Ok(n)
            }
            Err(err) => {
                buf.truncate(start);
                Err(err)
            }
        }
    }
}

impl MarshalSize for Composer {
    fn marshal_size(&self) -> usize {
        self.packets.iter().map(|p| p.marshal_size()).sum()
    }
}

impl Marshal for Composer {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if self.packets.is_empty() {
            return Err(Error::EmptyCompound);
        }
        if buf.len() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let mut n = 0;
        for p in &self.packets {
            let written = p.marshal_to(buf)?;
            n += written;
            buf = &mut buf[written..];
        }
        Ok(n)
    }
}
