#[cfg(test)]
mod source_description_test;

use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::header::*;
use crate::packet::Packet;
use crate::util::*;

/// Item type terminating the item list of a chunk.
pub const SDES_END: u8 = 0;
/// Item type of the canonical name, RFC 3550 6.5.1.
pub const SDES_CNAME: u8 = 1;

const SSRC_LEN: usize = 4;
const ITEM_HEADER_LEN: usize = 2;

/// One type/length/text item. Only CNAME items are interpreted, others are
/// carried through untouched.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct SdesItem {
    pub item_type: u8,
    pub text: Bytes,
}

impl SdesItem {
    pub fn cname(cname: &str) -> Self {
        SdesItem {
            item_type: SDES_CNAME,
            text: Bytes::copy_from_slice(cname.as_bytes()),
        }
    }
}

impl fmt::Display for SdesItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(&self.text);
        match self.item_type {
            SDES_CNAME => write!(f, "CNAME: {text}"),
            other => write!(f, "item {other}: {text}"),
        }
    }
}

impl MarshalSize for SdesItem {
    fn marshal_size(&self) -> usize {
        ITEM_HEADER_LEN + self.text.len()
    }
}

impl Marshal for SdesItem {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if self.item_type == SDES_END {
            return Err(Error::SdesMissingType);
        }
        if self.text.len() > SDES_MAX_OCTET_COUNT {
            return Err(Error::SdesTextTooLong);
        }
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        buf.put_u8(self.item_type);
        buf.put_u8(self.text.len() as u8);
        buf.put_slice(&self.text);
        Ok(self.marshal_size())
    }
}

impl Unmarshal for SdesItem {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < ITEM_HEADER_LEN {
            return Err(Error::PacketTooShort);
        }
        let item_type = raw_packet.get_u8();
        if item_type == SDES_END {
            return Err(Error::SdesMissingType);
        }
        let len = raw_packet.get_u8() as usize;
        if raw_packet.remaining() < len {
            return Err(Error::PacketTooShort);
        }

        Ok(SdesItem {
            item_type,
            text: raw_packet.copy_to_bytes(len),
        })
    }
}

/// The items describing one source. On the wire the item list ends with a
/// null octet and the chunk is padded to a 32-bit boundary.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct SdesChunk {
    pub source: u32,
    pub items: Vec<SdesItem>,
}

impl SdesChunk {
    fn unpadded_size(&self) -> usize {
        SSRC_LEN + self.items.iter().map(|it| it.marshal_size()).sum::<usize>() + 1
    }

    /// The first CNAME item of this chunk, if any.
    pub fn cname(&self) -> Option<&Bytes> {
        self.items
            .iter()
            .find(|it| it.item_type == SDES_CNAME)
            .map(|it| &it.text)
    }
}

impl MarshalSize for SdesChunk {
    fn marshal_size(&self) -> usize {
        let size = self.unpadded_size();
        size + get_padding_size(size)
    }
}

impl Marshal for SdesChunk {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        buf.put_u32(self.source);
        for it in &self.items {
            let n = it.marshal_to(buf)?;
            buf = &mut buf[n..];
        }
        buf.put_u8(SDES_END);
        put_padding(buf, self.unpadded_size());
        Ok(self.marshal_size())
    }
}

impl Unmarshal for SdesChunk {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < SSRC_LEN + 1 {
            return Err(Error::PacketTooShort);
        }

        let mut chunk = SdesChunk {
            source: raw_packet.get_u32(),
            items: vec![],
        };
        loop {
            if !raw_packet.has_remaining() {
                return Err(Error::PacketTooShort);
            }
            if raw_packet.chunk()[0] == SDES_END {
                raw_packet.advance(1);
                break;
            }
            chunk.items.push(SdesItem::unmarshal(raw_packet)?);
        }

        let padding = get_padding_size(chunk.unpadded_size());
        if raw_packet.remaining() < padding {
            return Err(Error::PacketTooShort);
        }
        raw_packet.advance(padding);
        Ok(chunk)
    }
}

/// A SourceDescription (SDES) packet, one chunk per described source.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct SourceDescription {
    pub chunks: Vec<SdesChunk>,
}

impl fmt::Display for SourceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SourceDescription:")?;
        for chunk in &self.chunks {
            writeln!(f, "\t{:#x}", chunk.source)?;
            for it in &chunk.items {
                writeln!(f, "\t\t{it}")?;
            }
        }
        Ok(())
    }
}

impl SourceDescription {
    /// A single-chunk SDES carrying only the CNAME of `source`.
    pub fn with_cname(source: u32, cname: &str) -> Self {
        SourceDescription {
            chunks: vec![SdesChunk {
                source,
                items: vec![SdesItem::cname(cname)],
            }],
        }
    }
}

impl Packet for SourceDescription {
    fn header(&self) -> Header {
        Header {
            padding: false,
            count: self.chunks.len() as u8,
            packet_type: PacketType::SourceDescription,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    fn destination_ssrc(&self) -> Vec<u32> {
        self.chunks.iter().map(|c| c.source).collect()
    }

    fn raw_size(&self) -> usize {
        HEADER_LENGTH + self.chunks.iter().map(|c| c.marshal_size()).sum::<usize>()
    }
}

impl MarshalSize for SourceDescription {
    fn marshal_size(&self) -> usize {
        // chunks are padded individually, the packet is always aligned
        self.raw_size()
    }
}

impl Marshal for SourceDescription {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if self.chunks.len() > COUNT_MAX {
            return Err(Error::TooManyChunks);
        }
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let n = self.header().marshal_to(buf)?;
        buf = &mut buf[n..];
        for chunk in &self.chunks {
            let n = chunk.marshal_to(buf)?;
            buf = &mut buf[n..];
        }
        Ok(self.marshal_size())
    }
}

impl Unmarshal for SourceDescription {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let available = raw_packet.remaining();
        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::SourceDescription {
            return Err(Error::WrongType);
        }
        if header.packet_size() > available {
            return Err(Error::PacketLengthOverflow);
        }

        let mut body = raw_packet.copy_to_bytes(header.packet_size() - HEADER_LENGTH);
        if header.padding {
            let padding = get_padding_len(&body)?;
            body.truncate(body.len() - padding);
        }

        let chunks = (0..header.count)
            .map(|_| SdesChunk::unmarshal(&mut body))
            .collect::<Result<Vec<_>>>()?;
        Ok(SourceDescription { chunks })
    }
}
