#[cfg(test)]
mod header_test;

use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Shl, Shr};

use bytes::{Buf, BufMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

/// PacketType specifies the type of an RTCP packet
/// RTCP packet types registered with IANA. See: https://www.iana.org/assignments/rtp-parameters/rtp-parameters.xhtml#rtp-parameters-4
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    #[default]
    Unsupported = 0,
    SenderReport = 200,       // RFC 3550, 6.4.1
    ReceiverReport = 201,     // RFC 3550, 6.4.2
    SourceDescription = 202,  // RFC 3550, 6.5
    Goodbye = 203,            // RFC 3550, 6.6
    ApplicationDefined = 204, // RFC 3550, 6.7 (unimplemented)
    ExtendedReport = 207,     // RFC 3611
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketType::Unsupported => "Unsupported",
            PacketType::SenderReport => "SR",
            PacketType::ReceiverReport => "RR",
            PacketType::SourceDescription => "SDES",
            PacketType::Goodbye => "BYE",
            PacketType::ApplicationDefined => "APP",
            PacketType::ExtendedReport => "XR",
        };
        write!(f, "{s}")
    }
}

impl From<u8> for PacketType {
    fn from(b: u8) -> Self {
        match b {
            200 => PacketType::SenderReport,
            201 => PacketType::ReceiverReport,
            202 => PacketType::SourceDescription,
            203 => PacketType::Goodbye,
            204 => PacketType::ApplicationDefined,
            207 => PacketType::ExtendedReport,
            _ => PacketType::Unsupported,
        }
    }
}

pub const RTP_VERSION: u8 = 2;
pub const VERSION_SHIFT: u32 = 6;
pub const VERSION_MASK: u8 = 0x3;
pub const PADDING_SHIFT: u32 = 5;
pub const PADDING_MASK: u8 = 0x1;
pub const COUNT_SHIFT: u32 = 0;
pub const COUNT_MASK: u8 = 0x1f;

pub const HEADER_LENGTH: usize = 4;
pub const COUNT_MAX: usize = (1 << 5) - 1;
pub const SSRC_LENGTH: usize = 4;
pub const SDES_MAX_OCTET_COUNT: usize = (1 << 8) - 1;

/// Unsigned words whose sub-ranges can be read and written with
/// [`get_bit_field`] and [`set_bit_field`].
pub trait BitWord:
    Copy
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
{
}

impl BitWord for u8 {}
impl BitWord for u16 {}
impl BitWord for u32 {}
impl BitWord for u64 {}

/// Extracts the field starting at bit `shift` (counted from the least
/// significant bit) and selected by `mask`.
///
/// `shift` must be smaller than the bit width of `T`.
pub fn get_bit_field<T: BitWord>(word: T, shift: u32, mask: T) -> T {
    (word >> shift) & mask
}

/// Stores `value` into the field starting at bit `shift` and selected by
/// `mask`. Bits of `word` outside the field are left untouched and bits of
/// `value` outside `mask` are ignored.
pub fn set_bit_field<T: BitWord>(word: &mut T, value: T, shift: u32, mask: T) {
    *word = (*word & !(mask << shift)) | ((value & mask) << shift);
}

/// A Header is the common header shared by all RTCP packets
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct Header {
    /// If the padding bit is set, this individual RTCP packet contains
    /// some additional padding octets at the end which are not part of
    /// the control information but are included in the length field.
    pub padding: bool,
    /// The number of reception reports or sources contained in this packet (depending on the Type)
    pub count: u8,
    /// The RTCP packet type for this packet
    pub packet_type: PacketType,
    /// The length of this RTCP packet in 32-bit words minus one,
    /// including the header and any padding.
    pub length: u16,
}

impl Header {
    /// Size in bytes of the whole packet this header announces.
    pub fn packet_size(&self) -> usize {
        (self.length as usize + 1) * 4
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} count={} length={}{}",
            self.packet_type,
            self.count,
            self.length,
            if self.padding { " padded" } else { "" }
        )
    }
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH
    }
}

impl Marshal for Header {
    /// Marshal encodes the Header in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if self.count as usize > COUNT_MAX {
            return Err(Error::InvalidHeader);
        }
        if buf.remaining_mut() < HEADER_LENGTH {
            return Err(Error::BufferTooShort);
        }

        /*
         *  0                   1                   2                   3
         *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |V=2|P|    RC   |   PT=SR=200   |             length            |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         */
        let mut b0 = 0u8;
        set_bit_field(&mut b0, RTP_VERSION, VERSION_SHIFT, VERSION_MASK);
        set_bit_field(&mut b0, self.padding as u8, PADDING_SHIFT, PADDING_MASK);
        set_bit_field(&mut b0, self.count, COUNT_SHIFT, COUNT_MASK);

        buf.put_u8(b0);
        buf.put_u8(self.packet_type as u8);
        buf.put_u16(self.length);

        Ok(HEADER_LENGTH)
    }
}

impl Unmarshal for Header {
    /// Unmarshal decodes the Header from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < HEADER_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let b0 = raw_packet.get_u8();
        let version = get_bit_field(b0, VERSION_SHIFT, VERSION_MASK);
        if version != RTP_VERSION {
            return Err(Error::BadVersion);
        }

        let padding = get_bit_field(b0, PADDING_SHIFT, PADDING_MASK) > 0;
        let count = get_bit_field(b0, COUNT_SHIFT, COUNT_MASK);
        let packet_type = PacketType::from(raw_packet.get_u8());
        let length = raw_packet.get_u16();

        Ok(Header {
            padding,
            count,
            packet_type,
            length,
        })
    }
}
