use super::*;

/// UnknownReportBlock is used to store bytes for any report block
/// that has an unknown Report Block Type.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct UnknownReportBlock {
    /// Block type as found on the wire.
    pub block_type: u8,
    pub type_specific: TypeSpecificField,
    /// Block body following the block header.
    pub bytes: Bytes,
}

impl fmt::Display for UnknownReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown BT={} length={}",
            self.block_type,
            self.bytes.len()
        )
    }
}

impl MarshalSize for UnknownReportBlock {
    fn marshal_size(&self) -> usize {
        let l = XR_HEADER_LENGTH + self.bytes.len();
        l + get_padding_size(l)
    }
}

impl Marshal for UnknownReportBlock {
    /// marshal_to encodes the UnknownReportBlock in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        buf.put_u8(self.block_type);
        buf.put_u8(self.type_specific);
        buf.put_u16(((self.marshal_size() - XR_HEADER_LENGTH) / 4) as u16);
        buf.put(self.bytes.clone());
        put_padding(buf, self.bytes.len());

        Ok(self.marshal_size())
    }
}

impl Unmarshal for UnknownReportBlock {
    /// Unmarshal decodes the UnknownReportBlock from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < XR_HEADER_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let block_type = raw_packet.get_u8();
        let type_specific = raw_packet.get_u8();
        let body_size = raw_packet.get_u16() as usize * 4;
        if raw_packet.remaining() < body_size {
            return Err(Error::XrBlockLengthOverflow);
        }

        let bytes = raw_packet.copy_to_bytes(body_size);

        Ok(UnknownReportBlock {
            block_type,
            type_specific,
            bytes,
        })
    }
}
