use super::*;
use crate::util::{ntp_from_middle, ntp_middle_rounded};

const MEASUREMENT_INFO_BLOCK_LENGTH: usize = 28;

/// MeasurementInfoReportBlock encodes a Measurement Information report
/// block as described in RFC 6776.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     BT=14     |    Reserved   |      block length=7           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     SSRC of stream source                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            Reserved.          |    first sequence number      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           extended first sequence number of interval          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 extended last sequence number                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |              Measurement Duration (Interval)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |              Measurement Duration (Cumulative) - Seconds      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |              Measurement Duration (Cumulative) - Fraction     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct MeasurementInfoReportBlock {
    pub ssrc: u32,
    /// Sequence number of the first packet of the reporting session.
    pub first_sequence: u16,
    pub interval_first_sequence: u32,
    pub interval_last_sequence: u32,
    /// Interval duration in 16.16 fixed point.
    pub interval: u32,
    /// Cumulative duration in 32.32 fixed point.
    pub cumulative: u64,
}

impl fmt::Display for MeasurementInfoReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl MeasurementInfoReportBlock {
    pub fn xr_header(&self) -> XRHeader {
        XRHeader {
            block_type: BlockType::MeasurementInfo,
            type_specific: 0,
            block_length: (MEASUREMENT_INFO_BLOCK_LENGTH / 4) as u16,
        }
    }

    /// Interval duration as an NTP duration.
    pub fn interval_duration(&self) -> u64 {
        ntp_from_middle(self.interval)
    }

    pub fn set_interval_duration(&mut self, ntp: u64) {
        self.interval = ntp_middle_rounded(ntp);
    }

    /// Cumulative duration as an NTP duration.
    pub fn cum_duration(&self) -> u64 {
        self.cumulative
    }

    pub fn set_cum_duration(&mut self, ntp: u64) {
        self.cumulative = ntp;
    }
}

impl MarshalSize for MeasurementInfoReportBlock {
    fn marshal_size(&self) -> usize {
        XR_HEADER_LENGTH + MEASUREMENT_INFO_BLOCK_LENGTH
    }
}

impl Marshal for MeasurementInfoReportBlock {
    /// marshal_to encodes the MeasurementInfoReportBlock in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let h = self.xr_header();
        let n = h.marshal_to(buf)?;
        buf = &mut buf[n..];

        buf.put_u32(self.ssrc);
        buf.put_u16(0);
        buf.put_u16(self.first_sequence);
        buf.put_u32(self.interval_first_sequence);
        buf.put_u32(self.interval_last_sequence);
        buf.put_u32(self.interval);
        buf.put_u64(self.cumulative);

        Ok(self.marshal_size())
    }
}

impl Unmarshal for MeasurementInfoReportBlock {
    /// Unmarshal decodes the MeasurementInfoReportBlock from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let xr_header = unmarshal_block_header(raw_packet, MEASUREMENT_INFO_BLOCK_LENGTH)?;

        let ssrc = raw_packet.get_u32();
        let _reserved = raw_packet.get_u16();
        let first_sequence = raw_packet.get_u16();
        let interval_first_sequence = raw_packet.get_u32();
        let interval_last_sequence = raw_packet.get_u32();
        let interval = raw_packet.get_u32();
        let cumulative = raw_packet.get_u64();
        raw_packet.advance(xr_header.body_size() - MEASUREMENT_INFO_BLOCK_LENGTH);

        Ok(MeasurementInfoReportBlock {
            ssrc,
            first_sequence,
            interval_first_sequence,
            interval_last_sequence,
            interval,
            cumulative,
        })
    }
}
