use super::*;
use crate::header::{get_bit_field, set_bit_field};
use crate::util::*;

const DELAY_METRICS_BLOCK_LENGTH: usize = 24;
const METRIC_FLAG_SHIFT: u32 = 6;
const METRIC_FLAG_MASK: u8 = 0x3;

/// MetricFlag tells over which span of the session a delay metric was measured.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum MetricFlag {
    Reserved = 0,
    Sampled = 1,
    #[default]
    Interval = 2,
    Cumulative = 3,
}

impl From<u8> for MetricFlag {
    fn from(v: u8) -> Self {
        match v {
            1 => MetricFlag::Sampled,
            2 => MetricFlag::Interval,
            3 => MetricFlag::Cumulative,
            _ => MetricFlag::Reserved,
        }
    }
}

/// DelayMetricsReportBlock encodes a Delay Metrics report block as
/// described in RFC 6843. Round trip values are 16.16 fixed point and
/// the end system delay is 32.32 fixed point; all of them read as absent
/// until set.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     BT=16     | I |   resv.   |      block length=6           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     SSRC of Source                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                Mean Network Round-Trip Delay                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Min Network Round-Trip Delay                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Max Network Round-Trip Delay                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                End System Delay - Seconds (bit 0-31)          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                End System Delay - Fraction (bit 0-31)         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DelayMetricsReportBlock {
    pub metric_flag: MetricFlag,
    pub ssrc: u32,
    pub mean_round_trip: u32,
    pub min_round_trip: u32,
    pub max_round_trip: u32,
    pub end_system_delay: u64,
}

impl Default for DelayMetricsReportBlock {
    fn default() -> Self {
        DelayMetricsReportBlock {
            metric_flag: MetricFlag::default(),
            ssrc: 0,
            mean_round_trip: METRIC_ABSENT_32,
            min_round_trip: METRIC_ABSENT_32,
            max_round_trip: METRIC_ABSENT_32,
            end_system_delay: METRIC_ABSENT_64,
        }
    }
}

impl fmt::Display for DelayMetricsReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl DelayMetricsReportBlock {
    pub fn xr_header(&self) -> XRHeader {
        let mut type_specific = 0u8;
        set_bit_field(
            &mut type_specific,
            self.metric_flag as u8,
            METRIC_FLAG_SHIFT,
            METRIC_FLAG_MASK,
        );
        XRHeader {
            block_type: BlockType::DelayMetrics,
            type_specific,
            block_length: (DELAY_METRICS_BLOCK_LENGTH / 4) as u16,
        }
    }

    /// Marks every metric absent.
    pub fn reset(&mut self) {
        self.mean_round_trip = METRIC_ABSENT_32;
        self.min_round_trip = METRIC_ABSENT_32;
        self.max_round_trip = METRIC_ABSENT_32;
        self.end_system_delay = METRIC_ABSENT_64;
    }

    pub fn has_mean_rtt(&self) -> bool {
        self.mean_round_trip != METRIC_ABSENT_32
    }

    /// Mean round trip as an NTP duration.
    pub fn mean_rtt(&self) -> u64 {
        ntp_from_middle(self.mean_round_trip)
    }

    pub fn set_mean_rtt(&mut self, ntp: u64) {
        self.mean_round_trip = ntp_middle_clamped(ntp);
    }

    pub fn has_min_rtt(&self) -> bool {
        self.min_round_trip != METRIC_ABSENT_32
    }

    pub fn min_rtt(&self) -> u64 {
        ntp_from_middle(self.min_round_trip)
    }

    pub fn set_min_rtt(&mut self, ntp: u64) {
        self.min_round_trip = ntp_middle_clamped(ntp);
    }

    pub fn has_max_rtt(&self) -> bool {
        self.max_round_trip != METRIC_ABSENT_32
    }

    pub fn max_rtt(&self) -> u64 {
        ntp_from_middle(self.max_round_trip)
    }

    pub fn set_max_rtt(&mut self, ntp: u64) {
        self.max_round_trip = ntp_middle_clamped(ntp);
    }

    pub fn has_e2e_latency(&self) -> bool {
        self.end_system_delay != METRIC_ABSENT_64
    }

    pub fn e2e_latency(&self) -> u64 {
        self.end_system_delay
    }

    pub fn set_e2e_latency(&mut self, ntp: u64) {
        self.end_system_delay = ntp.min(METRIC_MAX_64);
    }
}

impl MarshalSize for DelayMetricsReportBlock {
    fn marshal_size(&self) -> usize {
        XR_HEADER_LENGTH + DELAY_METRICS_BLOCK_LENGTH
    }
}

impl Marshal for DelayMetricsReportBlock {
    /// marshal_to encodes the DelayMetricsReportBlock in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let h = self.xr_header();
        let n = h.marshal_to(buf)?;
        buf = &mut buf[n..];

        buf.put_u32(self.ssrc);
        buf.put_u32(self.mean_round_trip);
        buf.put_u32(self.min_round_trip);
        buf.put_u32(self.max_round_trip);
        buf.put_u64(self.end_system_delay);

        Ok(self.marshal_size())
    }
}

impl Unmarshal for DelayMetricsReportBlock {
    /// Unmarshal decodes the DelayMetricsReportBlock from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let xr_header = unmarshal_block_header(raw_packet, DELAY_METRICS_BLOCK_LENGTH)?;
        let metric_flag = MetricFlag::from(get_bit_field(
            xr_header.type_specific,
            METRIC_FLAG_SHIFT,
            METRIC_FLAG_MASK,
        ));

        let ssrc = raw_packet.get_u32();
        let mean_round_trip = raw_packet.get_u32();
        let min_round_trip = raw_packet.get_u32();
        let max_round_trip = raw_packet.get_u32();
        let end_system_delay = raw_packet.get_u64();
        raw_packet.advance(xr_header.body_size() - DELAY_METRICS_BLOCK_LENGTH);

        Ok(DelayMetricsReportBlock {
            metric_flag,
            ssrc,
            mean_round_trip,
            min_round_trip,
            max_round_trip,
            end_system_delay,
        })
    }
}
