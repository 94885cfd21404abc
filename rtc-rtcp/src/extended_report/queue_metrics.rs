use super::*;
use crate::util::*;

const QUEUE_METRICS_BLOCK_LENGTH: usize = 12;

/// QueueMetricsReportBlock reports how long packets waited in the
/// receiver's network incoming queue (NIQ) and how long playback stalled
/// because that queue ran dry. Both values are 16.16 fixed point and read
/// as absent until set.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     BT=220    |   reserved    |      block length=3           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     SSRC of Source                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Network Incoming Queue Latency               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Network Incoming Queue Stalling              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct QueueMetricsReportBlock {
    pub ssrc: u32,
    pub queue_latency: u32,
    pub queue_stalling: u32,
}

impl Default for QueueMetricsReportBlock {
    fn default() -> Self {
        QueueMetricsReportBlock {
            ssrc: 0,
            queue_latency: METRIC_ABSENT_32,
            queue_stalling: METRIC_ABSENT_32,
        }
    }
}

impl fmt::Display for QueueMetricsReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueMetrics ssrc={:#x} niq_latency={:#x} niq_stalling={:#x}",
            self.ssrc, self.queue_latency, self.queue_stalling
        )
    }
}

impl QueueMetricsReportBlock {
    pub fn xr_header(&self) -> XRHeader {
        XRHeader {
            block_type: BlockType::QueueMetrics,
            type_specific: 0,
            block_length: (QUEUE_METRICS_BLOCK_LENGTH / 4) as u16,
        }
    }

    pub fn reset(&mut self) {
        self.queue_latency = METRIC_ABSENT_32;
        self.queue_stalling = METRIC_ABSENT_32;
    }

    pub fn has_niq_latency(&self) -> bool {
        self.queue_latency != METRIC_ABSENT_32
    }

    pub fn niq_latency(&self) -> u64 {
        ntp_from_middle(self.queue_latency)
    }

    pub fn set_niq_latency(&mut self, ntp: u64) {
        self.queue_latency = ntp_middle_clamped(ntp);
    }

    pub fn has_niq_stalling(&self) -> bool {
        self.queue_stalling != METRIC_ABSENT_32
    }

    pub fn niq_stalling(&self) -> u64 {
        ntp_from_middle(self.queue_stalling)
    }

    pub fn set_niq_stalling(&mut self, ntp: u64) {
        self.queue_stalling = ntp_middle_clamped(ntp);
    }
}

impl MarshalSize for QueueMetricsReportBlock {
    fn marshal_size(&self) -> usize {
        XR_HEADER_LENGTH + QUEUE_METRICS_BLOCK_LENGTH
    }
}

impl Marshal for QueueMetricsReportBlock {
    /// marshal_to encodes the QueueMetricsReportBlock in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let h = self.xr_header();
        let n = h.marshal_to(buf)?;
        buf = &mut buf[n..];

        buf.put_u32(self.ssrc);
        buf.put_u32(self.queue_latency);
        buf.put_u32(self.queue_stalling);

        Ok(self.marshal_size())
    }
}

impl Unmarshal for QueueMetricsReportBlock {
    /// Unmarshal decodes the QueueMetricsReportBlock from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let xr_header = unmarshal_block_header(raw_packet, QUEUE_METRICS_BLOCK_LENGTH)?;

        let ssrc = raw_packet.get_u32();
        let queue_latency = raw_packet.get_u32();
        let queue_stalling = raw_packet.get_u32();
        raw_packet.advance(xr_header.body_size() - QUEUE_METRICS_BLOCK_LENGTH);

        Ok(QueueMetricsReportBlock {
            ssrc,
            queue_latency,
            queue_stalling,
        })
    }
}
