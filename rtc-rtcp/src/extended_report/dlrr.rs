use super::*;
use crate::util::{ntp_from_middle, ntp_middle_rounded, ntp_middle_truncated};

const DLRR_REPORT_LENGTH: usize = 12;

/// DLRRReport encodes a single report inside a DLRRReportBlock.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct DLRRReport {
    pub ssrc: u32,
    /// Middle 32 bits of the last RRTR NTP timestamp received from `ssrc`.
    pub last_receiver_report: u32,
    /// Delay since that RRTR was received, in 1/65536 seconds.
    pub delay: u32,
}

impl fmt::Display for DLRRReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ssrc={:#x} lrr={:#x} dlrr={:#x}",
            self.ssrc, self.last_receiver_report, self.delay
        )
    }
}

impl DLRRReport {
    /// NTP timestamp of the last RRTR received, truncated to its middle bits.
    pub fn last_rr(&self) -> u64 {
        ntp_from_middle(self.last_receiver_report)
    }

    pub fn set_last_rr(&mut self, ntp: u64) {
        self.last_receiver_report = ntp_middle_truncated(ntp);
    }

    /// Delay since the last RRTR as an NTP duration.
    pub fn delay_last_rr(&self) -> u64 {
        ntp_from_middle(self.delay)
    }

    pub fn set_delay_last_rr(&mut self, ntp: u64) {
        self.delay = ntp_middle_rounded(ntp);
    }
}

/// DLRRReportBlock encodes a DLRR Report Block as described in
/// RFC 3611 section 4.5.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     BT=5      |   reserved    |         block length          |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |                 SSRC_1 (ssrc of first receiver)               | sub-
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+ block
/// |                         last RR (LRR)                         |   1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   delay since last RR (DLRR)                  |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |                 SSRC_2 (ssrc of second receiver)              | sub-
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+ block
/// :                               ...                             :   2
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct DLRRReportBlock {
    pub reports: Vec<DLRRReport>,
}

impl fmt::Display for DLRRReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DLRR")?;
        for r in &self.reports {
            write!(f, " [{r}]")?;
        }
        Ok(())
    }
}

impl DLRRReportBlock {
    pub fn xr_header(&self) -> XRHeader {
        XRHeader {
            block_type: BlockType::DLRR,
            type_specific: 0,
            block_length: (self.reports.len() * DLRR_REPORT_LENGTH / 4) as u16,
        }
    }
}

impl MarshalSize for DLRRReportBlock {
    fn marshal_size(&self) -> usize {
        XR_HEADER_LENGTH + self.reports.len() * DLRR_REPORT_LENGTH
    }
}

impl Marshal for DLRRReportBlock {
    /// marshal_to encodes the DLRRReportBlock in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let h = self.xr_header();
        let n = h.marshal_to(buf)?;
        buf = &mut buf[n..];

        for rep in &self.reports {
            buf.put_u32(rep.ssrc);
            buf.put_u32(rep.last_receiver_report);
            buf.put_u32(rep.delay);
        }

        Ok(self.marshal_size())
    }
}

impl Unmarshal for DLRRReportBlock {
    /// Unmarshal decodes the DLRRReportBlock from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let xr_header = unmarshal_block_header(raw_packet, 0)?;
        let body_size = xr_header.body_size();
        if body_size % DLRR_REPORT_LENGTH != 0 {
            return Err(Error::DlrrBlockLength);
        }

        let mut reports = Vec::with_capacity(body_size / DLRR_REPORT_LENGTH);
        for _ in 0..body_size / DLRR_REPORT_LENGTH {
            let ssrc = raw_packet.get_u32();
            let last_receiver_report = raw_packet.get_u32();
            let delay = raw_packet.get_u32();
            reports.push(DLRRReport {
                ssrc,
                last_receiver_report,
                delay,
            });
        }

        Ok(DLRRReportBlock { reports })
    }
}
