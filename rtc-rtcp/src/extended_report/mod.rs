
pub mod delay_metrics;
pub mod dlrr;
pub mod measurement_info;
pub mod queue_metrics;
pub mod rrt;
pub mod unknown;

use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

pub use delay_metrics::{DelayMetricsReportBlock, MetricFlag};
pub use dlrr::{DLRRReport, DLRRReportBlock};
pub use measurement_info::MeasurementInfoReportBlock;
pub use queue_metrics::QueueMetricsReportBlock;
pub use rrt::ReceiverReferenceTimeReportBlock;
pub use unknown::UnknownReportBlock;

use crate::header::{HEADER_LENGTH, Header, PacketType, SSRC_LENGTH};
use crate::packet::Packet;
use crate::util::{get_padding_len, get_padding_size, put_padding};

pub(crate) const XR_HEADER_LENGTH: usize = 4;

/// BlockType specifies the type of report in a report block
/// Extended Report block types from RFC 3611, RFC 6776, RFC 6843 and
/// the private range used for queue metrics.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockType {
    #[default]
    Unknown = 0,
    ReceiverReferenceTime = 4, // RFC 3611, section 4.4
    DLRR = 5,                  // RFC 3611, section 4.5
    MeasurementInfo = 14,      // RFC 6776
    DelayMetrics = 16,         // RFC 6843
    QueueMetrics = 220,        // private use
}

impl From<u8> for BlockType {
    fn from(v: u8) -> Self {
        match v {
            4 => BlockType::ReceiverReferenceTime,
            5 => BlockType::DLRR,
            14 => BlockType::MeasurementInfo,
            16 => BlockType::DelayMetrics,
            220 => BlockType::QueueMetrics,
            _ => BlockType::Unknown,
        }
    }
}

/// converts the Extended report block types into readable strings
impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            BlockType::ReceiverReferenceTime => "ReceiverReferenceTimeReportBlockType",
            BlockType::DLRR => "DLRRReportBlockType",
            BlockType::MeasurementInfo => "MeasurementInfoReportBlockType",
            BlockType::DelayMetrics => "DelayMetricsReportBlockType",
            BlockType::QueueMetrics => "QueueMetricsReportBlockType",
            BlockType::Unknown => "UnknownReportBlockType",
        };
        write!(f, "{s}")
    }
}

/// TypeSpecificField as described in RFC 3611 section 4.5. In typical
/// cases, users of ExtendedReports shouldn't need to access this,
/// and should instead use the corresponding fields in the actual
/// report blocks themselves.
pub type TypeSpecificField = u8;

/// XRHeader defines the common fields that must appear at the start
/// of each report block. In typical cases, users of ExtendedReports
/// shouldn't need to access this. For locally-constructed report
/// blocks, these values will not be accurate until the corresponding
/// packet is marshaled.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct XRHeader {
    pub block_type: BlockType,
    pub type_specific: TypeSpecificField,
    pub block_length: u16,
}

impl XRHeader {
    /// Size in bytes of the block body that follows this header.
    pub fn body_size(&self) -> usize {
        self.block_length as usize * 4
    }
}

impl MarshalSize for XRHeader {
    fn marshal_size(&self) -> usize {
        XR_HEADER_LENGTH
    }
}

impl Marshal for XRHeader {
    /// marshal_to encodes the XRHeader in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < XR_HEADER_LENGTH {
            return Err(Error::BufferTooShort);
        }

        buf.put_u8(self.block_type as u8);
        buf.put_u8(self.type_specific);
        buf.put_u16(self.block_length);

        Ok(XR_HEADER_LENGTH)
    }
}

impl Unmarshal for XRHeader {
    /// Unmarshal decodes the XRHeader from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < XR_HEADER_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let block_type: BlockType = raw_packet.get_u8().into();
        let type_specific = raw_packet.get_u8();
        let block_length = raw_packet.get_u16();

        Ok(XRHeader {
            block_type,
            type_specific,
            block_length,
        })
    }
}

/// Reads a block header and checks that the declared body is present and
/// at least `min_body` bytes long.
pub(crate) fn unmarshal_block_header<B: Buf>(raw_packet: &mut B, min_body: usize) -> Result<XRHeader> {
    let xr_header = XRHeader::unmarshal(raw_packet)?;
    let body_size = xr_header.body_size();
    if raw_packet.remaining() < body_size {
        return Err(Error::XrBlockLengthOverflow);
    }
    if body_size < min_body {
        return Err(Error::XrBlockTooShort);
    }
    Ok(xr_header)
}

/// One typed report block of an extended report.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReportBlock {
    ReceiverReferenceTime(ReceiverReferenceTimeReportBlock),
    Dlrr(DLRRReportBlock),
    MeasurementInfo(MeasurementInfoReportBlock),
    DelayMetrics(DelayMetricsReportBlock),
    QueueMetrics(QueueMetricsReportBlock),
    Unknown(UnknownReportBlock),
}

impl ReportBlock {
    pub fn block_type(&self) -> BlockType {
        match self {
            ReportBlock::ReceiverReferenceTime(_) => BlockType::ReceiverReferenceTime,
            ReportBlock::Dlrr(_) => BlockType::DLRR,
            ReportBlock::MeasurementInfo(_) => BlockType::MeasurementInfo,
            ReportBlock::DelayMetrics(_) => BlockType::DelayMetrics,
            ReportBlock::QueueMetrics(_) => BlockType::QueueMetrics,
            ReportBlock::Unknown(_) => BlockType::Unknown,
        }
    }

    /// ssrc values this report block refers to.
    pub fn destination_ssrc(&self) -> Vec<u32> {
        match self {
            ReportBlock::ReceiverReferenceTime(_) | ReportBlock::Unknown(_) => vec![],
            ReportBlock::Dlrr(b) => b.reports.iter().map(|r| r.ssrc).collect(),
            ReportBlock::MeasurementInfo(b) => vec![b.ssrc],
            ReportBlock::DelayMetrics(b) => vec![b.ssrc],
            ReportBlock::QueueMetrics(b) => vec![b.ssrc],
        }
    }
}

impl fmt::Display for ReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportBlock::ReceiverReferenceTime(b) => write!(f, "{b}"),
            ReportBlock::Dlrr(b) => write!(f, "{b}"),
            ReportBlock::MeasurementInfo(b) => write!(f, "{b}"),
            ReportBlock::DelayMetrics(b) => write!(f, "{b}"),
            ReportBlock::QueueMetrics(b) => write!(f, "{b}"),
            ReportBlock::Unknown(b) => write!(f, "{b}"),
        }
    }
}

impl MarshalSize for ReportBlock {
    fn marshal_size(&self) -> usize {
        match self {
            ReportBlock::ReceiverReferenceTime(b) => b.marshal_size(),
            ReportBlock::Dlrr(b) => b.marshal_size(),
            ReportBlock::MeasurementInfo(b) => b.marshal_size(),
            ReportBlock::DelayMetrics(b) => b.marshal_size(),
            ReportBlock::QueueMetrics(b) => b.marshal_size(),
            ReportBlock::Unknown(b) => b.marshal_size(),
        }
    }
}

impl Marshal for ReportBlock {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            ReportBlock::ReceiverReferenceTime(b) => b.marshal_to(buf),
            ReportBlock::Dlrr(b) => b.marshal_to(buf),
            ReportBlock::MeasurementInfo(b) => b.marshal_to(buf),
            ReportBlock::DelayMetrics(b) => b.marshal_to(buf),
            ReportBlock::QueueMetrics(b) => b.marshal_to(buf),
            ReportBlock::Unknown(b) => b.marshal_to(buf),
        }
    }
}

impl Unmarshal for ReportBlock {
    /// Unmarshal decodes the next report block, dispatching on its block type.
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < XR_HEADER_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let block_type: BlockType = raw_packet.chunk()[0].into();
        let block = match block_type {
            BlockType::ReceiverReferenceTime => ReportBlock::ReceiverReferenceTime(
                ReceiverReferenceTimeReportBlock::unmarshal(raw_packet)?,
            ),
            BlockType::DLRR => ReportBlock::Dlrr(DLRRReportBlock::unmarshal(raw_packet)?),
            BlockType::MeasurementInfo => {
                ReportBlock::MeasurementInfo(MeasurementInfoReportBlock::unmarshal(raw_packet)?)
            }
            BlockType::DelayMetrics => {
                ReportBlock::DelayMetrics(DelayMetricsReportBlock::unmarshal(raw_packet)?)
            }
            BlockType::QueueMetrics => {
                ReportBlock::QueueMetrics(QueueMetricsReportBlock::unmarshal(raw_packet)?)
            }
            BlockType::Unknown => ReportBlock::Unknown(UnknownReportBlock::unmarshal(raw_packet)?),
        };

        Ok(block)
    }
}

/// The ExtendedReport packet is an Implementation of RTCP Extended
/// reports defined in RFC 3611. It is used to convey detailed
/// information about an RTP stream. Each packet contains one or
/// more report blocks, each of which conveys a different kind of
/// information.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|reserved |   PT=XR=207   |             length            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                              ssrc                             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// :                         report blocks                         :
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct ExtendedReport {
    pub sender_ssrc: u32,
    pub reports: Vec<ReportBlock>,
}

impl fmt::Display for ExtendedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("ExtendedReport from {:#x}\n", self.sender_ssrc);
        for rep in &self.reports {
            out += format!("\t{rep}\n").as_str();
        }
        write!(f, "{out}")
    }
}

impl Packet for ExtendedReport {
    /// Header returns the Header associated with this packet.
    fn header(&self) -> Header {
        Header {
            padding: get_padding_size(self.raw_size()) != 0,
            count: 0,
            packet_type: PacketType::ExtendedReport,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    /// destination_ssrc returns an array of ssrc values that this packet refers to.
    fn destination_ssrc(&self) -> Vec<u32> {
        let mut ssrc = vec![];
        for p in &self.reports {
            ssrc.extend(p.destination_ssrc());
        }
        ssrc
    }

    fn raw_size(&self) -> usize {
        let mut reps_length = 0;
        for rep in &self.reports {
            reps_length += rep.marshal_size();
        }
        HEADER_LENGTH + SSRC_LENGTH + reps_length
    }
}

impl MarshalSize for ExtendedReport {
    fn marshal_size(&self) -> usize {
        let l = self.raw_size();
        // align to 32-bit boundary
        l + get_padding_size(l)
    }
}

impl Marshal for ExtendedReport {
    /// marshal_to encodes the ExtendedReport in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let h = self.header();
        let n = h.marshal_to(buf)?;
        buf = &mut buf[n..];

        buf.put_u32(self.sender_ssrc);

        for report in &self.reports {
            let n = report.marshal_to(buf)?;
            buf = &mut buf[n..];
        }

        if h.padding {
            put_padding(buf, self.raw_size());
        }

        Ok(self.marshal_size())
    }
}

impl Unmarshal for ExtendedReport {
    /// Unmarshal decodes the ExtendedReport from binary
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let raw_packet_len = raw_packet.remaining();
        if raw_packet_len < (HEADER_LENGTH + SSRC_LENGTH) {
            return Err(Error::PacketTooShort);
        }

        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::ExtendedReport {
            return Err(Error::WrongType);
        }
        if header.packet_size() > raw_packet_len {
            return Err(Error::PacketLengthOverflow);
        }
        if header.packet_size() < HEADER_LENGTH + SSRC_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let mut body = raw_packet.copy_to_bytes(header.packet_size() - HEADER_LENGTH);
        if header.padding {
            let padding_size = get_padding_len(&body)?;
            body.truncate(body.len() - padding_size);
        }
        if body.remaining() < SSRC_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let sender_ssrc = body.get_u32();
        let reports = unmarshal_report_blocks(&mut body)?;

        Ok(ExtendedReport {
            sender_ssrc,
            reports,
        })
    }
}

/// Splits the next report block off `blocks`, bounded by its declared length.
/// Returns `None` once `blocks` is exhausted.
pub(crate) fn next_report_block(blocks: &mut Bytes) -> Result<Option<ReportBlock>> {
    if !blocks.has_remaining() {
        return Ok(None);
    }
    if blocks.remaining() < XR_HEADER_LENGTH {
        return Err(Error::PacketTooShort);
    }

    let block_length = u16::from_be_bytes([blocks[2], blocks[3]]) as usize;
    let block_size = XR_HEADER_LENGTH + block_length * 4;
    if block_size > blocks.remaining() {
        return Err(Error::XrBlockLengthOverflow);
    }

    let mut block = blocks.split_to(block_size);
    ReportBlock::unmarshal(&mut block).map(Some)
}

fn unmarshal_report_blocks(blocks: &mut Bytes) -> Result<Vec<ReportBlock>> {
    let mut reports = vec![];
    while let Some(block) = next_report_block(blocks)? {
        reports.push(block);
    }
    Ok(reports)
}
