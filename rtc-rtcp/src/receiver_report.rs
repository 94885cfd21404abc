
use std::fmt;

use bytes::{Buf, BufMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::header::*;
use crate::packet::Packet;
use crate::reception_report::*;
use crate::util::*;

const RR_FIXED_LENGTH: usize = HEADER_LENGTH + SSRC_LENGTH;

/// A ReceiverReport (RR) carries reception statistics of a participant
/// that does not send media itself.
///
/// Profile-specific extensions following the reception blocks are skipped
/// on decoding and never produced.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct ReceiverReport {
    pub ssrc: u32,
    pub reports: Vec<ReceptionReport>,
}

impl fmt::Display for ReceiverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ReceiverReport from {:#x}", self.ssrc)?;
        for report in &self.reports {
            writeln!(f, "\t{report}")?;
        }
        Ok(())
    }
}

impl Packet for ReceiverReport {
    fn header(&self) -> Header {
        Header {
            padding: false,
            count: self.reports.len() as u8,
            packet_type: PacketType::ReceiverReport,
            length: (self.raw_size() / 4 - 1) as u16,
        }
    }

    fn destination_ssrc(&self) -> Vec<u32> {
        self.reports.iter().map(|r| r.ssrc).collect()
    }

    fn raw_size(&self) -> usize {
        RR_FIXED_LENGTH + self.reports.len() * RECEPTION_REPORT_LENGTH
    }
}

impl MarshalSize for ReceiverReport {
    fn marshal_size(&self) -> usize {
        self.raw_size()
    }
}

impl Marshal for ReceiverReport {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if self.reports.len() > COUNT_MAX {
            return Err(Error::TooManyReports);
        }
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort);
        }

        let n = self.header().marshal_to(buf)?;
        buf = &mut buf[n..];
        buf.put_u32(self.ssrc);
        for report in &self.reports {
            let n = report.marshal_to(buf)?;
            buf = &mut buf[n..];
        }
        Ok(self.marshal_size())
    }
}

impl Unmarshal for ReceiverReport {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let available = raw_packet.remaining();
        if available < RR_FIXED_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::ReceiverReport {
            return Err(Error::WrongType);
        }
        let size = header.packet_size();
        if size > available {
            return Err(Error::PacketLengthOverflow);
        }
        let reports_len = header.count as usize * RECEPTION_REPORT_LENGTH;
        if size < RR_FIXED_LENGTH + reports_len {
            return Err(Error::PacketTooShort);
        }

        let ssrc = raw_packet.get_u32();
        let reports = (0..header.count)
            .map(|_| ReceptionReport::unmarshal(raw_packet))
            .collect::<Result<Vec<_>>>()?;

        let tail = raw_packet.copy_to_bytes(size - RR_FIXED_LENGTH - reports_len);
        if header.padding {
            get_padding_len(&tail)?;
        }

        Ok(ReceiverReport { ssrc, reports })
    }
}
