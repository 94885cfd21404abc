//! Validation and lazy iteration over inbound compound RTCP datagrams.
//!
//! A [`Traverser`] first checks the whole datagram with [`Traverser::parse`]
//! and only then hands out items. Extended reports are exposed through an
//! [`XrTraverser`] so their blocks are decoded one at a time.


use std::fmt::Write;

use bytes::Bytes;
use shared::error::{Error, Result};
use shared::marshal::Unmarshal;

use crate::extended_report::{ExtendedReport, ReportBlock, next_report_block};
use crate::goodbye::Goodbye;
use crate::header::{HEADER_LENGTH, Header, PacketType, SSRC_LENGTH};
use crate::receiver_report::ReceiverReport;
use crate::sender_report::SenderReport;
use crate::source_description::SourceDescription;
use crate::util::get_padding_len;

/// One packet of a compound datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum TraverseItem<'a> {
    SenderReport(SenderReport),
    ReceiverReport(ReceiverReport),
    SourceDescription(SourceDescription),
    Goodbye(Goodbye),
    ExtendedReport(XrTraverser<'a>),
    /// A packet type this crate doesn't decode.
    Unknown(Header),
}

/// Traverser walks a compound RTCP datagram.
#[derive(Debug, Clone)]
pub struct Traverser<'a> {
    buf: &'a [u8],
    parsed: bool,
}

impl<'a> Traverser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Traverser { buf, parsed: false }
    }

    /// Validates the structure of the whole datagram: every packet header
    /// is version 2, declared lengths tile the datagram exactly, padding is
    /// consistent and every known packet decodes.
    pub fn parse(&mut self) -> Result<()> {
        self.parsed = false;

        if self.buf.is_empty() {
            return Err(Error::EmptyCompound);
        }

        let mut rest = self.buf;
        while !rest.is_empty() {
            let (header, packet, tail) = split_packet(rest)?;
            decode_item(&header, packet)?;
            rest = tail;
        }

        self.parsed = true;
        Ok(())
    }

    /// Iterates over the packets in arrival order. Yields nothing until
    /// [`Traverser::parse`] has succeeded. Every call starts from the
    /// beginning of the datagram.
    pub fn iter(&self) -> TraverserIter<'a> {
        TraverserIter {
            rest: if self.parsed { self.buf } else { &[] },
        }
    }
}

/// Iterator returned by [`Traverser::iter`].
#[derive(Debug, Clone)]
pub struct TraverserIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for TraverserIter<'a> {
    type Item = TraverseItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        match split_packet(self.rest).and_then(|(header, packet, tail)| {
            decode_item(&header, packet).map(|item| (item, tail))
        }) {
            Ok((item, tail)) => {
                self.rest = tail;
                Some(item)
            }
            Err(_) => {
                self.rest = &[];
                None
            }
        }
    }
}

fn split_packet(buf: &[u8]) -> Result<(Header, &[u8], &[u8])> {
    let header = Header::unmarshal(&mut &buf[..])?;
    let size = header.packet_size();
    if size > buf.len() {
        return Err(Error::PacketLengthOverflow);
    }
    if header.padding {
        get_padding_len(&buf[HEADER_LENGTH..size])?;
    }
    Ok((header, &buf[..size], &buf[size..]))
}

fn decode_item<'a>(header: &Header, packet: &'a [u8]) -> Result<TraverseItem<'a>> {
    let raw = &mut &packet[..];
    let item = match header.packet_type {
        PacketType::SenderReport => TraverseItem::SenderReport(SenderReport::unmarshal(raw)?),
        PacketType::ReceiverReport => TraverseItem::ReceiverReport(ReceiverReport::unmarshal(raw)?),
        PacketType::SourceDescription => {
            TraverseItem::SourceDescription(SourceDescription::unmarshal(raw)?)
        }
        PacketType::Goodbye => TraverseItem::Goodbye(Goodbye::unmarshal(raw)?),
        PacketType::ExtendedReport => {
            let mut xr = XrTraverser::new(packet);
            xr.parse()?;
            TraverseItem::ExtendedReport(xr)
        }
        PacketType::ApplicationDefined | PacketType::Unsupported => {
            TraverseItem::Unknown(header.clone())
        }
    };
    Ok(item)
}

/// XrTraverser walks the report blocks of a single extended report packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrTraverser<'a> {
    packet: &'a [u8],
    sender_ssrc: u32,
}

impl<'a> XrTraverser<'a> {
    pub fn new(packet: &'a [u8]) -> Self {
        let sender_ssrc = if packet.len() >= HEADER_LENGTH + SSRC_LENGTH {
            u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]])
        } else {
            0
        };
        XrTraverser {
            packet,
            sender_ssrc,
        }
    }

    /// Validates the packet and every block in it.
    pub fn parse(&mut self) -> Result<()> {
        ExtendedReport::unmarshal(&mut &self.packet[..]).map(|_| ())
    }

    /// SSRC of the participant that sent this extended report.
    pub fn sender_ssrc(&self) -> u32 {
        self.sender_ssrc
    }

    /// Iterates over the report blocks in packet order.
    pub fn iter(&self) -> XrBlockIter {
        XrBlockIter {
            blocks: self.blocks().unwrap_or_default(),
        }
    }

    fn blocks(&self) -> Result<Bytes> {
        let header = Header::unmarshal(&mut &self.packet[..])?;
        let mut end = header.packet_size().min(self.packet.len());
        if header.padding {
            end -= get_padding_len(&self.packet[HEADER_LENGTH..end])?;
        }
        let start = HEADER_LENGTH + SSRC_LENGTH;
        if end < start {
            return Err(Error::PacketTooShort);
        }
        Ok(Bytes::copy_from_slice(&self.packet[start..end]))
    }
}

/// Iterator returned by [`XrTraverser::iter`].
#[derive(Debug, Clone)]
pub struct XrBlockIter {
    blocks: Bytes,
}

impl Iterator for XrBlockIter {
    type Item = ReportBlock;

    fn next(&mut self) -> Option<Self::Item> {
        match next_report_block(&mut self.blocks) {
            Ok(block) => block,
            Err(_) => {
                self.blocks.clear();
                None
            }
        }
    }
}

/// Renders every packet of a compound datagram in human readable form.
pub fn print_packet(buf: &[u8]) -> String {
    let mut traverser = Traverser::new(buf);
    if let Err(err) = traverser.parse() {
        return format!("malformed rtcp packet ({} bytes): {err}\n", buf.len());
    }

    let mut out = String::new();
    for item in traverser.iter() {
        let _ = match item {
            TraverseItem::SenderReport(p) => write!(out, "{p}"),
            TraverseItem::ReceiverReport(p) => write!(out, "{p}"),
            TraverseItem::SourceDescription(p) => write!(out, "{p}"),
            TraverseItem::Goodbye(p) => write!(out, "{p}"),
            TraverseItem::ExtendedReport(xr) => {
                let _ = writeln!(out, "ExtendedReport from {:#x}", xr.sender_ssrc());
                let mut res = Ok(());
                for block in xr.iter() {
                    res = res.and(writeln!(out, "\t{block}"));
                }
                res
            }
            TraverseItem::Unknown(h) => writeln!(out, "Unknown packet: {h}"),
        };
    }
    out
}
