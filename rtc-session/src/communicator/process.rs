//! Inbound packet processing.

use std::net::SocketAddr;

use rtcp::extended_report::{
    DLRRReport, DelayMetricsReportBlock, MeasurementInfoReportBlock, QueueMetricsReportBlock,
    ReportBlock,
};
use rtcp::ntp_from_middle;
use rtcp::reception_report::ReceptionReport;
use rtcp::traverser::{TraverseItem, Traverser, print_packet};
use shared::TaggedBytesMut;
use shared::error::{Error, Result};
use shared::time::{Nanoseconds, ntp2nanos, ntp2unix, unix2ntp};

use super::Communicator;
use crate::packet::PacketWriter;
use crate::participant::{Participant, ParticipantInfo};
use crate::report::{RecvReport, SendReport};

/// Sender info of an SR.
#[derive(Debug, Clone, Copy)]
struct SenderInfo {
    ntp_time: u64,
    rtp_time: u32,
    packet_count: u32,
    octet_count: u32,
}

/// Everything one datagram says about one remote participant id. Blocks
/// are only kept when they are about the local source id.
#[derive(Debug, Default)]
struct Digest {
    source_id: u32,
    cname: Option<String>,
    sender: Option<SenderInfo>,
    reception: Option<ReceptionReport>,
    goodbye: bool,
    rrtr: Option<u64>,
    dlrr: Option<DLRRReport>,
    measurement: Option<MeasurementInfoReportBlock>,
    delay: Option<DelayMetricsReportBlock>,
    queue: Option<QueueMetricsReportBlock>,
}

fn digest_for(digests: &mut Vec<Digest>, source_id: u32) -> &mut Digest {
    let index = match digests.iter().position(|d| d.source_id == source_id) {
        Some(index) => index,
        None => {
            digests.push(Digest {
                source_id,
                ..Default::default()
            });
            digests.len() - 1
        }
    };
    &mut digests[index]
}

/// Groups the items of a validated datagram by the participant id that
/// sent them, in order of first appearance.
fn digest_packet(traverser: &Traverser<'_>, local_id: u32) -> Vec<Digest> {
    let mut digests = vec![];
    for item in traverser.iter() {
        match item {
            TraverseItem::SenderReport(sr) => {
                let d = digest_for(&mut digests, sr.ssrc);
                d.sender = Some(SenderInfo {
                    ntp_time: sr.ntp_time,
                    rtp_time: sr.rtp_time,
                    packet_count: sr.packet_count,
                    octet_count: sr.octet_count,
                });
                if let Some(block) = sr.reports.iter().find(|r| r.ssrc == local_id) {
                    d.reception = Some(*block);
                }
            }
            TraverseItem::ReceiverReport(rr) => {
                let d = digest_for(&mut digests, rr.ssrc);
                if let Some(block) = rr.reports.iter().find(|r| r.ssrc == local_id) {
                    d.reception = Some(*block);
                }
            }
            TraverseItem::SourceDescription(sdes) => {
                for chunk in &sdes.chunks {
                    let d = digest_for(&mut digests, chunk.source);
                    if let Some(cname) = chunk.cname() {
                        d.cname = Some(String::from_utf8_lossy(cname).into_owned());
                    }
                }
            }
            TraverseItem::Goodbye(bye) => {
                for source in &bye.sources {
                    digest_for(&mut digests, *source).goodbye = true;
                }
            }
            TraverseItem::ExtendedReport(xr) => {
                let d = digest_for(&mut digests, xr.sender_ssrc());
                for block in xr.iter() {
                    match block {
                        ReportBlock::ReceiverReferenceTime(rrtr) => {
                            d.rrtr = Some(rrtr.ntp_timestamp)
                        }
                        ReportBlock::Dlrr(dlrr) => {
                            if let Some(r) = dlrr.reports.iter().find(|r| r.ssrc == local_id) {
                                d.dlrr = Some(*r);
                            }
                        }
                        ReportBlock::MeasurementInfo(mi) if mi.ssrc == local_id => {
                            d.measurement = Some(mi)
                        }
                        ReportBlock::DelayMetrics(dm) if dm.ssrc == local_id => d.delay = Some(dm),
                        ReportBlock::QueueMetrics(qm) if qm.ssrc == local_id => d.queue = Some(qm),
                        _ => {}
                    }
                }
            }
            TraverseItem::Unknown(header) => {
                log::trace!("skipping rtcp packet of type {}", header.packet_type);
            }
        }
    }
    digests
}

/// Expands the middle 32 bits of one of our own NTP timestamps echoed back
/// by a peer, taking the high 16 bits from `now`.
fn expand_middle(middle: u32, now: Nanoseconds) -> Nanoseconds {
    const ERA: u64 = 1 << 48;

    let now_ntp = unix2ntp(now);
    let mut ntp = (now_ntp & !(ERA - 1)) | ntp_from_middle(middle);
    if ntp > now_ntp && ntp >= ERA {
        ntp -= ERA;
    }
    ntp2unix(ntp)
}

impl<P: Participant, W: PacketWriter> Communicator<'_, P, W> {
    /// Consumes one inbound RTCP datagram. The source address of the datagram
    /// is taken from `packet.transport.peer_addr`.
    ///
    /// A malformed datagram is rejected as a whole with
    /// [`Error::ErrMalformedPacket`]. Participant notification errors stop
    /// processing and are returned as is, registry updates made up to that
    /// point stay in place.
    pub fn process_packet(&mut self, packet: &TaggedBytesMut, now: Nanoseconds) -> Result<()> {
        self.ensure_valid()?;
        self.sweep(now);

        let address = packet.transport.peer_addr;
        let mut traverser = Traverser::new(&packet.message[..]);
        if let Err(err) = traverser.parse() {
            log::warn!("dropping malformed rtcp packet from {address}: {err}");
            return Err(Error::ErrMalformedPacket);
        }
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "received rtcp packet from {address}:\n{}",
                print_packet(&packet.message)
            );
        }

        let info = self.participant.participant_info();
        for digest in digest_packet(&traverser, info.source_id) {
            self.apply(&info, digest, address, now)?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        info: &ParticipantInfo,
        digest: Digest,
        address: SocketAddr,
        now: Nanoseconds,
    ) -> Result<()> {
        let source_id = digest.source_id;

        if source_id == info.source_id {
            let known_cname = self
                .registry
                .get(source_id)
                .map(|entry| entry.cname.as_str())
                .filter(|cname| !cname.is_empty());
            match digest.cname.as_deref().filter(|cname| !cname.is_empty()).or(known_cname) {
                Some(cname) if cname == info.cname => {
                    log::debug!("ignoring looped back packet of {source_id:#x}");
                    return Ok(());
                }
                Some(cname) => {
                    log::debug!("source id {source_id:#x} collides with participant {cname}");
                    self.pending_collision = Some(source_id);
                }
                None => {
                    log::debug!("ignoring packet naming local id {source_id:#x} without cname");
                    return Ok(());
                }
            }
        }

        if digest.goodbye {
            if self.registry.remove(source_id).is_some() {
                self.participant.halt_recv_stream(source_id);
            }
            return Ok(());
        }

        let cname_changed = match (self.registry.get(source_id), digest.cname.as_deref()) {
            (Some(entry), Some(cname)) => {
                !entry.cname.is_empty() && !cname.is_empty() && entry.cname != cname
            }
            _ => false,
        };
        if cname_changed {
            log::debug!("participant {source_id:#x} changed its cname");
            self.registry.remove(source_id);
            self.participant.halt_recv_stream(source_id);
        }

        if !self.registry.contains(source_id) {
            self.registry.create(source_id, now)?;
        }

        let has_send_stream = self.participant.has_send_stream();
        let Some(entry) = self.registry.get_mut(source_id) else {
            return Ok(());
        };

        entry.last_activity = now;
        entry.remote_address = Some(address);

        let mut cname_completed = false;
        if let Some(cname) = digest.cname.filter(|c| !c.is_empty()) {
            cname_completed = entry.cname.is_empty();
            entry.cname = cname;
        }

        if let Some(sender) = digest.sender {
            entry.last_sr = Some((sender.ntp_time, now));
        }
        if let Some(rrtr) = digest.rrtr {
            entry.last_rrtr = Some((rrtr, now));
        }

        // our RRTR echoed in a DLRR, the SR timestamps the reply
        if let (Some(dlrr), Some(sender)) = (digest.dlrr, digest.sender)
            && dlrr.last_receiver_report != 0
        {
            let remote_reply = ntp2unix(sender.ntp_time);
            entry.rtt.update(
                expand_middle(dlrr.last_receiver_report, now),
                remote_reply - ntp2nanos(dlrr.delay_last_rr()),
                remote_reply,
                now,
            );
        }
        // our SR echoed in a reception block, the RRTR timestamps the reply
        if let (Some(block), Some(rrtr)) = (digest.reception, digest.rrtr)
            && block.last_sender_report != 0
        {
            let remote_reply = ntp2unix(rrtr);
            entry.rtt.update(
                expand_middle(block.last_sender_report, now),
                remote_reply - ntp2nanos(block.delay_last_sr()),
                remote_reply,
                now,
            );
        }
        let metrics = entry.rtt.metrics();

        let mut send_report = None;
        if let Some(sender) = digest.sender {
            let report = SendReport {
                sender_source_id: source_id,
                sender_cname: entry.cname.clone(),
                report_timestamp: ntp2unix(sender.ntp_time),
                stream_timestamp: sender.rtp_time,
                packet_count: sender.packet_count,
                byte_count: sender.octet_count as u64,
                rtt: metrics.map(|m| m.rtt),
                clock_offset: metrics.map(|m| m.clock_offset),
            };
            entry.send_report = Some(report.clone());
            send_report = Some(report);
        }

        let mut recv_report = None;
        if has_send_stream && let Some(block) = digest.reception {
            let delay = digest.delay.as_ref();
            let queue = digest.queue.as_ref();
            let report = RecvReport {
                receiver_source_id: source_id,
                receiver_cname: entry.cname.clone(),
                sender_source_id: block.ssrc,
                report_timestamp: digest.rrtr.map(ntp2unix).unwrap_or(0),
                ext_first_seqnum: digest
                    .measurement
                    .as_ref()
                    .map(|mi| mi.first_sequence as u32)
                    .unwrap_or(0),
                ext_last_seqnum: block.last_sequence_number,
                fract_loss: block.fract_loss(),
                cum_loss: block.cum_loss(),
                jitter: block.jitter,
                niq_latency: queue
                    .filter(|q| q.has_niq_latency())
                    .map(|q| ntp2nanos(q.niq_latency())),
                niq_stalling: queue
                    .filter(|q| q.has_niq_stalling())
                    .map(|q| ntp2nanos(q.niq_stalling())),
                e2e_latency: delay
                    .filter(|d| d.has_e2e_latency())
                    .map(|d| ntp2nanos(d.e2e_latency())),
                rtt: metrics.map(|m| m.rtt).or_else(|| {
                    delay
                        .filter(|d| d.has_mean_rtt())
                        .map(|d| ntp2nanos(d.mean_rtt()))
                }),
                clock_offset: metrics.map(|m| m.clock_offset),
            };
            entry.recv_report = Some(report.clone());
            recv_report = Some(report);
        }

        // a cname arriving after the numbers completes the cached reports
        if cname_completed {
            let cname = entry.cname.clone();
            if send_report.is_none()
                && let Some(report) = entry.send_report.as_mut()
            {
                report.sender_cname = cname.clone();
                send_report = Some(report.clone());
            }
            if recv_report.is_none()
                && has_send_stream
                && let Some(report) = entry.recv_report.as_mut()
            {
                report.receiver_cname = cname;
                recv_report = Some(report.clone());
            }
        }

        if let Some(report) = send_report {
            self.participant
                .notify_recv_stream(source_id, &report)
                .inspect_err(|err| log::warn!("notify_recv_stream({source_id:#x}) failed: {err}"))?;
        }
        if let Some(report) = recv_report {
            self.participant
                .notify_send_stream(source_id, &report)
                .inspect_err(|err| log::warn!("notify_send_stream({source_id:#x}) failed: {err}"))?;
        }
        Ok(())
    }
}
