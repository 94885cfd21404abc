//! Outbound report generation.

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use rtcp::composer::Composer;
use rtcp::extended_report::{
    DLRRReport, DLRRReportBlock, DelayMetricsReportBlock, ExtendedReport,
    MeasurementInfoReportBlock, QueueMetricsReportBlock, ReceiverReferenceTimeReportBlock,
    ReportBlock,
};
use rtcp::header::COUNT_MAX;
use rtcp::receiver_report::ReceiverReport;
use rtcp::reception_report::ReceptionReport;
use rtcp::sender_report::SenderReport;
use rtcp::source_description::SourceDescription;
use shared::error::{Error, Result};
use shared::marshal::MarshalSize;
use shared::time::{Nanoseconds, nanos2ntp, unix2ntp};

use super::Communicator;
use crate::packet::PacketWriter;
use crate::participant::{Participant, ParticipantInfo};
use crate::report::{RecvReport, SendReport};
use crate::stream_registry::MeasurementInterval;

/// Smallest piece of report content. Units are never split across packets.
#[derive(Debug, Clone)]
enum Unit {
    /// Everything the local participant reports about one remote sender.
    Reception {
        block: Option<ReceptionReport>,
        blocks: Vec<ReportBlock>,
    },
    /// Answer to the last RRTR of one remote receiver.
    Dlrr(DLRRReport),
}

/// One compound packet under construction.
struct Draft {
    sender: Option<SenderReport>,
    receiver: Option<ReceiverReport>,
    sdes: Option<SourceDescription>,
    xr: ExtendedReport,
    dlrr: DLRRReportBlock,
    units: usize,
}

impl Draft {
    fn size(&self) -> usize {
        let mut size = 0;
        if let Some(sr) = &self.sender {
            size += sr.marshal_size();
        }
        if let Some(rr) = &self.receiver {
            size += rr.marshal_size();
        }
        if let Some(sdes) = &self.sdes {
            size += sdes.marshal_size();
        }
        if !self.dlrr.reports.is_empty() {
            size += self.xr.marshal_size() + self.dlrr.marshal_size();
        } else if !self.xr.reports.is_empty() {
            size += self.xr.marshal_size();
        }
        size
    }

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn reception_reports(&mut self) -> Option<&mut Vec<ReceptionReport>> {
        match (&mut self.sender, &mut self.receiver) {
            (Some(sr), _) => Some(&mut sr.reports),
            (None, Some(rr)) => Some(&mut rr.reports),
            (None, None) => None,
        }
    }

    /// Adds `unit` unless the packet would exceed `max_size` or the
    /// reception block count limit.
    fn try_push(&mut self, unit: &Unit, max_size: usize) -> bool {
        match unit {
            Unit::Reception { block, blocks } => {
                let mut pushed_block = false;
                if let (Some(block), Some(reports)) = (block, self.reception_reports()) {
                    if reports.len() >= COUNT_MAX {
                        return false;
                    }
                    reports.push(*block);
                    pushed_block = true;
                }
                let xr_len = self.xr.reports.len();
                self.xr.reports.extend(blocks.iter().cloned());

                if self.size() > max_size {
                    self.xr.reports.truncate(xr_len);
                    if pushed_block && let Some(reports) = self.reception_reports() {
                        reports.pop();
                    }
                    return false;
                }
            }
            Unit::Dlrr(report) => {
                self.dlrr.reports.push(*report);
                if self.size() > max_size {
                    self.dlrr.reports.pop();
                    return false;
                }
            }
        }

        self.units += 1;
        true
    }

    fn into_composer(self, max_size: usize) -> Composer {
        let mut composer = Composer::new(max_size);
        if let Some(sr) = self.sender {
            composer.push(Box::new(sr));
        }
        if let Some(rr) = self.receiver {
            composer.push(Box::new(rr));
        }
        if let Some(sdes) = self.sdes {
            composer.push(Box::new(sdes));
        }

        let mut xr = self.xr;
        if !self.dlrr.reports.is_empty() {
            xr.reports.push(ReportBlock::Dlrr(self.dlrr));
        }
        if !xr.reports.is_empty() {
            composer.push(Box::new(xr));
        }
        composer
    }
}

impl<P: Participant, W: PacketWriter> Communicator<'_, P, W> {
    /// Queries the participant and sends its reports.
    ///
    /// A pending collision is resolved instead: a goodbye for the colliding
    /// id is sent and the participant is asked for a new id.
    ///
    /// Remote senders named by the participant's reception reports are
    /// registered before silent participants are dropped, so a sender that
    /// already timed out is not brought back. When the call fails, the
    /// entries it registered are removed again.
    ///
    /// All packets are built before the first one is written, so allocation
    /// and size failures write nothing. A writer error stops at the failing
    /// packet: the packets handed to the writer before it stay written.
    pub fn generate_reports(&mut self, now: Nanoseconds) -> Result<()> {
        self.ensure_valid()?;

        let info = self.participant.participant_info();
        if let Some(source_id) = self.pending_collision {
            self.sweep(now);
            return self.resolve_collision(now, &info, source_id);
        }

        let send = if self.participant.has_send_stream() {
            Some(self.participant.query_send_stream(now))
        } else {
            None
        };
        let recv = if self.participant.num_recv_streams() > 0 {
            self.participant.query_recv_streams(now)
        } else {
            vec![]
        };

        let registered = self.register_senders(&recv, now)?;
        self.sweep(now);
        if send.is_none() && recv.is_empty() {
            log::trace!("nothing to report for {:#x}", info.source_id);
            return Ok(());
        }

        if let Err(err) = self.send_reports(&info, send.as_ref(), &recv, now) {
            self.forget(&registered);
            return Err(err);
        }
        if self.config.enable_xr {
            self.advance_intervals(&recv, now);
        }
        Ok(())
    }

    /// Creates an entry for every reported sender the registry doesn't know
    /// yet and returns their ids. Nothing stays registered on failure.
    fn register_senders(&mut self, recv: &[RecvReport], now: Nanoseconds) -> Result<Vec<u32>> {
        let mut registered = vec![];
        for report in recv {
            let source_id = report.sender_source_id;
            if self.registry.contains(source_id) {
                continue;
            }
            if let Err(err) = self.registry.create(source_id, now).map(|_| ()) {
                self.forget(&registered);
                return Err(err);
            }
            registered.push(source_id);
        }
        Ok(registered)
    }

    fn forget(&mut self, source_ids: &[u32]) {
        for source_id in source_ids {
            self.registry.remove(*source_id);
        }
    }

    fn send_reports(
        &mut self,
        info: &ParticipantInfo,
        send: Option<&SendReport>,
        recv: &[RecvReport],
        now: Nanoseconds,
    ) -> Result<()> {
        let max_size = self.max_packet_size();
        let receiving = !recv.is_empty();
        let mut packets: Vec<(SocketAddr, BytesMut)> = vec![];
        for (address, units) in self.report_groups(info, send.is_some(), recv, now) {
            for draft in self.split(info, send, receiving, &units, max_size, now)? {
                packets.push((address, self.compose(&draft.into_composer(max_size))?));
            }
        }
        self.write_packets(now, packets)
    }

    /// Partitions the report content by destination.
    fn report_groups(
        &self,
        info: &ParticipantInfo,
        sending: bool,
        recv: &[RecvReport],
        now: Nanoseconds,
    ) -> Vec<(SocketAddr, Vec<Unit>)> {
        let mut receptions: Vec<(u32, Unit)> = recv
            .iter()
            .map(|report| (report.sender_source_id, self.reception_unit(report, now)))
            .collect();
        if sending && self.config.enable_xr {
            receptions.extend(self.registry.ordered().into_iter().filter_map(|entry| {
                let (ntp, received_at) = entry.last_rrtr?;
                let mut report = DLRRReport {
                    ssrc: entry.source_id,
                    ..Default::default()
                };
                report.set_last_rr(ntp);
                report.set_delay_last_rr(nanos2ntp(now - received_at));
                Some((entry.source_id, Unit::Dlrr(report)))
            }));
        }

        if !info.report_back {
            let units = receptions.into_iter().map(|(_, unit)| unit).collect();
            return vec![(info.report_address, units)];
        }

        self.registry
            .remote_addresses()
            .into_iter()
            .map(|address| {
                let units = receptions
                    .iter()
                    .filter(|(source_id, _)| {
                        self.registry
                            .get(*source_id)
                            .is_some_and(|entry| entry.remote_address == Some(address))
                    })
                    .map(|(_, unit)| unit.clone())
                    .collect();
                (address, units)
            })
            .collect()
    }

    /// Packs `units` greedily into as few packets as `max_size` allows.
    fn split(
        &self,
        info: &ParticipantInfo,
        send: Option<&SendReport>,
        receiving: bool,
        units: &[Unit],
        max_size: usize,
        now: Nanoseconds,
    ) -> Result<Vec<Draft>> {
        let mut drafts = vec![];
        let mut draft = self.new_draft(info, send, receiving, now);
        if draft.size() > max_size {
            return Err(Error::ErrInsufficientBufferSpace);
        }

        for unit in units {
            if draft.try_push(unit, max_size) {
                continue;
            }
            if draft.units == 0 {
                return Err(Error::ErrInsufficientBufferSpace);
            }
            drafts.push(draft);
            draft = self.new_draft(info, send, receiving, now);
            if !draft.try_push(unit, max_size) {
                return Err(Error::ErrInsufficientBufferSpace);
            }
        }

        if !draft.is_empty() {
            drafts.push(draft);
        }
        Ok(drafts)
    }

    /// The per-packet part of every report: SR or RR, SDES and the XR
    /// header with the receiver reference time.
    fn new_draft(
        &self,
        info: &ParticipantInfo,
        send: Option<&SendReport>,
        receiving: bool,
        now: Nanoseconds,
    ) -> Draft {
        let mut draft = Draft {
            sender: None,
            receiver: None,
            sdes: None,
            xr: ExtendedReport {
                sender_ssrc: info.source_id,
                reports: vec![],
            },
            dlrr: DLRRReportBlock::default(),
            units: 0,
        };

        if self.config.enable_sr_rr {
            if let Some(send) = send {
                draft.sender = Some(SenderReport {
                    ssrc: info.source_id,
                    ntp_time: unix2ntp(send.report_timestamp),
                    rtp_time: send.stream_timestamp,
                    packet_count: send.packet_count,
                    octet_count: send.byte_count as u32,
                    reports: vec![],
                    profile_extensions: Bytes::new(),
                });
            } else if receiving {
                draft.receiver = Some(ReceiverReport {
                    ssrc: info.source_id,
                    reports: vec![],
                });
            }
        }
        if self.config.enable_sdes {
            draft.sdes = Some(SourceDescription::with_cname(info.source_id, &info.cname));
        }
        if self.config.enable_xr && receiving {
            draft
                .xr
                .reports
                .push(ReportBlock::ReceiverReferenceTime(ReceiverReferenceTimeReportBlock {
                    ntp_timestamp: unix2ntp(now),
                }));
        }
        draft
    }

    /// Reception block and XR blocks about the sender of `report`.
    fn reception_unit(&self, report: &RecvReport, now: Nanoseconds) -> Unit {
        let entry = self.registry.get(report.sender_source_id);

        let block = self.config.enable_sr_rr.then(|| {
            let mut block = ReceptionReport {
                ssrc: report.sender_source_id,
                last_sequence_number: report.ext_last_seqnum,
                jitter: report.jitter,
                ..Default::default()
            };
            block.set_fract_loss(report.fract_loss);
            block.set_cum_loss(report.cum_loss);
            if let Some((ntp, received_at)) = entry.and_then(|e| e.last_sr) {
                block.set_last_sr(ntp);
                block.set_delay_last_sr(nanos2ntp(now - received_at));
            }
            block
        });

        let mut blocks = vec![];
        if self.config.enable_xr {
            blocks.push(ReportBlock::MeasurementInfo(self.measurement_info(report, now)));

            let rtt = report
                .rtt
                .or_else(|| entry.and_then(|e| e.rtt.metrics()).map(|m| m.rtt));
            if rtt.is_some() || report.e2e_latency.is_some() {
                let mut delay = DelayMetricsReportBlock {
                    ssrc: report.sender_source_id,
                    ..Default::default()
                };
                if let Some(rtt) = rtt {
                    delay.set_mean_rtt(nanos2ntp(rtt));
                }
                if let Some(e2e) = report.e2e_latency {
                    delay.set_e2e_latency(nanos2ntp(e2e));
                }
                blocks.push(ReportBlock::DelayMetrics(delay));
            }

            if report.niq_latency.is_some() || report.niq_stalling.is_some() {
                let mut queue = QueueMetricsReportBlock {
                    ssrc: report.sender_source_id,
                    ..Default::default()
                };
                if let Some(latency) = report.niq_latency {
                    queue.set_niq_latency(nanos2ntp(latency));
                }
                if let Some(stalling) = report.niq_stalling {
                    queue.set_niq_stalling(nanos2ntp(stalling));
                }
                blocks.push(ReportBlock::QueueMetrics(queue));
            }
        }

        Unit::Reception { block, blocks }
    }

    /// Only the low 16 bits of the first extended sequence number fit the
    /// block, the interval boundaries keep all 32.
    fn measurement_info(
        &self,
        report: &RecvReport,
        now: Nanoseconds,
    ) -> MeasurementInfoReportBlock {
        let previous = self
            .registry
            .get(report.sender_source_id)
            .and_then(|entry| entry.measurement);
        let (interval_first, interval, cumulative) = match previous {
            Some(mi) => (
                mi.last_seqnum.wrapping_add(1),
                now - mi.last_time,
                now - mi.first_time,
            ),
            None => (report.ext_first_seqnum, 0, 0),
        };

        let mut block = MeasurementInfoReportBlock {
            ssrc: report.sender_source_id,
            first_sequence: report.ext_first_seqnum as u16,
            interval_first_sequence: interval_first,
            interval_last_sequence: report.ext_last_seqnum,
            ..Default::default()
        };
        block.set_interval_duration(nanos2ntp(interval));
        block.set_cum_duration(nanos2ntp(cumulative));
        block
    }

    /// The interval lives in the sender's entry and ends with it.
    fn advance_intervals(&mut self, recv: &[RecvReport], now: Nanoseconds) {
        for report in recv {
            let Some(entry) = self.registry.get_mut(report.sender_source_id) else {
                continue;
            };
            match &mut entry.measurement {
                Some(mi) => {
                    mi.last_time = now;
                    mi.last_seqnum = report.ext_last_seqnum;
                }
                None => {
                    entry.measurement = Some(MeasurementInterval {
                        first_time: now,
                        last_time: now,
                        last_seqnum: report.ext_last_seqnum,
                    });
                }
            }
        }
    }
}
