//! Local side of a session as seen by the communicator.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use shared::error::Result;
use shared::time::Nanoseconds;

use crate::report::{RecvReport, SendReport};

/// Identity and addressing of the local participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub cname: String,
    /// Current local SSRC.
    pub source_id: u32,
    /// Destination of outbound reports unless `report_back` is set.
    pub report_address: SocketAddr,
    /// Send reports back to every remote address packets were received from.
    pub report_back: bool,
}

impl Default for ParticipantInfo {
    fn default() -> Self {
        Self {
            cname: String::new(),
            source_id: 0,
            report_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            report_back: false,
        }
    }
}

/// Participant is implemented by the owner of the local media streams.
///
/// The communicator pulls report content from it when generating packets
/// and pushes what it learned from remote peers when processing packets.
/// A participant that only sends, or only receives, keeps the defaults for
/// the other half.
pub trait Participant {
    fn participant_info(&self) -> ParticipantInfo;

    /// Asks the participant to pick a new local SSRC after a collision.
    fn change_source_id(&mut self);

    fn has_send_stream(&self) -> bool {
        false
    }

    fn query_send_stream(&mut self, _now: Nanoseconds) -> SendReport {
        SendReport::default()
    }

    /// A remote receiver reported on the local send stream.
    fn notify_send_stream(&mut self, _recv_source_id: u32, _recv_report: &RecvReport) -> Result<()> {
        Ok(())
    }

    fn num_recv_streams(&self) -> usize {
        0
    }

    fn query_recv_streams(&mut self, _now: Nanoseconds) -> Vec<RecvReport> {
        vec![]
    }

    /// A remote sender reported on its own stream.
    fn notify_recv_stream(&mut self, _send_source_id: u32, _send_report: &SendReport) -> Result<()> {
        Ok(())
    }

    /// A remote participant left or went silent.
    fn halt_recv_stream(&mut self, _send_source_id: u32) {}
}

impl<T: Participant + ?Sized> Participant for &mut T {
    fn participant_info(&self) -> ParticipantInfo {
        (**self).participant_info()
    }

    fn change_source_id(&mut self) {
        (**self).change_source_id()
    }

    fn has_send_stream(&self) -> bool {
        (**self).has_send_stream()
    }

    fn query_send_stream(&mut self, now: Nanoseconds) -> SendReport {
        (**self).query_send_stream(now)
    }

    fn notify_send_stream(&mut self, recv_source_id: u32, recv_report: &RecvReport) -> Result<()> {
        (**self).notify_send_stream(recv_source_id, recv_report)
    }

    fn num_recv_streams(&self) -> usize {
        (**self).num_recv_streams()
    }

    fn query_recv_streams(&mut self, now: Nanoseconds) -> Vec<RecvReport> {
        (**self).query_recv_streams(now)
    }

    fn notify_recv_stream(&mut self, send_source_id: u32, send_report: &SendReport) -> Result<()> {
        (**self).notify_recv_stream(send_source_id, send_report)
    }

    fn halt_recv_stream(&mut self, send_source_id: u32) {
        (**self).halt_recv_stream(send_source_id)
    }
}
