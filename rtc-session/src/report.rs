//! Report content exchanged with the [`Participant`](crate::Participant).

use shared::time::Nanoseconds;

/// State of a local sending stream, or of a remote sender as learned from
/// its sender report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendReport {
    pub sender_source_id: u32,
    /// Empty until the CNAME of the sender is known.
    pub sender_cname: String,
    /// Unix time at which the sender produced the report.
    pub report_timestamp: Nanoseconds,
    /// RTP timestamp matching `report_timestamp`.
    pub stream_timestamp: u32,
    pub packet_count: u32,
    pub byte_count: u64,
    /// Round-trip time to the sender, once estimated.
    pub rtt: Option<Nanoseconds>,
    /// Sender clock minus local clock, once estimated.
    pub clock_offset: Option<Nanoseconds>,
}

/// Reception statistics of one receiving stream about one sender.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecvReport {
    pub receiver_source_id: u32,
    /// Empty until the CNAME of the receiver is known.
    pub receiver_cname: String,
    pub sender_source_id: u32,
    /// Unix time at which the receiver produced the report, zero when the
    /// receiver didn't send a reference time.
    pub report_timestamp: Nanoseconds,
    pub ext_first_seqnum: u32,
    pub ext_last_seqnum: u32,
    /// Fraction of packets lost since the previous report, in [0, 1].
    pub fract_loss: f32,
    /// Packets lost since the beginning, negative when duplicates arrived.
    pub cum_loss: i64,
    /// Interarrival jitter in stream timestamp units.
    pub jitter: u32,
    pub niq_latency: Option<Nanoseconds>,
    pub niq_stalling: Option<Nanoseconds>,
    pub e2e_latency: Option<Nanoseconds>,
    pub rtt: Option<Nanoseconds>,
    pub clock_offset: Option<Nanoseconds>,
}
