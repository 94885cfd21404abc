//! Bookkeeping of remote participants discovered through inbound reports.

use std::collections::HashMap;
use std::mem;
use std::net::SocketAddr;

use shared::arena::Arena;
use shared::error::{Error, Result};
use shared::time::Nanoseconds;

use crate::config::RttConfig;
use crate::report::{RecvReport, SendReport};
use crate::rtt_estimator::RttEstimator;

/// Number of entries the registry holds before it asks the arena for more.
pub(crate) const PREALLOCATED_STREAMS: usize = 8;

/// Progress of the measurement interval reported about one remote sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MeasurementInterval {
    pub(crate) first_time: Nanoseconds,
    pub(crate) last_time: Nanoseconds,
    pub(crate) last_seqnum: u32,
}

/// What the communicator knows about one remote participant id.
#[derive(Debug, Clone)]
pub(crate) struct StreamEntry {
    pub(crate) source_id: u32,
    /// Empty until an SDES carrying it was received.
    pub(crate) cname: String,
    /// Source address of the last packet naming this id.
    pub(crate) remote_address: Option<SocketAddr>,
    /// Last report the remote sent about its own stream.
    pub(crate) send_report: Option<SendReport>,
    /// Last report the remote sent about the local send stream.
    pub(crate) recv_report: Option<RecvReport>,
    /// NTP time of the last SR and local time of its arrival.
    pub(crate) last_sr: Option<(u64, Nanoseconds)>,
    /// NTP time of the last RRTR and local time of its arrival.
    pub(crate) last_rrtr: Option<(u64, Nanoseconds)>,
    pub(crate) rtt: RttEstimator,
    /// Interval of the last measurement info block sent about this sender.
    pub(crate) measurement: Option<MeasurementInterval>,
    pub(crate) last_activity: Nanoseconds,
    seq: u64,
}

impl StreamEntry {
    fn new(source_id: u32, now: Nanoseconds, rtt: RttConfig, seq: u64) -> Self {
        Self {
            source_id,
            cname: String::new(),
            remote_address: None,
            send_report: None,
            recv_report: None,
            last_sr: None,
            last_rrtr: None,
            rtt: RttEstimator::new(rtt),
            measurement: None,
            last_activity: now,
            seq,
        }
    }
}

/// StreamRegistry holds exactly one entry per remote participant id.
///
/// Iteration helpers return entries in creation order so generated packets
/// are deterministic.
pub(crate) struct StreamRegistry<'a> {
    arena: &'a dyn Arena,
    rtt: RttConfig,
    entries: HashMap<u32, StreamEntry>,
    capacity: usize,
    next_seq: u64,
}

impl<'a> StreamRegistry<'a> {
    pub(crate) fn new(arena: &'a dyn Arena, rtt: RttConfig) -> Self {
        Self {
            arena,
            rtt,
            entries: HashMap::with_capacity(PREALLOCATED_STREAMS),
            capacity: PREALLOCATED_STREAMS,
            next_seq: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn contains(&self, source_id: u32) -> bool {
        self.entries.contains_key(&source_id)
    }

    pub(crate) fn get(&self, source_id: u32) -> Option<&StreamEntry> {
        self.entries.get(&source_id)
    }

    pub(crate) fn get_mut(&mut self, source_id: u32) -> Option<&mut StreamEntry> {
        self.entries.get_mut(&source_id)
    }

    /// Adds an entry for `source_id`. Growing past the current capacity
    /// needs the arena's consent, a refusal leaves the registry unchanged.
    pub(crate) fn create(&mut self, source_id: u32, now: Nanoseconds) -> Result<&mut StreamEntry> {
        if self.entries.contains_key(&source_id) {
            return Err(Error::OtherSessionErr(format!(
                "stream {source_id:#x} already registered"
            )));
        }

        if self.entries.len() >= self.capacity {
            let grow = self.capacity.max(1);
            if let Err(err) = self.arena.reserve(grow * mem::size_of::<StreamEntry>()) {
                log::warn!("arena refused to grow stream registry: {err}");
                return Err(Error::ErrOutOfMemory);
            }
            self.capacity += grow;
            self.entries.reserve(grow);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let rtt = self.rtt;
        log::debug!("creating stream {source_id:#x}");

        Ok(self
            .entries
            .entry(source_id)
            .or_insert_with(|| StreamEntry::new(source_id, now, rtt, seq)))
    }

    pub(crate) fn remove(&mut self, source_id: u32) -> Option<StreamEntry> {
        let entry = self.entries.remove(&source_id);
        if entry.is_some() {
            log::debug!("removing stream {source_id:#x}");
        }
        entry
    }

    /// Removes entries silent for strictly longer than `timeout` and returns
    /// their ids in creation order.
    pub(crate) fn sweep(&mut self, now: Nanoseconds, timeout: Nanoseconds) -> Vec<u32> {
        let mut expired: Vec<&StreamEntry> = self
            .entries
            .values()
            .filter(|e| now - e.last_activity > timeout)
            .collect();
        expired.sort_by_key(|e| e.seq);
        let ids: Vec<u32> = expired.into_iter().map(|e| e.source_id).collect();

        for id in &ids {
            log::debug!("stream {id:#x} timed out");
            self.entries.remove(id);
        }
        ids
    }

    /// Entries in creation order.
    pub(crate) fn ordered(&self) -> Vec<&StreamEntry> {
        let mut entries: Vec<&StreamEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }

    /// Distinct remote addresses in the order their entries were created.
    pub(crate) fn remote_addresses(&self) -> Vec<SocketAddr> {
        let mut addresses = vec![];
        for entry in self.ordered() {
            if let Some(address) = entry.remote_address
                && !addresses.contains(&address)
            {
                addresses.push(address);
            }
        }
        addresses
    }
}
