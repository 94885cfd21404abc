//! The session engine tying participant, registry and wire format together.

mod generate;
mod process;

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use rtcp::composer::Composer;
use rtcp::goodbye::Goodbye;
use rtcp::source_description::SourceDescription;
use shared::arena::{Arena, BufferFactory};
use shared::error::{Error, Result};
use shared::time::Nanoseconds;
use shared::{TaggedBytesMut, TransportContext};

use crate::config::Config;
use crate::packet::PacketWriter;
use crate::participant::{Participant, ParticipantInfo};
use crate::stream_registry::StreamRegistry;

/// Communicator exchanges RTCP reports on behalf of one local participant.
///
/// It never reads a clock or touches a socket: the host calls
/// [`generate_reports`](Communicator::generate_reports) whenever reports are
/// due, feeds every inbound RTCP datagram to
/// [`process_packet`](Communicator::process_packet) and forwards whatever
/// the writer receives. Remote participants that stay silent longer than the
/// configured inactivity timeout are dropped during any of these calls.
///
/// The communicator owns its participant and writer. Both traits are
/// implemented for `&mut T`, so a host that keeps ownership can pass a
/// mutable reference instead. The buffer factory and arena are borrowed for
/// the whole lifetime of the communicator.
pub struct Communicator<'a, P: Participant, W: PacketWriter> {
    config: Config,
    participant: P,
    writer: W,
    buffer_factory: &'a BufferFactory<'a>,
    registry: StreamRegistry<'a>,
    /// Local id found colliding with a remote participant, left on the next
    /// report generation.
    pending_collision: Option<u32>,
    valid: bool,
}

impl<'a, P: Participant, W: PacketWriter> Communicator<'a, P, W> {
    pub fn new(
        config: Config,
        participant: P,
        writer: W,
        buffer_factory: &'a BufferFactory<'a>,
        arena: &'a dyn Arena,
    ) -> Self {
        let valid = config.is_valid() && buffer_factory.buffer_size() > 0;
        if !valid {
            log::warn!(
                "invalid communicator configuration {config:?} with buffer size {}",
                buffer_factory.buffer_size()
            );
        }

        Self {
            config,
            participant,
            writer,
            buffer_factory,
            registry: StreamRegistry::new(arena, config.rtt),
            pending_collision: None,
            valid,
        }
    }

    /// Whether the communicator was constructed with a usable configuration.
    /// Every operation of an invalid communicator fails.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of remote participants currently tracked.
    pub fn num_streams(&self) -> usize {
        self.registry.len()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn participant(&self) -> &P {
        &self.participant
    }

    pub fn participant_mut(&mut self) -> &mut P {
        &mut self.participant
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Error::OtherSessionErr("communicator is not valid".to_owned()))
        }
    }

    /// Drops silent remote participants and tells the participant about each.
    fn sweep(&mut self, now: Nanoseconds) {
        for source_id in self.registry.sweep(now, self.config.inactivity_timeout) {
            self.participant.halt_recv_stream(source_id);
        }
    }

    /// Largest compound datagram this communicator may produce.
    fn max_packet_size(&self) -> usize {
        self.config
            .max_packet_size
            .min(self.buffer_factory.buffer_size())
    }

    /// Addresses outbound packets go to: the configured report address, or
    /// every distinct address remote participants were heard from.
    fn destinations(&self, info: &ParticipantInfo) -> Vec<SocketAddr> {
        if info.report_back {
            self.registry.remote_addresses()
        } else {
            vec![info.report_address]
        }
    }

    /// Serializes `composer` into a fresh buffer from the factory.
    fn compose(&self, composer: &Composer) -> Result<BytesMut> {
        let mut buf = self.buffer_factory.new_buffer()?;
        composer.compose(&mut buf).map_err(|err| match err {
            Error::BufferTooShort => Error::ErrInsufficientBufferSpace,
            err => err,
        })?;
        Ok(buf)
    }

    /// A goodbye for `source_id`, preceded by its CNAME when SDES is enabled
    /// so receivers don't take the goodbye for an unknown participant.
    fn goodbye_composer(&self, cname: &str, source_id: u32) -> Result<Composer> {
        let mut composer = Composer::new(self.max_packet_size());
        if self.config.enable_sdes {
            composer.push(Box::new(SourceDescription::with_cname(source_id, cname)));
        }
        composer.push(Box::new(Goodbye {
            sources: vec![source_id],
            reason: Bytes::new(),
        }));

        if !composer.fits(0) {
            return Err(Error::ErrInsufficientBufferSpace);
        }
        Ok(composer)
    }

    /// Builds one goodbye datagram per destination.
    fn goodbye_packets(
        &self,
        info: &ParticipantInfo,
        source_id: u32,
    ) -> Result<Vec<(SocketAddr, BytesMut)>> {
        let destinations = self.destinations(info);
        if destinations.is_empty() {
            return Ok(vec![]);
        }

        let composer = self.goodbye_composer(&info.cname, source_id)?;
        destinations
            .into_iter()
            .map(|address| Ok((address, self.compose(&composer)?)))
            .collect()
    }

    /// Hands built datagrams to the writer in order. The first writer error
    /// stops the remaining writes and is returned as is, datagrams written
    /// before it are not taken back.
    fn write_packets(
        &mut self,
        now: Nanoseconds,
        packets: Vec<(SocketAddr, BytesMut)>,
    ) -> Result<()> {
        for (address, message) in packets {
            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "sending rtcp packet to {address}:\n{}",
                    rtcp::traverser::print_packet(&message)
                );
            }

            let packet = TaggedBytesMut {
                now,
                transport: TransportContext {
                    peer_addr: address,
                    ..Default::default()
                },
                message,
            };
            if let Err(err) = self.writer.write(packet) {
                log::warn!("failed to write rtcp packet to {address}: {err}");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Sends a goodbye for the local participant, to the same destinations
    /// reports go to.
    pub fn generate_goodbye(&mut self, now: Nanoseconds) -> Result<()> {
        self.ensure_valid()?;
        self.sweep(now);

        let info = self.participant.participant_info();
        let packets = self.goodbye_packets(&info, info.source_id)?;
        self.write_packets(now, packets)
    }

    /// Leaves the colliding `source_id` and asks the participant for a new
    /// one. The collision stays pending when the goodbye couldn't be sent.
    fn resolve_collision(
        &mut self,
        now: Nanoseconds,
        info: &ParticipantInfo,
        source_id: u32,
    ) -> Result<()> {
        let packets = self.goodbye_packets(info, source_id)?;
        self.write_packets(now, packets)?;

        log::debug!("left colliding source id {source_id:#x}");
        self.pending_collision = None;
        self.participant.change_source_id();
        Ok(())
    }
}
