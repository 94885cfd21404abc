#![warn(rust_2018_idioms)]

//! RTC Session - Sans-IO RTCP session engine.
//!
//! A [`Communicator`] exchanges RTCP reports between one local
//! [`Participant`] and the remote participants it hears from. The host owns
//! the clock and the socket: it calls into the communicator with the
//! current time and forwards the datagrams handed to the [`PacketWriter`].
//!
//! # Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | [`Communicator::generate_reports`] | Queries the participant and sends SR/RR, SDES and XR packets |
//! | [`Communicator::generate_goodbye`] | Sends a BYE for the local participant |
//! | [`Communicator::process_packet`] | Parses an inbound datagram and notifies the participant |
//! | [`Communicator::num_streams`] | Number of remote participants currently tracked |
//!
//! # Stream lifecycle
//!
//! ```text
//! unknown --(SR/RR/SDES/XR naming it, local reception report about it)--> active
//! active --(BYE, timeout, cname change)--> removed
//! ```
//!
//! A remote participant announcing the local source id with a different
//! CNAME is a collision. It is tracked and its reports are forwarded like any
//! other, and the next [`Communicator::generate_reports`] sends a BYE for the
//! old id and calls [`Participant::change_source_id`]. The same id with the
//! local CNAME is our own traffic looped back and is ignored.
//!
//! # Quick Start
//!
//! ```
//! use rtc_session::{Communicator, Config, Participant, ParticipantInfo, Queue};
//! use shared::arena::{BufferFactory, HeapArena};
//! use shared::time::SECOND;
//!
//! struct Receiver;
//!
//! impl Participant for Receiver {
//!     fn participant_info(&self) -> ParticipantInfo {
//!         ParticipantInfo {
//!             cname: "receiver@example.com".to_owned(),
//!             source_id: 0x1234,
//!             report_address: "127.0.0.1:5005".parse().unwrap(),
//!             report_back: false,
//!         }
//!     }
//!
//!     fn change_source_id(&mut self) {}
//! }
//!
//! let arena = HeapArena::new();
//! let factory = BufferFactory::new(&arena, 1500);
//! let mut communicator =
//!     Communicator::new(Config::default(), Receiver, Queue::new(), &factory, &arena);
//! assert!(communicator.is_valid());
//!
//! // nothing is sent or received yet
//! communicator.generate_reports(10 * SECOND).unwrap();
//! assert!(communicator.writer().is_empty());
//! assert_eq!(communicator.num_streams(), 0);
//! ```

mod communicator;
mod config;
mod packet;
mod participant;
mod report;
mod rtt_estimator;
mod stream_registry;

pub use communicator::Communicator;
pub use config::{Config, DEFAULT_MAX_PACKET_SIZE, RttConfig};
pub use packet::{PacketWriter, Queue};
pub use participant::{Participant, ParticipantInfo};
pub use report::{RecvReport, SendReport};
pub use rtt_estimator::{RttEstimator, RttMetrics};
