#![warn(rust_2018_idioms)]
#![allow(dead_code)]

//! Package rtcp implements encoding and decoding of the RTCP packets a
//! session engine exchanges: sender and receiver reports, source
//! descriptions, goodbyes and extended reports.
//!
//! Inbound compound datagrams are validated and walked with a
//! [`traverser::Traverser`]; outbound datagrams are assembled with a
//! [`composer::Composer`].
//!
//! Decoding an SR from a datagram:
//!
//! ```no_run
//! use rtc_rtcp::traverser::{TraverseItem, Traverser};
//!
//! # fn handle(datagram: &[u8]) -> shared::error::Result<()> {
//! let mut traverser = Traverser::new(datagram);
//! traverser.parse()?;
//! for item in traverser.iter() {
//!     if let TraverseItem::SenderReport(sr) = item {
//!         println!("{sr}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod composer;
pub mod extended_report;
pub mod goodbye;
pub mod header;
pub mod packet;
pub mod receiver_report;
pub mod reception_report;
pub mod sender_report;
pub mod source_description;
pub mod traverser;
mod util;

pub use util::{ntp_from_middle, ntp_middle_clamped, ntp_middle_rounded, ntp_middle_truncated};
