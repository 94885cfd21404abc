use std::fmt;

use shared::marshal::Marshal;

use crate::header::Header;

/// Packet represents an RTCP packet that can be placed in a compound
/// datagram by a [`crate::composer::Composer`].
pub trait Packet: Marshal + fmt::Display + fmt::Debug {
    fn header(&self) -> Header;
    /// SSRC values this packet refers to.
    fn destination_ssrc(&self) -> Vec<u32>;
    /// Size of the packet before trailing padding is applied.
    fn raw_size(&self) -> usize;
}
