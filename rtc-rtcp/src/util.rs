#[cfg(test)]
mod util_test;

use shared::error::{Error, Result};

/// Sentinel stored in 32-bit metric fields whose value is absent.
pub(crate) const METRIC_ABSENT_32: u32 = u32::MAX;
/// Largest 32-bit metric value a setter may store.
pub(crate) const METRIC_MAX_32: u32 = u32::MAX - 1;
/// Sentinel stored in 64-bit metric fields whose value is absent.
pub(crate) const METRIC_ABSENT_64: u64 = u64::MAX;
/// Largest 64-bit metric value a setter may store.
pub(crate) const METRIC_MAX_64: u64 = u64::MAX - 1;

// returns the padding required to make the length a multiple of 4
pub(crate) fn get_padding_size(len: usize) -> usize {
    if len % 4 == 0 { 0 } else { 4 - (len % 4) }
}

/// Writes zero bytes into `buf` until `offset` reaches a 4-byte boundary.
pub(crate) fn put_padding(buf: &mut [u8], offset: usize) -> usize {
    let padding_size = get_padding_size(offset);
    for b in buf.iter_mut().take(padding_size) {
        *b = 0;
    }
    padding_size
}

/// Reads the padding count stored in the last octet of a padded packet
/// body and checks that it fits inside the body.
pub(crate) fn get_padding_len(body: &[u8]) -> Result<usize> {
    match body.last() {
        Some(&n) if n > 0 && n as usize <= body.len() => Ok(n as usize),
        _ => Err(Error::WrongPadding),
    }
}

/// Middle 32 bits of a 64-bit NTP value, dropping the lower 16 bits.
///
/// Used for timestamps (LSR, LRR) where the high 16 bits of the seconds
/// are implied by the receiver's own clock.
pub fn ntp_middle_truncated(ntp: u64) -> u32 {
    (ntp >> 16) as u32
}

/// Middle 32 bits of a 64-bit NTP duration, rounded to nearest.
///
/// Durations that don't fit 16.16 saturate at `0xFFFFFFFF`.
pub fn ntp_middle_rounded(ntp: u64) -> u32 {
    if ntp >> 48 != 0 {
        return u32::MAX;
    }
    let rounded = (ntp + 0x8000) >> 16;
    if rounded > u32::MAX as u64 {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Like [`ntp_middle_rounded`] but never produces the absent sentinel.
pub fn ntp_middle_clamped(ntp: u64) -> u32 {
    ntp_middle_rounded(ntp).min(METRIC_MAX_32)
}

/// Expands a 16.16 middle value back to a 64-bit NTP value.
pub fn ntp_from_middle(middle: u32) -> u64 {
    (middle as u64) << 16
}
