//! Caller-supplied time.
//!
//! The session layer never reads a clock by itself. Every entry point takes
//! `now` as signed nanoseconds since the unix epoch, and wire formats carry
//! 64-bit NTP timestamps (32.32 fixed point since 1900). This module converts
//! between the two domains.


/// Signed nanoseconds, used both for unix timestamps and for durations.
pub type Nanoseconds = i64;

pub const NANOSECOND: Nanoseconds = 1;
pub const MICROSECOND: Nanoseconds = 1_000 * NANOSECOND;
pub const MILLISECOND: Nanoseconds = 1_000 * MICROSECOND;
pub const SECOND: Nanoseconds = 1_000 * MILLISECOND;
pub const MINUTE: Nanoseconds = 60 * SECOND;

/// Offset in seconds between unix epoch and ntp epoch.
const NTP_EPOCH_OFFSET: i128 = 0x83AA7E80;

const NANOS_PER_SEC: i128 = SECOND as i128;

/// unix2ntp converts a unix timestamp into a 64-bit NTP timestamp.
///
/// Times before the NTP epoch map to zero, times past the NTP era saturate.
pub fn unix2ntp(unix: Nanoseconds) -> u64 {
    let u = unix as i128 + NTP_EPOCH_OFFSET * NANOS_PER_SEC;
    if u <= 0 {
        return 0;
    }

    let s = u / NANOS_PER_SEC;
    if s > u32::MAX as i128 {
        return u64::MAX;
    }
    let f = ((u % NANOS_PER_SEC) << 32) / NANOS_PER_SEC;

    ((s as u64) << 32) | f as u64
}

/// ntp2unix converts a 64-bit NTP timestamp into a unix timestamp.
pub fn ntp2unix(ntp: u64) -> Nanoseconds {
    let s = (ntp >> 32) as i128;
    let f = (ntp & 0xFFFF_FFFF) as i128;
    let frac = (f * NANOS_PER_SEC + (1 << 31)) >> 32;

    ((s - NTP_EPOCH_OFFSET) * NANOS_PER_SEC + frac) as Nanoseconds
}

/// nanos2ntp converts a duration into 32.32 fixed point.
///
/// Negative durations map to zero.
pub fn nanos2ntp(duration: Nanoseconds) -> u64 {
    if duration <= 0 {
        return 0;
    }

    let d = duration as i128;
    let s = d / NANOS_PER_SEC;
    if s > u32::MAX as i128 {
        return u64::MAX;
    }
    let f = (((d % NANOS_PER_SEC) << 32) + NANOS_PER_SEC / 2) / NANOS_PER_SEC;

    ((s as u64) << 32).saturating_add(f as u64)
}

/// ntp2nanos converts a 32.32 fixed point duration into nanoseconds.
pub fn ntp2nanos(duration: u64) -> Nanoseconds {
    let s = (duration >> 32) as i128;
    let f = (duration & 0xFFFF_FFFF) as i128;
    let frac = (f * NANOS_PER_SEC + (1 << 31)) >> 32;

    (s * NANOS_PER_SEC + frac) as Nanoseconds
}
