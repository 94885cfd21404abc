//! Communicator configuration.

use serde::{Deserialize, Serialize};
use shared::time::{Nanoseconds, SECOND};

/// Default upper bound of an outbound compound packet, fits an IPv4 UDP
/// datagram on a 1500 byte MTU.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1460;

/// Round-trip time estimation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RttConfig {
    /// Length of the sliding window the metrics are averaged over.
    pub interval_duration: Nanoseconds,
}

impl Default for RttConfig {
    fn default() -> Self {
        Self {
            interval_duration: 5 * SECOND,
        }
    }
}

impl RttConfig {
    pub fn with_interval_duration(mut self, interval_duration: Nanoseconds) -> Self {
        self.interval_duration = interval_duration;
        self
    }
}

/// Configuration of a [`Communicator`](crate::Communicator).
///
/// The snapshot is taken at construction and never changes afterwards.
///
/// # Example
///
/// ```
/// use rtc_session::Config;
/// use shared::time::SECOND;
///
/// let config = Config::default()
///     .with_enable_xr(false)
///     .with_inactivity_timeout(30 * SECOND);
/// assert!(config.enable_sr_rr);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Emit sender and receiver reports.
    pub enable_sr_rr: bool,
    /// Emit extended reports.
    pub enable_xr: bool,
    /// Emit source descriptions.
    pub enable_sdes: bool,
    /// Remote streams silent for longer than this are removed.
    pub inactivity_timeout: Nanoseconds,
    /// Upper bound of a single outbound compound packet.
    pub max_packet_size: usize,
    pub rtt: RttConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_sr_rr: true,
            enable_xr: true,
            enable_sdes: true,
            inactivity_timeout: 10 * SECOND,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            rtt: RttConfig::default(),
        }
    }
}

impl Config {
    pub fn with_enable_sr_rr(mut self, enable: bool) -> Self {
        self.enable_sr_rr = enable;
        self
    }

    pub fn with_enable_xr(mut self, enable: bool) -> Self {
        self.enable_xr = enable;
        self
    }

    pub fn with_enable_sdes(mut self, enable: bool) -> Self {
        self.enable_sdes = enable;
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Nanoseconds) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }

    pub fn with_rtt(mut self, rtt: RttConfig) -> Self {
        self.rtt = rtt;
        self
    }

    /// A configuration that can't produce anything useful.
    pub(crate) fn is_valid(&self) -> bool {
        self.inactivity_timeout > 0 && self.rtt.interval_duration > 0 && self.max_packet_size > 0
    }
}
