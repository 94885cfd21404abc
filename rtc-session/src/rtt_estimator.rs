//! Round-trip time and clock offset estimation.

use std::collections::VecDeque;

use shared::time::Nanoseconds;

use crate::config::RttConfig;

/// Averaged estimates towards one remote participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RttMetrics {
    /// Remote clock minus local clock.
    pub clock_offset: Nanoseconds,
    pub rtt: Nanoseconds,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: Nanoseconds,
    metrics: RttMetrics,
}

/// RttEstimator derives RTT and clock offset from report/reply exchanges.
///
/// Every exchange is described by four timestamps: the local report was
/// sent at `local_report_ts` and received by the peer at `remote_report_ts`
/// (peer clock), the peer replied at `remote_reply_ts` (peer clock) and the
/// reply arrived at `local_reply_ts`. Metrics are averaged over the samples
/// of the last `interval_duration`.
#[derive(Debug, Clone)]
pub struct RttEstimator {
    config: RttConfig,
    samples: VecDeque<Sample>,
    metrics: Option<RttMetrics>,
}

impl RttEstimator {
    pub fn new(config: RttConfig) -> Self {
        Self {
            config,
            samples: VecDeque::new(),
            metrics: None,
        }
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }

    pub fn metrics(&self) -> Option<RttMetrics> {
        self.metrics
    }

    /// Adds one exchange. Exchanges whose intervals run backwards are
    /// dropped.
    pub fn update(
        &mut self,
        local_report_ts: Nanoseconds,
        remote_report_ts: Nanoseconds,
        remote_reply_ts: Nanoseconds,
        local_reply_ts: Nanoseconds,
    ) {
        let local_elapsed = local_reply_ts - local_report_ts;
        let remote_elapsed = remote_reply_ts - remote_report_ts;
        if local_elapsed < 0 || remote_elapsed < 0 {
            log::debug!(
                "dropping rtt sample with inverted interval: local {local_elapsed} remote {remote_elapsed}"
            );
            return;
        }

        let rtt = (local_elapsed - remote_elapsed).max(0);
        let clock_offset =
            ((remote_report_ts - local_report_ts) + (remote_reply_ts - local_reply_ts)) / 2;

        self.samples.push_back(Sample {
            time: local_reply_ts,
            metrics: RttMetrics { clock_offset, rtt },
        });

        let newest = self
            .samples
            .iter()
            .map(|s| s.time)
            .max()
            .unwrap_or(local_reply_ts);
        self.samples
            .retain(|s| newest - s.time <= self.config.interval_duration);

        let n = self.samples.len() as i128;
        let (rtt_sum, offset_sum) = self.samples.iter().fold((0i128, 0i128), |acc, s| {
            (
                acc.0 + s.metrics.rtt as i128,
                acc.1 + s.metrics.clock_offset as i128,
            )
        });
        self.metrics = Some(RttMetrics {
            clock_offset: (offset_sum / n) as Nanoseconds,
            rtt: (rtt_sum / n) as Nanoseconds,
        });
    }
}
