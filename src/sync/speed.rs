//! Download speed and remaining-time estimation.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding-window estimator over chunk completion times.
///
/// Keeps the last `window` completion timestamps; speed is derived from the
/// span between the oldest and newest, so a stall decays the estimate as
/// soon as the next chunk lands. One estimator lives for one sync run.
#[derive(Debug)]
pub struct SpeedEstimator {
    times: VecDeque<Instant>,
    window: usize,
    chunk_size: u64,
}

impl SpeedEstimator {
    /// Create an estimator for chunks of `chunk_size` blocks.
    pub fn new(window: usize, chunk_size: u64) -> Self {
        debug_assert!(window > 0);
        Self {
            times: VecDeque::with_capacity(window),
            window,
            chunk_size,
        }
    }

    /// Record a chunk completion.
    pub fn record(&mut self, at: Instant) {
        if self.times.len() == self.window {
            self.times.pop_front();
        }
        self.times.push_back(at);
    }

    /// Estimated download speed in blocks per second.
    ///
    /// Zero until two completions have been observed.
    pub fn blocks_per_second(&self) -> f64 {
        if self.times.len() < 2 {
            return 0.0;
        }
        let span = match (self.times.front(), self.times.back()) {
            (Some(first), Some(last)) => last.duration_since(*first),
            _ => return 0.0,
        };
        let secs = span.as_secs_f64().round().max(1.0);
        self.chunk_size as f64 * (self.times.len() - 1) as f64 / secs
    }

    /// Estimated time until `remaining_blocks` more blocks are applied.
    ///
    /// `None` while no speed estimate is available.
    pub fn remaining(&self, remaining_blocks: u64) -> Option<Duration> {
        let speed = self.blocks_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs((remaining_blocks as f64 / speed).round() as u64))
    }
}

/// Human-readable remaining time, `"unknown"` until an estimate exists.
///
/// Sub-second precision is dropped before formatting.
pub fn format_remaining(remaining: Option<Duration>) -> String {
    match remaining {
        Some(eta) => humantime::format_duration(Duration::from_secs(eta.as_secs())).to_string(),
        None => "unknown".to_string(),
    }
}
