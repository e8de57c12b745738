//! Non-interactive progress sink backed by `tracing`.

use super::{advance, Watcher};

/// Watcher that emits one log line per strict progress increase.
///
/// Suited to headless daemons and CI logs: repeated calls with the same
/// percentage stay silent, so output length is bounded by 2 × 100 lines
/// plus status changes.
#[derive(Debug, Default)]
pub struct LogWatcher {
    download: u8,
    applied: u8,
    ended: bool,
}

impl LogWatcher {
    /// Create a fresh log watcher.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Watcher for LogWatcher {
    fn write_status(&mut self, text: &str) {
        tracing::info!("{}", text);
    }

    fn download_percent(&mut self, pct: u8) -> u8 {
        let next = advance(self.download, pct);
        if next > self.download {
            self.download = next;
            tracing::info!("Downloaded {}%", next);
        }
        self.download
    }

    fn current_download(&self) -> u8 {
        self.download
    }

    fn applied_percent(&mut self, pct: u8) -> u8 {
        let next = advance(self.applied, pct);
        if next > self.applied {
            self.applied = next;
            tracing::info!("Applied {}%", next);
        }
        self.applied
    }

    fn current_applied(&self) -> u8 {
        self.applied
    }

    fn end(&mut self) {
        if !self.ended {
            self.ended = true;
            tracing::info!("Sync watcher closed");
        }
    }
}
