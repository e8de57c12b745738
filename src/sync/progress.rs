//! Sync phases and monotone progress reporting.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::event_bus::EventBus;
use crate::events::SyncEvent;
use crate::watcher::Watcher;

/// Lifecycle phase of a [`SyncManager`](crate::sync::SyncManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Connecting,
    Planning,
    Downloading,
    ReconcilingPeers,
    Done,
    Failed,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncPhase::Idle => "Idle",
            SyncPhase::Connecting => "Connecting",
            SyncPhase::Planning => "Planning",
            SyncPhase::Downloading => "Downloading",
            SyncPhase::ReconcilingPeers => "ReconcilingPeers",
            SyncPhase::Done => "Done",
            SyncPhase::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Percentage of `target` reached at `number`, floored, in `0..=100`.
pub(crate) fn percent_of(number: u64, target: u64) -> u8 {
    if target == 0 {
        return 100;
    }
    ((number.min(target) * 100) / target) as u8
}

/// Shared progress counters of one sync run.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ProgressState {
    pub download_pct: u8,
    pub applied_pct: u8,
    pub blocks_applied: u64,
    /// `(first_block, target)` once planning fixed them.
    pub bounds: Option<(u64, u64)>,
}

/// Fans progress out to the watcher and the event stream.
///
/// The event stream only sees strict increases; the watcher is informed of
/// every call and applies its own clamping. One reporter lives for one sync
/// run, so a later run never inherits counters.
#[derive(Debug)]
pub(crate) struct ProgressReporter<W> {
    watcher: Arc<Mutex<W>>,
    events: EventBus<SyncEvent>,
    state: Arc<Mutex<ProgressState>>,
}

impl<W> Clone for ProgressReporter<W> {
    fn clone(&self) -> Self {
        Self {
            watcher: Arc::clone(&self.watcher),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<W: Watcher> ProgressReporter<W> {
    pub(crate) fn new(watcher: Arc<Mutex<W>>, events: EventBus<SyncEvent>) -> Self {
        Self {
            watcher,
            events,
            state: Arc::new(Mutex::new(ProgressState::default())),
        }
    }

    /// Fix the block range this run covers.
    pub(crate) async fn begin(&self, first: u64, target: u64) {
        self.state.lock().await.bounds = Some((first, target));
    }

    /// Report download progress.
    pub(crate) async fn download(&self, pct: u8) {
        let clamped = pct.min(100);
        let increased = {
            let mut state = self.state.lock().await;
            if clamped > state.download_pct {
                state.download_pct = clamped;
                true
            } else {
                false
            }
        };
        self.watcher.lock().await.download_percent(clamped);
        if increased {
            self.events.emit(SyncEvent::DownloadProgress {
                pct: clamped,
            });
        }
    }

    /// Report application progress; `blocks` is the number of blocks newly
    /// applied by this step.
    pub(crate) async fn applied(&self, pct: u8, blocks: u64) {
        let clamped = pct.min(100);
        let increased = {
            let mut state = self.state.lock().await;
            state.blocks_applied += blocks;
            if clamped > state.applied_pct {
                state.applied_pct = clamped;
                true
            } else {
                false
            }
        };
        self.watcher.lock().await.applied_percent(clamped);
        if increased {
            self.events.emit(SyncEvent::AppliedProgress {
                pct: clamped,
            });
        }
    }

    /// Update the watcher status line.
    pub(crate) async fn status(&self, text: &str) {
        self.watcher.lock().await.write_status(text);
    }

    /// Current counters.
    pub(crate) async fn snapshot(&self) -> ProgressState {
        *self.state.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::LogWatcher;

    #[test]
    fn test_percent_of_floors() {
        assert_eq!(percent_of(0, 1200), 0);
        assert_eq!(percent_of(499, 1200), 41);
        assert_eq!(percent_of(999, 1200), 83);
        assert_eq!(percent_of(1200, 1200), 100);
        assert_eq!(percent_of(5000, 1200), 100);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[tokio::test]
    async fn test_event_stream_sees_only_strict_increases() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let reporter = ProgressReporter::new(Arc::new(Mutex::new(LogWatcher::new())), events);

        reporter.download(10).await;
        reporter.download(10).await;
        reporter.download(5).await;
        reporter.download(30).await;

        assert_eq!(
            rx.try_recv(),
            Some(SyncEvent::DownloadProgress {
                pct: 10
            })
        );
        assert_eq!(
            rx.try_recv(),
            Some(SyncEvent::DownloadProgress {
                pct: 30
            })
        );
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn test_applied_accumulates_blocks() {
        let reporter =
            ProgressReporter::new(Arc::new(Mutex::new(LogWatcher::new())), EventBus::default());

        reporter.applied(10, 500).await;
        reporter.applied(10, 500).await;

        let state = reporter.snapshot().await;
        assert_eq!(state.blocks_applied, 1000);
        assert_eq!(state.applied_pct, 10);
    }
}
