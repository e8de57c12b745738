//! Lifecycle events emitted over one synchronization run.

/// Events a [`SyncManager`](crate::sync::SyncManager) broadcasts while it runs.
///
/// A single sync emits zero or more progress events, each stream
/// monotonically non-decreasing, followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Download progress reached a new percentage.
    DownloadProgress {
        /// Percent of the target height downloaded, in `0..=100`.
        pct: u8,
    },

    /// Application progress reached a new percentage.
    AppliedProgress {
        /// Percent of the target height applied, in `0..=100`.
        pct: u8,
    },

    /// The sync finished successfully.
    Completed,

    /// The sync aborted.
    Failed {
        /// Human-readable failure reason.
        msg: String,
    },
}

impl SyncEvent {
    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            SyncEvent::DownloadProgress {
                pct,
            } => {
                format!("DownloadProgress({}%)", pct)
            }
            SyncEvent::AppliedProgress {
                pct,
            } => {
                format!("AppliedProgress({}%)", pct)
            }
            SyncEvent::Completed => "Completed".to_string(),
            SyncEvent::Failed {
                msg,
            } => {
                format!("Failed({})", msg)
            }
        }
    }

    /// True for the two terminal variants.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncEvent::Completed
                | SyncEvent::Failed {
                    ..
                }
        )
    }
}
