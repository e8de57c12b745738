//! Configuration for the synchronization core.

use std::time::Duration;

/// Default chunk width for block downloads.
pub const DEFAULT_CHUNK_SIZE: u64 = 500;

/// Default number of chunk-completion timestamps the speed estimator keeps.
pub const DEFAULT_SPEED_WINDOW: usize = 8;

/// Configuration for a [`SyncManager`](crate::sync::SyncManager).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Currency name stamped into transactions during cautious application.
    pub currency: String,

    /// Document version stamped into transactions.
    pub documents_version: u32,

    /// Whether block submission may settle on a fork branch.
    pub fork_allowed: bool,

    /// Number of blocks requested per chunk.
    pub chunk_size: u64,

    /// Timeout applied to every remote call.
    pub sync_long_timeout: Duration,

    /// Interval of the status line refresh while a sync runs.
    pub eval_remaining_interval: Duration,

    /// Sliding-window size of the speed estimator.
    pub speed_window: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            currency: String::new(),
            documents_version: 1,
            fork_allowed: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            sync_long_timeout: Duration::from_secs(120),
            eval_remaining_interval: Duration::from_secs(1),
            speed_window: DEFAULT_SPEED_WINDOW,
        }
    }
}

impl SyncConfig {
    /// Create a configuration for the given currency.
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            ..Self::default()
        }
    }

    /// Set the chunk width.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the document version stamped into transactions.
    pub fn with_documents_version(mut self, version: u32) -> Self {
        self.documents_version = version;
        self
    }

    /// Allow or forbid fork settlement on block submission.
    pub fn with_fork_allowed(mut self, allowed: bool) -> Self {
        self.fork_allowed = allowed;
        self
    }

    /// Set the remote call timeout.
    pub fn with_sync_long_timeout(mut self, timeout: Duration) -> Self {
        self.sync_long_timeout = timeout;
        self
    }

    /// Set the status refresh interval.
    pub fn with_eval_remaining_interval(mut self, interval: Duration) -> Self {
        self.eval_remaining_interval = interval;
        self
    }

    /// Set the speed estimator window.
    pub fn with_speed_window(mut self, window: usize) -> Self {
        self.speed_window = window;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.currency.is_empty() {
            return Err("currency must be set".to_string());
        }

        if self.documents_version == 0 {
            return Err("documents_version must be > 0".to_string());
        }

        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.speed_window == 0 {
            return Err("speed_window must be > 0".to_string());
        }

        if self.eval_remaining_interval.is_zero() {
            return Err("eval_remaining_interval must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::new("meta_brouzouf");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.speed_window, 8);
        assert_eq!(config.eval_remaining_interval, Duration::from_secs(1));
        assert!(config.fork_allowed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_currency() {
        let config = SyncConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(SyncConfig::new("x").with_chunk_size(0).validate().is_err());
        assert!(SyncConfig::new("x").with_speed_window(0).validate().is_err());
        assert!(SyncConfig::new("x").with_documents_version(0).validate().is_err());
        assert!(SyncConfig::new("x")
            .with_eval_remaining_interval(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = SyncConfig::new("meta_brouzouf")
            .with_chunk_size(50)
            .with_documents_version(2)
            .with_fork_allowed(false)
            .with_sync_long_timeout(Duration::from_secs(30));

        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.documents_version, 2);
        assert!(!config.fork_allowed);
        assert_eq!(config.sync_long_timeout, Duration::from_secs(30));
    }
}
