//! Error types for the UCP synchronization core.

use std::io;
use thiserror::Error;

/// Main error type for a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Peer service error: {0}")]
    Peer(#[from] PeerServiceError),

    #[error("could not sync: UCP version is {version}, need 2 or higher")]
    UnsupportedPeer {
        version: u32,
    },

    #[error("download cancelled")]
    DownloadCancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Returns a static string representing the error category based on the variant.
    pub fn category(&self) -> &'static str {
        match self {
            SyncError::Remote(_) => "remote",
            SyncError::Ledger(_) => "ledger",
            SyncError::Peer(_) => "peer",
            SyncError::UnsupportedPeer {
                ..
            } => "protocol",
            SyncError::DownloadCancelled => "cancelled",
            SyncError::Config(_) => "config",
        }
    }
}

/// Errors raised by the remote peer RPC façade.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request timed out")]
    Timeout,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by the local ledger service.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Block refused: {0}")]
    Refused(String),

    #[error("Data not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Errors raised by the local peer service.
///
/// `AlreadyRecorded` and `UnknownReferenceBlock` are expected outcomes during
/// reconciliation and are swallowed by the caller; everything else aborts the
/// sync.
#[derive(Debug, Error)]
pub enum PeerServiceError {
    #[error("peering entry already recorded")]
    AlreadyRecorded,

    #[error("peering entry references an unknown block")]
    UnknownReferenceBlock,

    #[error("Peering entry refused: {0}")]
    Refused(String),
}

impl PeerServiceError {
    /// True for outcomes the reconciler tolerates without aborting.
    pub fn is_benign(&self) -> bool {
        matches!(self, PeerServiceError::AlreadyRecorded | PeerServiceError::UnknownReferenceBlock)
    }
}

/// Logging initialization errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Initialization failed: {0}")]
    Init(String),
}

/// Type alias for Result with SyncError.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Type alias for remote RPC results.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Type alias for ledger operation results.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Type alias for peer service results.
pub type PeerResult<T> = std::result::Result<T, PeerServiceError>;

/// Type alias for logging setup results.
pub type LoggingResult<T> = std::result::Result<T, LoggingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_category() {
        assert_eq!(SyncError::Remote(RemoteError::Timeout).category(), "remote");
        assert_eq!(SyncError::Ledger(LedgerError::Refused("x".into())).category(), "ledger");
        assert_eq!(SyncError::Peer(PeerServiceError::AlreadyRecorded).category(), "peer");
        assert_eq!(
            SyncError::UnsupportedPeer {
                version: 1
            }
            .category(),
            "protocol"
        );
        assert_eq!(SyncError::DownloadCancelled.category(), "cancelled");
        assert_eq!(SyncError::Config("bad".into()).category(), "config");
    }

    #[test]
    fn test_unsupported_peer_message_names_version() {
        let err = SyncError::UnsupportedPeer {
            version: 1,
        };
        assert!(err.to_string().contains("UCP version is 1"));
    }

    #[test]
    fn test_benign_peer_errors() {
        assert!(PeerServiceError::AlreadyRecorded.is_benign());
        assert!(PeerServiceError::UnknownReferenceBlock.is_benign());
        assert!(!PeerServiceError::Refused("bad".into()).is_benign());
    }
}
