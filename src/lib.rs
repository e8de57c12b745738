//! UCP blockchain synchronization core.
//!
//! This library brings a local node's chain up to parity with a chosen
//! remote peer:
//!
//! - Downloads missing blocks in ordered chunks and applies them through
//!   the local ledger, block-by-block (cautious) or in bulk (fast)
//! - Reconciles the local peer table against the remote's peers-Merkle tree,
//!   fetching only the leaves the local side lacks
//! - Reports progress through pluggable watchers (terminal bars or log
//!   lines) and a broadcast event stream ending in exactly one terminal event
//!
//! # Architecture
//!
//! [`sync::SyncManager`] is the entry point. It is generic over four seams:
//! [`remote::RemoteNode`] (the peer's RPC transport), [`ledger::LedgerService`]
//! and [`ledger::PeerService`] (the node's persistence), and
//! [`watcher::Watcher`] (progress display). In-memory implementations of the
//! ledger seams ship in [`ledger::memory`]; the transport is left to the
//! embedding node.
//!
//! # Features
//!
//! - **Async/await support**: built on tokio
//! - **Ordered pipelined downloads**: network fetches overlap application,
//!   while the ledger always sees blocks in ascending order
//! - **Bounded memory**: at most one chunk in flight, applied chunks dropped
//! - **Cancellation**: a failure anywhere cancels outstanding downloads
//! - **Extensive logging**: built-in tracing support for debugging

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub mod config;
pub mod error;
pub mod event_bus;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod remote;
pub mod sync;
pub mod types;
pub mod watcher;

// Re-export main types for convenience
pub use config::SyncConfig;
pub use error::{
    LedgerError, LedgerResult, LoggingError, LoggingResult, PeerResult, PeerServiceError,
    RemoteError, RemoteResult, SyncError, SyncResult,
};
pub use event_bus::{EventBus, EventReceiver};
pub use events::SyncEvent;
pub use ledger::{LedgerService, MemoryLedger, MemoryPeerService, PeerService};
pub use logging::{init_console_logging, init_logging, LoggingConfig, LoggingGuard};
pub use remote::{RemoteClient, RemoteNode};
pub use sync::{ApplyMode, SyncManager, SyncOptions, SyncPhase, SyncSummary};
pub use tracing::level_filters::LevelFilter;
pub use types::{Block, Chunk, NodesMerkle, PeeringEntry, PeersMerkle, RemoteTip, Transaction};
pub use watcher::{LogWatcher, Watcher};
#[cfg(feature = "terminal-ui")]
pub use watcher::TerminalWatcher;

/// Current version of the ucp-sync library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
