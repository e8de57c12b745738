//! Ledger and peer-table seams consumed by the sync core.
//!
//! The persistent ledger and the peer service are external collaborators;
//! the sync core only drives these narrow interfaces. [`memory`] provides
//! in-memory reference implementations.

pub mod memory;

use async_trait::async_trait;

use crate::error::{LedgerResult, PeerResult};
use crate::types::{Block, PeeringEntry, PeersMerkle};

pub use memory::{LedgerStats, MemoryLedger, MemoryPeerService};

/// Narrow interface of the local ledger.
///
/// The ledger is the authority on block validity: submissions may be
/// accepted or refused, and the sync core treats a refusal as fatal.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// The current head of the local chain, if any.
    async fn current_block(&self) -> LedgerResult<Option<Block>>;

    /// Fetch a block by number.
    async fn block(&self, number: u64) -> LedgerResult<Block>;

    /// Bulk-insert a batch of blocks into the main branch.
    ///
    /// `target` is the height the ongoing sync aims for, letting the ledger
    /// defer expensive bookkeeping until the batch phase ends.
    async fn save_blocks_in_main_branch(&mut self, blocks: &[Block], target: u64) -> LedgerResult<()>;

    /// Finalize a bulk insertion, marking everything below `last` settled.
    async fn obsolete_in_main_branch(&mut self, last: &Block) -> LedgerResult<()>;

    /// Submit a single block for validation and insertion.
    async fn submit_block(&mut self, block: &Block, cautious: bool, fork_allowed: bool) -> LedgerResult<()>;

    /// Make the root block's currency parameters effective.
    async fn save_parameters_for_root_block(&mut self, root: &Block) -> LedgerResult<()>;

    /// Summary of the locally known peer set.
    async fn merkle_for_peers(&self) -> LedgerResult<PeersMerkle>;
}

/// Narrow interface of the local peer table.
#[async_trait]
pub trait PeerService: Send + Sync {
    /// Record a peering entry.
    ///
    /// With `erase_if_already_recorded`, an existing entry for the same key
    /// is replaced instead of refused.
    async fn submit_peering(
        &mut self,
        entry: &PeeringEntry,
        verify_signature: bool,
        erase_if_already_recorded: bool,
    ) -> PeerResult<()>;

    /// Verify an entry's signature against its pubkey.
    async fn check_signature(&self, entry: &PeeringEntry) -> bool;
}
