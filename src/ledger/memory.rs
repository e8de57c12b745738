//! In-memory ledger and peer service.
//!
//! Reference implementations of the [`LedgerService`] and [`PeerService`]
//! contracts, backed by plain collections. They carry the whole behavioral
//! surface the sync core relies on (sequence checking, bulk finalization,
//! erase-on-resubmit) and double as the collaborators of the test suite.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::error::{LedgerError, LedgerResult, PeerResult, PeerServiceError};
use crate::ledger::{LedgerService, PeerService};
use crate::types::{uppercase_sha256, Block, PeeringEntry, PeersMerkle};

/// Counters the memory ledger keeps about its own usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Blocks accepted, through either submission path.
    pub blocks_submitted: u64,
    /// Bulk batches accepted.
    pub bulk_batches: u64,
    /// Bulk finalization runs.
    pub finalization_runs: u64,
}

/// In-memory main branch.
///
/// Blocks live in a vector indexed by number; both submission paths refuse
/// out-of-sequence blocks, which is the linkage guarantee the sync core's
/// ordering contract is checked against.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    blocks: Vec<Block>,
    peer_leaves: BTreeSet<String>,
    parameters: Option<String>,
    root_parameters_saved: bool,
    finalized_at: Option<u64>,
    stats: LedgerStats,
}

impl MemoryLedger {
    /// Create an empty ledger with no chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with an existing chain.
    ///
    /// `blocks` must be contiguous starting at number 0.
    pub fn with_chain(blocks: Vec<Block>) -> Self {
        debug_assert!(blocks.iter().enumerate().all(|(i, b)| b.number == i as u64));
        Self {
            blocks,
            ..Self::default()
        }
    }

    /// Replace the locally known peer leaves.
    pub fn set_peer_leaves(&mut self, leaves: impl IntoIterator<Item = String>) {
        self.peer_leaves = leaves.into_iter().collect();
    }

    /// Numbers of every stored block, in storage order.
    pub fn block_numbers(&self) -> Vec<u64> {
        self.blocks.iter().map(|b| b.number).collect()
    }

    /// Height of the chain head, if any.
    pub fn tip_number(&self) -> Option<u64> {
        self.blocks.last().map(|b| b.number)
    }

    /// Usage counters.
    pub fn stats(&self) -> LedgerStats {
        self.stats
    }

    /// Height bulk finalization last settled at.
    pub fn finalized_at(&self) -> Option<u64> {
        self.finalized_at
    }

    /// Currency parameters taken from the root block, once saved.
    pub fn parameters(&self) -> Option<&str> {
        self.parameters.as_deref()
    }

    /// Whether root-block parameters have been made effective.
    pub fn root_parameters_saved(&self) -> bool {
        self.root_parameters_saved
    }

    fn expect_next(&self, number: u64) -> LedgerResult<()> {
        let expected = self.blocks.len() as u64;
        if number != expected {
            return Err(LedgerError::Refused(format!(
                "block #{} out of sequence, expected #{}",
                number, expected
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerService for MemoryLedger {
    async fn current_block(&self) -> LedgerResult<Option<Block>> {
        Ok(self.blocks.last().cloned())
    }

    async fn block(&self, number: u64) -> LedgerResult<Block> {
        self.blocks
            .get(number as usize)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("block #{}", number)))
    }

    async fn save_blocks_in_main_branch(&mut self, blocks: &[Block], _target: u64) -> LedgerResult<()> {
        for block in blocks {
            self.expect_next(block.number)?;
            self.blocks.push(block.clone());
        }
        self.stats.bulk_batches += 1;
        self.stats.blocks_submitted += blocks.len() as u64;
        Ok(())
    }

    async fn obsolete_in_main_branch(&mut self, last: &Block) -> LedgerResult<()> {
        if self.tip_number() != Some(last.number) {
            return Err(LedgerError::Refused(format!(
                "finalization target #{} is not the chain head",
                last.number
            )));
        }
        self.finalized_at = Some(last.number);
        self.stats.finalization_runs += 1;
        Ok(())
    }

    async fn submit_block(&mut self, block: &Block, cautious: bool, _fork_allowed: bool) -> LedgerResult<()> {
        if cautious {
            self.expect_next(block.number)?;
        }
        self.blocks.push(block.clone());
        self.stats.blocks_submitted += 1;
        Ok(())
    }

    async fn save_parameters_for_root_block(&mut self, root: &Block) -> LedgerResult<()> {
        if root.number != 0 {
            return Err(LedgerError::Refused(format!(
                "parameters come from the root block, got #{}",
                root.number
            )));
        }
        self.parameters = root.parameters.clone();
        self.root_parameters_saved = true;
        Ok(())
    }

    async fn merkle_for_peers(&self) -> LedgerResult<PeersMerkle> {
        let leaves: Vec<String> = self.peer_leaves.iter().cloned().collect();
        Ok(PeersMerkle {
            root: merkle_root(&leaves),
            leaves,
        })
    }
}

/// Root hash over a set of leaf hashes.
///
/// Leaves are sorted before hashing so the root only depends on set
/// membership, never on insertion order.
pub fn merkle_root(leaves: &[String]) -> String {
    let mut sorted: Vec<&String> = leaves.iter().collect();
    sorted.sort();
    let mut joined = String::new();
    for leaf in sorted {
        joined.push_str(leaf);
        joined.push('\n');
    }
    uppercase_sha256(joined.as_bytes())
}

/// In-memory peer table keyed by pubkey.
#[derive(Debug, Default)]
pub struct MemoryPeerService {
    entries: HashMap<String, PeeringEntry>,
    submissions: Vec<String>,
    max_known_block: Option<u64>,
}

impl MemoryPeerService {
    /// Create an empty peer table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse entries referencing blocks above the given number.
    pub fn with_max_known_block(mut self, number: u64) -> Self {
        self.max_known_block = Some(number);
        self
    }

    /// Seed the table with an existing entry.
    pub fn with_entry(mut self, entry: PeeringEntry) -> Self {
        self.entries.insert(entry.pubkey.clone(), entry);
        self
    }

    /// Pubkeys of every accepted submission, in order.
    pub fn submissions(&self) -> &[String] {
        &self.submissions
    }

    /// Recorded entries.
    pub fn entries(&self) -> &HashMap<String, PeeringEntry> {
        &self.entries
    }

    /// Leaf hashes of the recorded entries.
    pub fn leaves(&self) -> Vec<String> {
        self.entries.values().map(|e| e.leaf_hash()).collect()
    }
}

#[async_trait]
impl PeerService for MemoryPeerService {
    async fn submit_peering(
        &mut self,
        entry: &PeeringEntry,
        verify_signature: bool,
        erase_if_already_recorded: bool,
    ) -> PeerResult<()> {
        if verify_signature && entry.signature.is_none() {
            return Err(PeerServiceError::Refused("unsigned peering entry".to_string()));
        }

        if let Some(max) = self.max_known_block {
            match entry.reference_block_number() {
                Some(number) if number <= max => {}
                _ => return Err(PeerServiceError::UnknownReferenceBlock),
            }
        }

        if self.entries.contains_key(&entry.pubkey) && !erase_if_already_recorded {
            return Err(PeerServiceError::AlreadyRecorded);
        }

        self.entries.insert(entry.pubkey.clone(), entry.clone());
        self.submissions.push(entry.pubkey.clone());
        Ok(())
    }

    async fn check_signature(&self, entry: &PeeringEntry) -> bool {
        // Signature primitives live outside the sync core; the in-memory
        // table treats presence as validity.
        entry.signature.is_some()
    }
}
