//! Block application, in cautious or fast mode.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::ledger::LedgerService;
use crate::sync::progress::{percent_of, ProgressReporter};
use crate::types::{Block, DownloadedChunk};
use crate::watcher::Watcher;

/// How downloaded blocks reach the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Block-by-block validation through the ledger. Default when a local
    /// chain already exists.
    Cautious,
    /// Bulk insertion into the main branch with a finalization post-pass.
    /// Default for an initial sync.
    Fast,
}

impl ApplyMode {
    /// Resolve the mode from an explicit request and the local chain state.
    pub fn select(requested: Option<bool>, local_height: Option<u64>) -> Self {
        match requested {
            Some(true) => ApplyMode::Cautious,
            Some(false) => ApplyMode::Fast,
            None if local_height.is_some() => ApplyMode::Cautious,
            None => ApplyMode::Fast,
        }
    }
}

/// Applies downloaded chunks to the ledger in plan order.
///
/// Blocks are moved in and dropped once handed over, so memory held for
/// applied chunks is released as the sync advances.
#[derive(Debug)]
pub(crate) struct Applier<L> {
    mode: ApplyMode,
    ledger: Arc<Mutex<L>>,
    currency: String,
    documents_version: u32,
    fork_allowed: bool,
    target: u64,
    last_applied: Option<Block>,
    chunks_applied: u64,
}

impl<L: LedgerService> Applier<L> {
    pub(crate) fn new(mode: ApplyMode, ledger: Arc<Mutex<L>>, config: &SyncConfig, target: u64) -> Self {
        Self {
            mode,
            ledger,
            currency: config.currency.clone(),
            documents_version: config.documents_version,
            fork_allowed: config.fork_allowed,
            target,
            last_applied: None,
            chunks_applied: 0,
        }
    }

    pub(crate) fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Apply one downloaded chunk.
    ///
    /// A ledger refusal aborts the sync; no rollback is attempted.
    pub(crate) async fn apply_chunk<W: Watcher>(
        &mut self,
        downloaded: DownloadedChunk,
        reporter: &ProgressReporter<W>,
    ) -> SyncResult<()> {
        let DownloadedChunk {
            chunk,
            mut blocks,
        } = downloaded;
        blocks.sort_by_key(|b| b.number);
        tracing::debug!(chunk = %chunk, mode = ?self.mode, "applying chunk");

        match self.mode {
            ApplyMode::Cautious => {
                for mut block in blocks {
                    for tx in &mut block.transactions {
                        tx.canonicalize(&self.currency, self.documents_version);
                    }
                    self.ledger.lock().await.submit_block(&block, true, self.fork_allowed).await?;
                    reporter.applied(percent_of(block.number, self.target), 1).await;
                    self.last_applied = Some(block);
                }
            }
            ApplyMode::Fast => {
                let count = blocks.len() as u64;
                self.ledger.lock().await.save_blocks_in_main_branch(&blocks, self.target).await?;
                self.last_applied = blocks.pop();
                reporter.applied(percent_of(chunk.last, self.target), count).await;
            }
        }

        self.chunks_applied += 1;
        Ok(())
    }

    /// Post-pass after the last chunk.
    ///
    /// Fast mode finalizes the bulk insertion when at least one chunk was
    /// applied; both modes then make the root block's currency parameters
    /// effective.
    pub(crate) async fn finalize(&mut self) -> SyncResult<()> {
        let mut ledger = self.ledger.lock().await;

        if self.mode == ApplyMode::Fast && self.chunks_applied > 0 {
            if let Some(last) = &self.last_applied {
                ledger.obsolete_in_main_branch(last).await?;
            }
        }

        let root = ledger.block(0).await?;
        ledger.save_parameters_for_root_block(&root).await?;
        Ok(())
    }
}
