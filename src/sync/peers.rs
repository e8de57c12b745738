//! Peer-table reconciliation against the remote's Merkle summary.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::SyncResult;
use crate::ledger::{LedgerService, PeerService};
use crate::remote::{RemoteClient, RemoteNode};
use crate::sync::progress::ProgressReporter;
use crate::types::PeeringEntry;
use crate::watcher::Watcher;

/// Reconciles the local peer table with a remote's peer set.
///
/// Records the remote's own peering entry, then fetches only the Merkle
/// leaves the local side lacks. Leaf fetches and submissions are sequential.
pub(crate) struct PeerReconciler<'a, N: RemoteNode, L, P> {
    remote: &'a RemoteClient<N>,
    ledger: Arc<Mutex<L>>,
    peers: Arc<Mutex<P>>,
    /// True on an open-ended sync to the chain tip: stale local entries are
    /// refreshed instead of refused.
    erase_if_already_recorded: bool,
}

impl<'a, N, L, P> PeerReconciler<'a, N, L, P>
where
    N: RemoteNode,
    L: LedgerService,
    P: PeerService,
{
    pub(crate) fn new(
        remote: &'a RemoteClient<N>,
        ledger: Arc<Mutex<L>>,
        peers: Arc<Mutex<P>>,
        erase_if_already_recorded: bool,
    ) -> Self {
        Self {
            remote,
            ledger,
            peers,
            erase_if_already_recorded,
        }
    }

    /// Run the reconciliation.
    pub(crate) async fn reconcile<W: Watcher>(&self, reporter: &ProgressReporter<W>) -> SyncResult<()> {
        reporter.status("Peers: recording remote peering entry").await;
        let entry = self.remote.peering().await?;

        let signature_ok = self.peers.lock().await.check_signature(&entry).await;
        if !signature_ok {
            tracing::warn!(pubkey = %entry.pubkey, "remote peering entry signature does not check out");
            reporter.status("Signature from remote peer does not check out, recording anyway").await;
        }
        self.submit(&entry, signature_ok).await?;

        let remote_root = self.remote.peers_root().await?.root;
        let local = self.ledger.lock().await.merkle_for_peers().await?;
        if remote_root == local.root {
            reporter.status("Peers already known").await;
            return Ok(());
        }

        reporter.status("Peers: downloading missing entries").await;
        let remote_leaves = self.remote.peers_leaves().await?;
        let known: HashSet<&String> = local.leaves.iter().collect();
        let mut fetched = 0u32;
        for leaf in remote_leaves.iter().filter(|leaf| !known.contains(leaf)) {
            let leaf_entry = self.remote.peers_leaf(leaf).await?;
            self.submit(&leaf_entry, true).await?;
            fetched += 1;
        }

        tracing::info!(fetched, total = remote_leaves.len(), "peer reconciliation finished");
        Ok(())
    }

    /// Submit one entry, tolerating the benign service outcomes.
    async fn submit(&self, entry: &PeeringEntry, verify_signature: bool) -> SyncResult<()> {
        let result = self
            .peers
            .lock()
            .await
            .submit_peering(entry, verify_signature, self.erase_if_already_recorded)
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_benign() => {
                tracing::debug!(pubkey = %entry.pubkey, outcome = %e, "peering entry skipped");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
