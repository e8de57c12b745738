//! Scriptable in-memory remote peer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RemoteError, RemoteResult};
use crate::ledger::memory::merkle_root;
use crate::remote::RemoteNode;
use crate::types::{Block, NodesMerkle, PeeringEntry, RemoteTip};

use super::{test_block, test_peering_entry};

/// A remote peer whose chain and peer set are generated on demand.
///
/// Blocks are served in descending order to exercise the applier's sorting.
/// Failures can be scripted per chunk or per Merkle leaf, and every request
/// is logged for assertions.
pub struct MockRemote {
    tip: RemoteTip,
    fail_at: Option<u64>,
    response_delay: Option<Duration>,
    peering: PeeringEntry,
    peers_root: Option<String>,
    peers_leaves: Vec<String>,
    leaf_entries: HashMap<String, PeeringEntry>,
    fail_leaf: Option<String>,
    requests: Arc<Mutex<Vec<(u64, u64)>>>,
    leaf_requests: Arc<Mutex<Vec<String>>>,
}

impl MockRemote {
    /// A remote with a chain up to `tip` speaking the given UCP version.
    pub fn chain(tip: u64, version: u32) -> Self {
        Self {
            tip: RemoteTip {
                number: tip,
                version,
            },
            fail_at: None,
            response_delay: None,
            peering: test_peering_entry("RemotePeerPubkey", "0-ROOT"),
            peers_root: None,
            peers_leaves: Vec::new(),
            leaf_entries: HashMap::new(),
            fail_leaf: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            leaf_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the chunk request starting at the given block number.
    pub fn with_failure_at(mut self, from: u64) -> Self {
        self.fail_at = Some(from);
        self
    }

    /// Delay every block response.
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }

    /// Replace the remote's own peering entry.
    pub fn with_peering(mut self, entry: PeeringEntry) -> Self {
        self.peering = entry;
        self
    }

    /// Populate the remote's peer set; leaves derive from the entries.
    pub fn with_peer_entries(mut self, entries: impl IntoIterator<Item = PeeringEntry>) -> Self {
        for entry in entries {
            let leaf = entry.leaf_hash();
            self.peers_leaves.push(leaf.clone());
            self.leaf_entries.insert(leaf, entry);
        }
        self
    }

    /// Override the advertised peers-Merkle root.
    pub fn with_peers_root(mut self, root: impl Into<String>) -> Self {
        self.peers_root = Some(root.into());
        self
    }

    /// Fail the fetch of one specific leaf.
    pub fn with_leaf_failure(mut self, leaf: impl Into<String>) -> Self {
        self.fail_leaf = Some(leaf.into());
        self
    }

    /// Log of `(from, count)` block requests.
    pub fn requests_handle(&self) -> Arc<Mutex<Vec<(u64, u64)>>> {
        Arc::clone(&self.requests)
    }

    /// Log of fetched leaf hashes.
    pub fn leaf_requests_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.leaf_requests)
    }

    /// The root this remote advertises.
    pub fn advertised_root(&self) -> String {
        self.peers_root.clone().unwrap_or_else(|| merkle_root(&self.peers_leaves))
    }
}

#[async_trait]
impl RemoteNode for MockRemote {
    async fn current(&self) -> RemoteResult<RemoteTip> {
        Ok(self.tip)
    }

    async fn blocks(&self, count: u64, from: u64) -> RemoteResult<Vec<Block>> {
        self.requests.lock().expect("request log poisoned").push((from, count));

        if let Some(delay) = self.response_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_at == Some(from) {
            return Err(RemoteError::ConnectionFailed(format!("scripted failure at #{from}")));
        }

        let last = (from + count - 1).min(self.tip.number);
        Ok((from..=last).rev().map(test_block).collect())
    }

    async fn peering(&self) -> RemoteResult<PeeringEntry> {
        Ok(self.peering.clone())
    }

    async fn peers_root(&self) -> RemoteResult<NodesMerkle> {
        Ok(NodesMerkle {
            depth: 0,
            nodes_count: self.peers_leaves.len() as u32,
            leaves_count: self.peers_leaves.len() as u32,
            root: self.advertised_root(),
        })
    }

    async fn peers_leaves(&self) -> RemoteResult<Vec<String>> {
        Ok(self.peers_leaves.clone())
    }

    async fn peers_leaf(&self, leaf: &str) -> RemoteResult<PeeringEntry> {
        self.leaf_requests.lock().expect("leaf log poisoned").push(leaf.to_string());

        if self.fail_leaf.as_deref() == Some(leaf) {
            return Err(RemoteError::ConnectionFailed(format!("scripted failure for leaf {leaf}")));
        }

        self.leaf_entries
            .get(leaf)
            .cloned()
            .ok_or_else(|| RemoteError::InvalidResponse(format!("unknown leaf {leaf}")))
    }
}
