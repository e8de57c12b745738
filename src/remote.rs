//! Remote peer access for the sync core.
//!
//! [`RemoteNode`] is the transport seam: a concrete implementation speaks
//! whatever wire protocol the node uses. [`RemoteClient`] is the thin façade
//! the sync pipeline consumes; it applies the configured long timeout to
//! every call and nothing else. Retry policy, if any, belongs to the caller.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RemoteError, RemoteResult};
use crate::types::{Block, NodesMerkle, PeeringEntry, RemoteTip};

/// Operations consumed from a remote peer.
///
/// All calls may fail with a network error. Block order in [`blocks`] is
/// unspecified; the applier sorts by number.
///
/// [`blocks`]: RemoteNode::blocks
#[async_trait]
pub trait RemoteNode: Send + Sync {
    /// The remote's current chain head and protocol version.
    async fn current(&self) -> RemoteResult<RemoteTip>;

    /// `count` blocks starting at `from`, inclusive.
    async fn blocks(&self, count: u64, from: u64) -> RemoteResult<Vec<Block>>;

    /// The remote's own peering entry.
    async fn peering(&self) -> RemoteResult<PeeringEntry>;

    /// Summary of the remote's peer set.
    async fn peers_root(&self) -> RemoteResult<NodesMerkle>;

    /// Leaf hashes of the remote's peer set.
    async fn peers_leaves(&self) -> RemoteResult<Vec<String>>;

    /// The full peering entry behind one leaf hash.
    async fn peers_leaf(&self, leaf: &str) -> RemoteResult<PeeringEntry>;
}

/// Timeout-applying façade over a [`RemoteNode`].
#[derive(Debug)]
pub struct RemoteClient<N: RemoteNode> {
    node: N,
    timeout: Duration,
}

impl<N: RemoteNode> RemoteClient<N> {
    /// Wrap a transport with the given per-call timeout.
    pub fn new(node: N, timeout: Duration) -> Self {
        Self {
            node,
            timeout,
        }
    }

    /// Access the underlying transport.
    pub fn node(&self) -> &N {
        &self.node
    }

    async fn call<T>(&self, fut: impl Future<Output = RemoteResult<T>>) -> RemoteResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout),
        }
    }

    /// The remote's current chain head and protocol version.
    pub async fn current(&self) -> RemoteResult<RemoteTip> {
        self.call(self.node.current()).await
    }

    /// `count` blocks starting at `from`, inclusive.
    pub async fn blocks(&self, count: u64, from: u64) -> RemoteResult<Vec<Block>> {
        self.call(self.node.blocks(count, from)).await
    }

    /// The remote's own peering entry.
    pub async fn peering(&self) -> RemoteResult<PeeringEntry> {
        self.call(self.node.peering()).await
    }

    /// Summary of the remote's peer set.
    pub async fn peers_root(&self) -> RemoteResult<NodesMerkle> {
        self.call(self.node.peers_root()).await
    }

    /// Leaf hashes of the remote's peer set.
    pub async fn peers_leaves(&self) -> RemoteResult<Vec<String>> {
        self.call(self.node.peers_leaves()).await
    }

    /// The full peering entry behind one leaf hash.
    pub async fn peers_leaf(&self, leaf: &str) -> RemoteResult<PeeringEntry> {
        self.call(self.node.peers_leaf(leaf)).await
    }
}
