//! Ordered chunk download pipeline.
//!
//! One worker task fetches chunks from the remote strictly one after the
//! other and hands each result to a per-chunk completion channel. The
//! applier consumes those channels in plan order, so application order is
//! guaranteed regardless of how the consumer is scheduled, and at most one
//! chunk is in flight at a time, bounding memory.
//!
//! On any fetch error the failing chunk's channel carries the error, every
//! later channel resolves to a cancellation, and no further request is
//! issued.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{RemoteError, SyncError, SyncResult};
use crate::remote::{RemoteClient, RemoteNode};
use crate::sync::progress::{percent_of, ProgressReporter};
use crate::sync::speed::SpeedEstimator;
use crate::types::{Chunk, DownloadedChunk};
use crate::watcher::Watcher;

type ChunkSender = oneshot::Sender<SyncResult<DownloadedChunk>>;
type ChunkHandle = oneshot::Receiver<SyncResult<DownloadedChunk>>;

/// Running download pipeline for one sync.
#[derive(Debug)]
pub(crate) struct DownloadPipeline {
    handles: VecDeque<ChunkHandle>,
    cancel: CancellationToken,
    _worker: JoinHandle<()>,
}

impl DownloadPipeline {
    /// Start downloading `chunks` in order.
    ///
    /// `target` is the sync target height, used for progress percentages.
    /// Cancelling `cancel` stops the worker after the in-flight request.
    pub(crate) fn start<N, W>(
        remote: Arc<RemoteClient<N>>,
        chunks: Vec<Chunk>,
        target: u64,
        reporter: ProgressReporter<W>,
        estimator: Arc<Mutex<SpeedEstimator>>,
        cancel: CancellationToken,
    ) -> Self
    where
        N: RemoteNode + 'static,
        W: Watcher + 'static,
    {
        let mut work: VecDeque<(Chunk, ChunkSender)> = VecDeque::with_capacity(chunks.len());
        let mut handles = VecDeque::with_capacity(chunks.len());
        for chunk in chunks {
            let (tx, rx) = oneshot::channel();
            work.push_back((chunk, tx));
            handles.push_back(rx);
        }

        let token = cancel.clone();
        let worker = tokio::spawn(async move {
            while let Some((chunk, tx)) = work.pop_front() {
                if token.is_cancelled() {
                    abandon(tx, work);
                    return;
                }

                reporter.download(percent_of(chunk.first, target)).await;
                tracing::debug!(chunk = %chunk, "requesting chunk");

                let fetched = tokio::select! {
                    _ = token.cancelled() => {
                        abandon(tx, work);
                        return;
                    }
                    result = remote.blocks(chunk.len(), chunk.first) => result,
                };

                let result = fetched.and_then(|blocks| {
                    if blocks.len() as u64 == chunk.len() {
                        Ok(blocks)
                    } else {
                        Err(RemoteError::InvalidResponse(format!(
                            "chunk {}: expected {} blocks, got {}",
                            chunk,
                            chunk.len(),
                            blocks.len()
                        )))
                    }
                });

                match result {
                    Ok(blocks) => {
                        estimator.lock().await.record(Instant::now());
                        reporter.download(percent_of(chunk.last, target)).await;
                        let _ = tx.send(Ok(DownloadedChunk {
                            chunk,
                            blocks,
                        }));
                    }
                    Err(e) => {
                        tracing::warn!(chunk = %chunk, error = %e, "chunk download failed");
                        let _ = tx.send(Err(e.into()));
                        for (_, later) in work.drain(..) {
                            let _ = later.send(Err(SyncError::DownloadCancelled));
                        }
                        token.cancel();
                        return;
                    }
                }
            }
        });

        Self {
            handles,
            cancel,
            _worker: worker,
        }
    }

    /// Next chunk in plan order, or `None` once the plan is exhausted.
    pub(crate) async fn next(&mut self) -> Option<SyncResult<DownloadedChunk>> {
        let handle = self.handles.pop_front()?;
        Some(match handle.await {
            Ok(result) => result,
            Err(_) => Err(SyncError::DownloadCancelled),
        })
    }

    /// Stop the worker; undelivered chunks resolve as cancelled.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Resolve the current and all remaining chunks as cancelled.
fn abandon(current: ChunkSender, rest: VecDeque<(Chunk, ChunkSender)>) {
    let _ = current.send(Err(SyncError::DownloadCancelled));
    for (_, tx) in rest {
        let _ = tx.send(Err(SyncError::DownloadCancelled));
    }
}
