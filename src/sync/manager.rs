//! The sync orchestrator.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::event_bus::{EventBus, EventReceiver};
use crate::events::SyncEvent;
use crate::ledger::{LedgerService, PeerService};
use crate::remote::{RemoteClient, RemoteNode};
use crate::sync::applier::{Applier, ApplyMode};
use crate::sync::peers::PeerReconciler;
use crate::sync::pipeline::DownloadPipeline;
use crate::sync::planner::plan_chunks;
use crate::sync::progress::{ProgressReporter, SyncPhase};
use crate::sync::speed::{format_remaining, SpeedEstimator};
use crate::watcher::Watcher;

/// Minimum UCP protocol version a remote must speak.
const MIN_UCP_VERSION: u32 = 2;

/// Options of one [`SyncManager::sync`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Sync up to this block number; `None` means the remote's chain tip.
    pub to: Option<u64>,
    /// Force cautious (`Some(true)`) or fast (`Some(false)`) application.
    /// When unset, cautious is used iff a local chain already exists.
    pub cautious: Option<bool>,
    /// Skip the peer reconciliation phase.
    pub skip_peers: bool,
}

/// Outcome of a successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    /// Block number the sync targeted.
    pub target: u64,
    /// Number of blocks applied to the ledger.
    pub blocks_applied: u64,
    /// Whether the peer reconciliation phase ran.
    pub peers_reconciled: bool,
}

/// Orchestrates one synchronization against a chosen remote peer.
///
/// Downloads missing blocks in ordered chunks, applies them through the
/// ledger, then reconciles the peer table. Lifecycle is observable through
/// [`subscribe`](SyncManager::subscribe): each run emits monotone progress
/// events and exactly one terminal event.
///
/// The ledger is treated as exclusively owned for the duration of a run;
/// callers must not start two syncs against the same ledger concurrently.
pub struct SyncManager<N: RemoteNode, L, P, W> {
    config: SyncConfig,
    remote: Arc<RemoteClient<N>>,
    ledger: Arc<Mutex<L>>,
    peers: Arc<Mutex<P>>,
    watcher: Arc<Mutex<W>>,
    events: EventBus<SyncEvent>,
    phase: SyncPhase,
}

impl<N, L, P, W> SyncManager<N, L, P, W>
where
    N: RemoteNode + 'static,
    L: LedgerService,
    P: PeerService,
    W: Watcher + 'static,
{
    /// Create a manager over the given collaborators.
    ///
    /// Fails when the configuration does not validate.
    pub fn new(config: SyncConfig, node: N, ledger: L, peers: P, watcher: W) -> SyncResult<Self> {
        config.validate().map_err(SyncError::Config)?;
        let remote = Arc::new(RemoteClient::new(node, config.sync_long_timeout));
        Ok(Self {
            config,
            remote,
            ledger: Arc::new(Mutex::new(ledger)),
            peers: Arc::new(Mutex::new(peers)),
            watcher: Arc::new(Mutex::new(watcher)),
            events: EventBus::default(),
            phase: SyncPhase::Idle,
        })
    }

    /// Subscribe to the lifecycle event stream.
    pub fn subscribe(&self) -> EventReceiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Handle to the ledger collaborator.
    pub fn ledger(&self) -> Arc<Mutex<L>> {
        Arc::clone(&self.ledger)
    }

    /// Handle to the peer service collaborator.
    pub fn peers(&self) -> Arc<Mutex<P>> {
        Arc::clone(&self.peers)
    }

    /// Handle to the watcher.
    pub fn watcher(&self) -> Arc<Mutex<W>> {
        Arc::clone(&self.watcher)
    }

    /// Bring the local chain up to the remote's, then reconcile peers.
    ///
    /// Every run ends through a single terminal path: the download pipeline
    /// is cancelled, the status refresh stops, the watcher is closed exactly
    /// once, and exactly one terminal event is emitted.
    pub async fn sync(&mut self, options: SyncOptions) -> SyncResult<SyncSummary> {
        let reporter = ProgressReporter::new(Arc::clone(&self.watcher), self.events.clone());
        let estimator = Arc::new(Mutex::new(SpeedEstimator::new(
            self.config.speed_window,
            self.config.chunk_size,
        )));
        let cancel = CancellationToken::new();
        let refresh = self.spawn_status_refresh(reporter.clone(), Arc::clone(&estimator));

        let result = self.run(options, &reporter, &estimator, &cancel).await;

        refresh.abort();
        cancel.cancel();

        match result {
            Ok(summary) => {
                self.phase = SyncPhase::Done;
                {
                    let mut watcher = self.watcher.lock().await;
                    watcher.write_status("Sync finished");
                    watcher.end();
                }
                self.events.emit(SyncEvent::Completed);
                tracing::info!(
                    target_height = summary.target,
                    blocks = summary.blocks_applied,
                    "sync finished"
                );
                Ok(summary)
            }
            Err(e) => {
                self.phase = SyncPhase::Failed;
                let msg = e.to_string();
                {
                    let mut watcher = self.watcher.lock().await;
                    watcher.write_status(&msg);
                    watcher.end();
                }
                self.events.emit(SyncEvent::Failed {
                    msg,
                });
                tracing::warn!(error = %e, "sync failed");
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        options: SyncOptions,
        reporter: &ProgressReporter<W>,
        estimator: &Arc<Mutex<SpeedEstimator>>,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncSummary> {
        self.phase = SyncPhase::Connecting;
        reporter.status("Connecting to remote node").await;
        let tip = self.remote.current().await?;
        if tip.version < MIN_UCP_VERSION {
            return Err(SyncError::UnsupportedPeer {
                version: tip.version,
            });
        }

        self.phase = SyncPhase::Planning;
        let local = self.ledger.lock().await.current_block().await?.map(|b| b.number);
        let target = options.to.unwrap_or(tip.number);
        let chunks = plan_chunks(local, target, self.config.chunk_size);
        let first = local.map(|height| height + 1).unwrap_or(0);
        reporter.begin(first, target).await;

        let mode = ApplyMode::select(options.cautious, local);
        tracing::info!(?local, target_height = target, chunks = chunks.len(), ?mode, "sync planned");

        self.phase = SyncPhase::Downloading;
        let mut applier = Applier::new(mode, Arc::clone(&self.ledger), &self.config, target);
        if !chunks.is_empty() {
            reporter.status("Downloading blocks").await;
            let mut pipeline = DownloadPipeline::start(
                Arc::clone(&self.remote),
                chunks,
                target,
                reporter.clone(),
                Arc::clone(estimator),
                cancel.clone(),
            );
            while let Some(next) = pipeline.next().await {
                applier.apply_chunk(next?, reporter).await?;
            }
        }
        applier.finalize().await?;

        let peers_reconciled = if options.skip_peers {
            false
        } else {
            self.phase = SyncPhase::ReconcilingPeers;
            let reconciler = PeerReconciler::new(
                self.remote.as_ref(),
                Arc::clone(&self.ledger),
                Arc::clone(&self.peers),
                options.to.is_none(),
            );
            reconciler.reconcile(reporter).await?;
            true
        };

        let blocks_applied = reporter.snapshot().await.blocks_applied;
        Ok(SyncSummary {
            target,
            blocks_applied,
            peers_reconciled,
        })
    }

    /// Refresh the watcher status line on a fixed interval while a sync runs.
    fn spawn_status_refresh(
        &self,
        reporter: ProgressReporter<W>,
        estimator: Arc<Mutex<SpeedEstimator>>,
    ) -> JoinHandle<()> {
        let period = self.config.eval_remaining_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick fires immediately; progress exists only after that.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let state = reporter.snapshot().await;
                let Some((first, target)) = state.bounds else {
                    continue;
                };
                let remaining_blocks = target.saturating_sub(first + state.blocks_applied);
                let (speed, eta) = {
                    let estimator = estimator.lock().await;
                    (estimator.blocks_per_second(), estimator.remaining(remaining_blocks))
                };
                let line = format!(
                    "Downloaded {}% | Applied {}% | {:.0} blocks/s | remaining {}",
                    state.download_pct,
                    state.applied_pct,
                    speed,
                    format_remaining(eta)
                );
                reporter.status(&line).await;
            }
        })
    }
}
