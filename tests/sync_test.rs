//! End-to-end synchronization scenarios over in-memory collaborators.

mod common;

use common::{assert_well_formed_stream, drain_events, manager};
use ucp_sync::test_utils::{test_block, MockRemote};
use ucp_sync::{
    Block, LedgerService, MemoryLedger, MemoryPeerService, SyncError, SyncEvent, SyncOptions,
    SyncPhase, Watcher,
};

fn chain(up_to: u64) -> Vec<Block> {
    (0..=up_to).map(test_block).collect()
}

#[tokio::test]
async fn test_fresh_node_bulk_sync() {
    let remote = MockRemote::chain(1200, 2);
    let requests = remote.requests_handle();
    let mut manager = manager(remote, MemoryLedger::new(), MemoryPeerService::new());
    let mut rx = manager.subscribe();

    let summary = manager.sync(SyncOptions::default()).await.unwrap();

    assert_eq!(summary.target, 1200);
    assert_eq!(summary.blocks_applied, 1201);
    assert!(summary.peers_reconciled);
    assert_eq!(manager.phase(), SyncPhase::Done);

    // Chunk plan [0,499], [500,999], [1000,1200], requested in order.
    assert_eq!(*requests.lock().unwrap(), vec![(0, 500), (500, 500), (1000, 201)]);

    {
        let ledger = manager.ledger();
        let ledger = ledger.lock().await;
        assert_eq!(ledger.block_numbers(), (0..=1200).collect::<Vec<_>>());
        assert_eq!(ledger.stats().bulk_batches, 3);
        assert_eq!(ledger.stats().blocks_submitted, 1201);
        assert_eq!(ledger.finalized_at(), Some(1200));
        assert!(ledger.root_parameters_saved());
        assert_eq!(ledger.parameters(), Some("0.1:86400:100"));
    }

    let events = drain_events(&mut rx);
    assert_well_formed_stream(&events);
    assert_eq!(events.last(), Some(&SyncEvent::Completed));

    let watcher = manager.watcher();
    let watcher = watcher.lock().await;
    assert_eq!(watcher.end_calls(), 1);
    assert_eq!(watcher.current_download(), 100);
    assert_eq!(watcher.current_applied(), 100);
}

#[tokio::test]
async fn test_incremental_cautious_sync() {
    let remote = MockRemote::chain(1002, 2);
    let requests = remote.requests_handle();
    let mut manager = manager(remote, MemoryLedger::with_chain(chain(999)), MemoryPeerService::new());
    let mut rx = manager.subscribe();

    let summary = manager
        .sync(SyncOptions {
            skip_peers: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(summary.blocks_applied, 3);
    assert_eq!(*requests.lock().unwrap(), vec![(1000, 3)]);

    let ledger = manager.ledger();
    let ledger = ledger.lock().await;
    // Blocks landed one by one, in ascending order.
    assert_eq!(ledger.stats().bulk_batches, 0);
    assert_eq!(ledger.block_numbers()[1000..], [1000, 1001, 1002]);

    // Transactions were canonicalized before submission.
    let head = ledger.current_block().await.unwrap().unwrap();
    let tx = &head.transactions[0];
    assert_eq!(tx.currency, "meta_brouzouf");
    assert_eq!(tx.issuers, tx.signatories);
    let hash = tx.hash.as_deref().unwrap();
    assert_eq!(hash, hash.to_uppercase());

    assert_well_formed_stream(&drain_events(&mut rx));
}

#[tokio::test]
async fn test_remote_protocol_too_old() {
    let remote = MockRemote::chain(100, 1);
    let requests = remote.requests_handle();
    let mut manager = manager(remote, MemoryLedger::new(), MemoryPeerService::new());
    let mut rx = manager.subscribe();

    let err = manager.sync(SyncOptions::default()).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::UnsupportedPeer {
            version: 1
        }
    ));
    assert_eq!(manager.phase(), SyncPhase::Failed);
    assert!(requests.lock().unwrap().is_empty(), "no chunk may be fetched");

    let events = drain_events(&mut rx);
    assert_well_formed_stream(&events);
    match events.last() {
        Some(SyncEvent::Failed {
            msg,
        }) => assert!(msg.contains("UCP version is 1"), "got: {msg}"),
        other => panic!("expected failure event, got {:?}", other),
    }

    let watcher = manager.watcher();
    assert_eq!(watcher.lock().await.end_calls(), 1);
}

#[tokio::test]
async fn test_mid_sync_download_failure() {
    let remote = MockRemote::chain(1500, 2).with_failure_at(500);
    let requests = remote.requests_handle();
    let mut manager = manager(remote, MemoryLedger::new(), MemoryPeerService::new());
    let mut rx = manager.subscribe();

    let err = manager.sync(SyncOptions::default()).await.unwrap_err();
    assert_eq!(err.category(), "remote");

    {
        let ledger = manager.ledger();
        let ledger = ledger.lock().await;
        // The first chunk landed, nothing at or beyond the failure did.
        assert_eq!(ledger.block_numbers(), (0..=499).collect::<Vec<_>>());
        assert_eq!(ledger.stats().bulk_batches, 1);
        assert_eq!(ledger.finalized_at(), None);
        assert!(!ledger.root_parameters_saved());
    }

    // The chunk after the failing one was never requested.
    assert_eq!(*requests.lock().unwrap(), vec![(0, 500), (500, 500)]);

    let events = drain_events(&mut rx);
    assert_well_formed_stream(&events);
    assert!(matches!(
        events.last(),
        Some(SyncEvent::Failed {
            ..
        })
    ));

    let watcher = manager.watcher();
    assert_eq!(watcher.lock().await.end_calls(), 1);
}

#[tokio::test]
async fn test_explicit_fast_mode_with_existing_chain() {
    let remote = MockRemote::chain(300, 2);
    let mut manager = manager(remote, MemoryLedger::with_chain(chain(99)), MemoryPeerService::new());

    let summary = manager
        .sync(SyncOptions {
            cautious: Some(false),
            skip_peers: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(summary.blocks_applied, 201);
    let ledger = manager.ledger();
    let ledger = ledger.lock().await;
    assert_eq!(ledger.stats().bulk_batches, 1);
    assert_eq!(ledger.finalized_at(), Some(300));
    assert_eq!(ledger.tip_number(), Some(300));
}

#[tokio::test]
async fn test_explicit_cautious_mode_on_fresh_chain() {
    let remote = MockRemote::chain(20, 2);
    let mut manager = manager(remote, MemoryLedger::new(), MemoryPeerService::new());

    manager
        .sync(SyncOptions {
            cautious: Some(true),
            skip_peers: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap();

    let ledger = manager.ledger();
    let ledger = ledger.lock().await;
    assert_eq!(ledger.stats().bulk_batches, 0);
    assert_eq!(ledger.stats().blocks_submitted, 21);
    assert_eq!(ledger.finalized_at(), None);
    assert!(ledger.root_parameters_saved());
}

#[tokio::test]
async fn test_skip_peers_leaves_peer_table_alone() {
    let remote = MockRemote::chain(10, 2);
    let mut manager = manager(remote, MemoryLedger::new(), MemoryPeerService::new());

    let summary = manager
        .sync(SyncOptions {
            skip_peers: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap();

    assert!(!summary.peers_reconciled);
    let peers = manager.peers();
    assert!(peers.lock().await.submissions().is_empty());
}

#[tokio::test]
async fn test_bounded_sync_then_full_sync() {
    let remote = MockRemote::chain(1200, 2);
    let mut manager = manager(remote, MemoryLedger::new(), MemoryPeerService::new());

    // First pass: bounded, fast.
    let first = manager
        .sync(SyncOptions {
            to: Some(499),
            skip_peers: true,
            ..SyncOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(first.target, 499);
    assert_eq!(first.blocks_applied, 500);

    // Second pass: to the tip; a chain now exists, so cautious is picked.
    let mut rx = manager.subscribe();
    let second = manager.sync(SyncOptions::default()).await.unwrap();
    assert_eq!(second.target, 1200);
    assert_eq!(second.blocks_applied, 701);

    {
        let ledger = manager.ledger();
        let ledger = ledger.lock().await;
        assert_eq!(ledger.tip_number(), Some(1200));
        assert_eq!(ledger.stats().bulk_batches, 1);
    }

    // The second run has its own well-formed stream.
    let events = drain_events(&mut rx);
    assert_well_formed_stream(&events);

    let watcher = manager.watcher();
    assert_eq!(watcher.lock().await.end_calls(), 2);
}
