//! Shared helpers for the integration suites.

use ucp_sync::test_utils::{CollectingWatcher, MockRemote};
use ucp_sync::{
    EventReceiver, LevelFilter, MemoryLedger, MemoryPeerService, SyncConfig, SyncEvent, SyncManager,
};

/// Manager over in-memory collaborators with the standard test config.
pub fn manager(
    remote: MockRemote,
    ledger: MemoryLedger,
    peers: MemoryPeerService,
) -> SyncManager<MockRemote, MemoryLedger, MemoryPeerService, CollectingWatcher> {
    let _ = ucp_sync::init_console_logging(LevelFilter::WARN);
    SyncManager::new(SyncConfig::new("meta_brouzouf"), remote, ledger, peers, CollectingWatcher::new())
        .expect("valid test config")
}

/// Drain every buffered event after a sync has returned.
pub fn drain_events(rx: &mut EventReceiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert the §8-style stream shape: monotone bounded progress and exactly
/// one terminal event, placed last.
pub fn assert_well_formed_stream(events: &[SyncEvent]) {
    assert!(!events.is_empty(), "a sync must emit at least its terminal event");
    assert!(events.last().expect("nonempty").is_terminal(), "stream must end with the terminal event");
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1, "exactly one terminal event");

    let mut last_download = 0u8;
    let mut last_applied = 0u8;
    for event in events {
        match event {
            SyncEvent::DownloadProgress {
                pct,
            } => {
                assert!(*pct <= 100);
                assert!(*pct >= last_download, "download progress went backwards");
                last_download = *pct;
            }
            SyncEvent::AppliedProgress {
                pct,
            } => {
                assert!(*pct <= 100);
                assert!(*pct >= last_applied, "applied progress went backwards");
                last_applied = *pct;
            }
            _ => {}
        }
    }
}
