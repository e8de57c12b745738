//! Test fixtures: a scriptable remote peer and a recording watcher.
//!
//! Available to unit tests and, with the `test-utils` feature, to
//! integration tests and downstream crates.

pub mod remote;
pub mod watcher;

pub use remote::MockRemote;
pub use watcher::CollectingWatcher;

use crate::types::{Block, PeeringEntry, Transaction};

/// Deterministic block for the given number.
///
/// Carries one transaction so cautious application has something to
/// canonicalize, and currency parameters on the root block.
pub fn test_block(number: u64) -> Block {
    Block {
        number,
        version: 1,
        currency: "meta_brouzouf".to_string(),
        transactions: vec![Transaction {
            signatories: vec![format!("Issuer{number}")],
            inputs: vec![format!("0:D:{number}:10")],
            outputs: vec![format!("Receiver{number}:10")],
            comment: None,
            locktime: None,
            signatures: vec![format!("sig{number}")],
            ..Transaction::default()
        }],
        parameters: (number == 0).then(|| "0.1:86400:100".to_string()),
    }
}

/// Signed peering entry for the given pubkey.
pub fn test_peering_entry(pubkey: &str, block_ref: &str) -> PeeringEntry {
    PeeringEntry {
        version: 1,
        currency: "meta_brouzouf".to_string(),
        pubkey: pubkey.to_string(),
        endpoints: vec![format!("BASIC_MERKLED_API {pubkey}.example.net 9101")],
        block: block_ref.to_string(),
        signature: Some(format!("sig-{pubkey}")),
    }
}
