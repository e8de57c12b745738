//! Core types shared across the synchronization pipeline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A chain entry as exchanged with remote peers and stored in the ledger.
///
/// Blocks are opaque to the sync core beyond their `number`: validation is
/// the ledger's business. Transactions are carried along so cautious
/// application can rebuild their canonical form before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, starting at 0 for the root block.
    pub number: u64,
    /// Block document version.
    pub version: u32,
    /// Currency name this block belongs to.
    pub currency: String,
    /// Transactions included in this block.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Currency parameters, present on the root block only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

/// A transaction carried inside a [`Block`].
///
/// Signatories, inputs, outputs and signatures are kept in their raw line
/// form; the sync core only needs them to rebuild the canonical document
/// for hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction document version, stamped from local config on apply.
    #[serde(default)]
    pub version: u32,
    /// Currency name, stamped from local config on apply.
    #[serde(default)]
    pub currency: String,
    /// Issuing public keys, copied from `signatories` on apply.
    #[serde(default)]
    pub issuers: Vec<String>,
    /// Public keys signing the transaction.
    pub signatories: Vec<String>,
    /// Spent sources, one raw line each.
    pub inputs: Vec<String>,
    /// Produced amounts, one raw line each.
    pub outputs: Vec<String>,
    /// Optional free-text comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Optional locktime, defaults to 0 in the canonical form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locktime: Option<u64>,
    /// Detached signatures, one per signatory.
    pub signatures: Vec<String>,
    /// Uppercase hex hash of the canonical form, set on apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Transaction {
    /// Build the canonical serialized form used for hashing.
    ///
    /// Layout:
    ///
    /// ```text
    /// TX:<version>:<N_sig>:<N_in>:<N_out>:<has_comment>:<locktime>\n
    /// <signatories, one per line>
    /// <inputs, one per line>
    /// <outputs, one per line>
    /// [<comment line, when present>]
    /// <signatures, one per line>
    /// ```
    pub fn canonical_form(&self) -> String {
        let mut doc = format!(
            "TX:{}:{}:{}:{}:{}:{}\n",
            self.version,
            self.signatories.len(),
            self.inputs.len(),
            self.outputs.len(),
            u8::from(self.comment.is_some()),
            self.locktime.unwrap_or(0),
        );
        for signatory in &self.signatories {
            doc.push_str(signatory);
            doc.push('\n');
        }
        for input in &self.inputs {
            doc.push_str(input);
            doc.push('\n');
        }
        for output in &self.outputs {
            doc.push_str(output);
            doc.push('\n');
        }
        if let Some(comment) = &self.comment {
            doc.push_str(comment);
            doc.push('\n');
        }
        for signature in &self.signatures {
            doc.push_str(signature);
            doc.push('\n');
        }
        doc
    }

    /// Stamp local document version and currency, copy signatories into
    /// issuers, and set `hash` from the canonical form.
    ///
    /// Cautious application calls this for every transaction before the
    /// block is handed to the ledger.
    pub fn canonicalize(&mut self, currency: &str, document_version: u32) {
        self.version = document_version;
        self.currency = currency.to_string();
        self.issuers = self.signatories.clone();
        self.hash = Some(uppercase_sha256(self.canonical_form().as_bytes()));
    }
}

/// A contiguous range of block numbers downloaded as one remote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// First block number in the range, inclusive.
    pub first: u64,
    /// Last block number in the range, inclusive.
    pub last: u64,
}

impl Chunk {
    /// Number of blocks covered by this chunk.
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    /// Chunks are never empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}..#{}", self.first, self.last)
    }
}

/// A chunk together with its downloaded blocks.
#[derive(Debug, Clone)]
pub struct DownloadedChunk {
    /// The range that was requested.
    pub chunk: Chunk,
    /// The blocks the remote returned, in unspecified order.
    pub blocks: Vec<Block>,
}

/// A signed record identifying a peer on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeeringEntry {
    /// Peering document version.
    pub version: u32,
    /// Currency the peer serves.
    pub currency: String,
    /// The peer's public key.
    pub pubkey: String,
    /// Reachable endpoints, in the peer's preference order.
    pub endpoints: Vec<String>,
    /// Reference block, as `<number>-<hash>`.
    pub block: String,
    /// Detached signature over the canonical form; may be absent on
    /// malformed entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl PeeringEntry {
    /// Canonical serialized form a signature verifier consumes.
    pub fn canonical_form(&self) -> String {
        let mut doc = format!("PEER:{}:{}:{}:{}\n", self.version, self.currency, self.pubkey, self.block);
        for endpoint in &self.endpoints {
            doc.push_str(endpoint);
            doc.push('\n');
        }
        doc
    }

    /// Hash of the canonical form, used as this entry's Merkle leaf.
    pub fn leaf_hash(&self) -> String {
        uppercase_sha256(self.canonical_form().as_bytes())
    }

    /// Block number parsed out of the `<number>-<hash>` reference.
    pub fn reference_block_number(&self) -> Option<u64> {
        self.block.split('-').next()?.parse().ok()
    }
}

/// Summary of a remote peer set, used for Merkle reconciliation.
///
/// Two peer sets are equal iff their roots match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesMerkle {
    /// Depth of the remote's Merkle tree.
    pub depth: u32,
    /// Total node count of the tree.
    pub nodes_count: u32,
    /// Number of leaves.
    pub leaves_count: u32,
    /// Root hash.
    pub root: String,
}

/// The local side's peer-set summary, as served by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeersMerkle {
    /// Root hash over the local leaves.
    pub root: String,
    /// Leaf hashes of every known peering entry.
    pub leaves: Vec<String>,
}

/// Chain head information reported by a remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTip {
    /// Number of the remote's current block.
    pub number: u64,
    /// UCP protocol version the remote speaks.
    pub version: u32,
}

/// Uppercase hex SHA-256 over the given bytes.
pub(crate) fn uppercase_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode_upper(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            signatories: vec!["HsLShA".to_string()],
            inputs: vec!["0:T:D717FEC1:8".to_string()],
            outputs: vec!["BYfWYF:8".to_string()],
            comment: Some("test payment".to_string()),
            locktime: None,
            signatures: vec!["42yQm4hGTJYWkPg39hQAUgP6S6EQ4vTfXdJuxKEHL1ih".to_string()],
            ..Transaction::default()
        }
    }

    #[test]
    fn test_canonical_form_layout() {
        let mut tx = sample_tx();
        tx.version = 2;
        assert_eq!(
            tx.canonical_form(),
            "TX:2:1:1:1:1:0\n\
             HsLShA\n\
             0:T:D717FEC1:8\n\
             BYfWYF:8\n\
             test payment\n\
             42yQm4hGTJYWkPg39hQAUgP6S6EQ4vTfXdJuxKEHL1ih\n"
        );
    }

    #[test]
    fn test_canonical_form_without_comment() {
        let mut tx = sample_tx();
        tx.version = 2;
        tx.comment = None;
        tx.locktime = Some(99);
        let doc = tx.canonical_form();
        assert!(doc.starts_with("TX:2:1:1:1:0:99\n"));
        assert!(!doc.contains("test payment"));
    }

    #[test]
    fn test_canonicalize_stamps_and_hashes() {
        let mut tx = sample_tx();
        tx.canonicalize("meta_brouzouf", 2);

        assert_eq!(tx.version, 2);
        assert_eq!(tx.currency, "meta_brouzouf");
        assert_eq!(tx.issuers, tx.signatories);

        let hash = tx.hash.clone().expect("hash set");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash.to_uppercase());
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let mut a = sample_tx();
        let mut b = sample_tx();
        a.canonicalize("meta_brouzouf", 2);
        b.canonicalize("meta_brouzouf", 2);
        assert_eq!(a.hash, b.hash);

        // Re-canonicalizing does not change the hash.
        let first = a.hash.clone();
        a.canonicalize("meta_brouzouf", 2);
        assert_eq!(a.hash, first);
    }

    #[test]
    fn test_hash_depends_on_fields() {
        let mut a = sample_tx();
        let mut b = sample_tx();
        b.comment = Some("other".to_string());
        a.canonicalize("meta_brouzouf", 2);
        b.canonicalize("meta_brouzouf", 2);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_chunk_len() {
        let chunk = Chunk {
            first: 500,
            last: 999,
        };
        assert_eq!(chunk.len(), 500);
        assert_eq!(
            Chunk {
                first: 7,
                last: 7
            }
            .len(),
            1
        );
        assert_eq!(chunk.to_string(), "#500..#999");
    }

    #[test]
    fn test_peering_entry_reference_block() {
        let entry = PeeringEntry {
            version: 1,
            currency: "meta_brouzouf".to_string(),
            pubkey: "HsLShA".to_string(),
            endpoints: vec!["BASIC_MERKLED_API node.example.net 9101".to_string()],
            block: "42-00ABCD".to_string(),
            signature: None,
        };
        assert_eq!(entry.reference_block_number(), Some(42));
        assert!(entry.canonical_form().starts_with("PEER:1:meta_brouzouf:HsLShA:42-00ABCD\n"));
        assert_eq!(entry.leaf_hash().len(), 64);
    }
}
