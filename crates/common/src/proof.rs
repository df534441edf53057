//! Notarization proof types
//!
//! Proofs are produced elsewhere (Merkle tree construction and ledger
//! anchoring are not part of this crate). The repository only needs two
//! facts from a proof: the hash it certifies and the source id of its first
//! anchor. Anything implementing [`AnchoredProof`] and `Serialize` can be
//! stored.

use serde::{Deserialize, Serialize};

/// A proof binding a target hash to zero or more ledger anchors
pub trait AnchoredProof {
    /// Hash of the notarized document
    fn target_hash(&self) -> &str;

    /// Source id (transaction hash) of the first anchor, if any
    fn first_anchor_source(&self) -> Option<&str>;
}

/// Chainpoint v3 proof document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chainpoint {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,

    #[serde(rename = "type", default = "default_proof_type")]
    pub proof_type: String,

    pub target_hash: String,

    #[serde(default)]
    pub merkle_root: String,

    /// Inclusion path from target hash to merkle root
    #[serde(default)]
    pub proof: Vec<ProofStep>,

    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

/// One sibling in the inclusion path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofStep {
    Left(String),
    Right(String),
}

/// Ledger transaction that committed the merkle root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    /// Ledger kind, e.g. `ETHData`
    #[serde(rename = "type")]
    pub anchor_type: String,

    pub source_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
}

fn default_context() -> String { "https://w3id.org/chainpoint/v3".to_string() }
fn default_proof_type() -> String { "ChainpointSHA256v3".to_string() }

impl Chainpoint {
    /// Proof for `target_hash` with an empty path and no anchors
    pub fn new(target_hash: impl Into<String>) -> Self {
        Self {
            context: default_context(),
            proof_type: default_proof_type(),
            target_hash: target_hash.into(),
            merkle_root: String::new(),
            proof: Vec::new(),
            anchors: Vec::new(),
        }
    }

    pub fn with_merkle_root(mut self, root: impl Into<String>) -> Self {
        self.merkle_root = root.into();
        self
    }

    pub fn with_step(mut self, step: ProofStep) -> Self {
        self.proof.push(step);
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchors.push(anchor);
        self
    }
}

impl Anchor {
    /// Ethereum data anchor for the given transaction hash
    pub fn eth(source_id: impl Into<String>) -> Self {
        Self {
            anchor_type: "ETHData".to_string(),
            source_id: source_id.into(),
            uris: Vec::new(),
        }
    }
}

impl AnchoredProof for Chainpoint {
    fn target_hash(&self) -> &str {
        &self.target_hash
    }

    fn first_anchor_source(&self) -> Option<&str> {
        self.anchors.first().map(|a| a.source_id.as_str())
    }
}
