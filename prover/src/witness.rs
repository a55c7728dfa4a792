//! JSON witness files read by the command line.
//!
//! ```json
//! {
//!   "root": "0x…",
//!   "leaf": "0x…",
//!   "gindex": 5,
//!   "proof": ["0x…", "0x…"]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifacts::{self, Artifact};
use crate::circuits::{InclusionCircuit, ListRootCircuit, inclusion, list_root};
use crate::errors::{ProverError, Result};
use crate::native::{self, Bytes32};
use crate::proof::hex_word;

/// Leaf, sibling path and gindex under a claimed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionWitness {
    #[serde(with = "hex_word")]
    pub root: Bytes32,
    #[serde(with = "hex_word")]
    pub leaf: Bytes32,
    pub gindex: u64,
    #[serde(with = "hex_word::vec")]
    pub proof: Vec<Bytes32>,
}

impl InclusionWitness {
    /// Witness for `leaves[index]` in the perfect tree over `leaves`.
    pub fn from_leaves(leaves: &[Bytes32], index: usize) -> Result<Self> {
        let (proof, gindex) = native::merkle_proof(leaves, index)?;
        Ok(Self {
            root: native::hash_tree_root(leaves)?,
            leaf: leaves[index],
            gindex,
            proof,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        from_json(&artifacts::read_to_string(Artifact::Witness, path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        artifacts::write(Artifact::Witness, path, to_json(self)?.as_bytes())
    }

    /// Host-side check of the path, before any constraint is built.
    pub fn is_consistent(&self) -> bool {
        native::check_gindex(self.gindex, self.proof.len()).is_ok()
            && native::restore_merkle_root(&self.leaf, &self.proof, self.gindex) == self.root
    }

    pub fn input_bytes(&self) -> Vec<u8> {
        inclusion::encode_input(&self.root, self.gindex)
    }

    /// A circuit of matching depth with the private path assigned.
    pub fn circuit(&self) -> Result<InclusionCircuit> {
        let mut circuit = InclusionCircuit::new(self.proof.len())?;
        circuit.assign_proof(self.leaf, self.proof.clone())?;
        Ok(circuit)
    }
}

/// Leaves whose hash_tree_root is proven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWitness {
    #[serde(with = "hex_word::vec")]
    pub leaves: Vec<Bytes32>,
}

impl ListWitness {
    pub fn load(path: &Path) -> Result<Self> {
        from_json(&artifacts::read_to_string(Artifact::Witness, path)?)
    }

    pub fn input_bytes(&self) -> Vec<u8> {
        list_root::encode_input(&self.leaves)
    }

    pub fn circuit(&self) -> Result<ListRootCircuit> {
        ListRootCircuit::new(self.leaves.len())
    }
}

fn from_json<T: for<'de> Deserialize<'de>>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|source| ProverError::Json {
        artifact: Artifact::Witness,
        source,
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|source| ProverError::Json {
        artifact: Artifact::Witness,
        source,
    })
}
