//! SSZ inclusion proof as a circuit function.
//!
//! Input:  `root (32) || gindex (8, big-endian)`
//! Output: `leaf (32)`
//! Private: the leaf and its sibling path.
//!
//! The gindex stays a witness value, so one build serves every leaf position
//! at the configured depth.

use ark_bn254::Fr;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::ConstraintSystemRef;

use crate::circuit::bytes::{ByteWires, alloc_bytes32, to_bytes32, uint64_from_be_bytes};
use crate::circuit::merkle::verify_proof_with_gindex_variable;
use crate::constants::{DIGEST_LEN, GINDEX_LEN};
use crate::errors::{ProverError, Result};
use crate::function::Circuit;
use crate::native::Bytes32;

pub const INPUT_LEN: usize = DIGEST_LEN + GINDEX_LEN;

/// Packs a root and gindex into circuit input bytes.
pub fn encode_input(root: &Bytes32, gindex: u64) -> Vec<u8> {
    let mut input = Vec::with_capacity(INPUT_LEN);
    input.extend_from_slice(root);
    input.extend_from_slice(&gindex.to_be_bytes());
    input
}

#[derive(Clone, Debug)]
pub struct InclusionCircuit {
    depth: usize,
    leaf: Option<Bytes32>,
    siblings: Option<Vec<Bytes32>>,
    input: ByteWires,
    output: ByteWires,
}

impl InclusionCircuit {
    /// Circuit for proofs of exactly `depth` siblings.
    pub fn new(depth: usize) -> Result<Self> {
        if depth >= 64 {
            return Err(ProverError::ProofTooDeep(depth));
        }
        Ok(Self {
            depth,
            leaf: None,
            siblings: None,
            input: ByteWires::new(INPUT_LEN),
            output: ByteWires::new(DIGEST_LEN),
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Sets the private leaf and sibling path.
    pub fn assign_proof(&mut self, leaf: Bytes32, siblings: Vec<Bytes32>) -> Result<()> {
        if siblings.len() != self.depth {
            return Err(ProverError::InvalidLength {
                what: "merkle proof",
                expected: self.depth,
                got: siblings.len(),
            });
        }
        self.leaf = Some(leaf);
        self.siblings = Some(siblings);
        Ok(())
    }
}

impl Circuit for InclusionCircuit {
    fn set_witness(&mut self, input_bytes: &[u8]) -> Result<()> {
        if self.leaf.is_none() || self.siblings.is_none() {
            return Err(ProverError::WitnessMissing("merkle proof"));
        }
        self.input.assign(input_bytes)
    }

    fn define(&mut self, cs: ConstraintSystemRef<Fr>) -> Result<()> {
        let input = self.input.alloc(cs.clone())?.to_vec();
        let root = to_bytes32(input[..DIGEST_LEN].to_vec())?;
        let gindex = uint64_from_be_bytes(&input[DIGEST_LEN..])?;

        let leaf = alloc_bytes32(cs.clone(), self.leaf.as_ref(), AllocationMode::Witness)?;
        let siblings = (0..self.depth)
            .map(|i| {
                let value = self.siblings.as_ref().map(|s| &s[i]);
                alloc_bytes32(cs.clone(), value, AllocationMode::Witness)
            })
            .collect::<Result<Vec<_>>>()?;

        verify_proof_with_gindex_variable(&root, &leaf, &siblings, &gindex)?;
        self.output.bind(leaf.to_vec())
    }

    fn input_bytes(&self) -> &[UInt8<Fr>] {
        self.input.vars()
    }

    fn output_bytes(&self) -> &[UInt8<Fr>] {
        self.output.vars()
    }
}
