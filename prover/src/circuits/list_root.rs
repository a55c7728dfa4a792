//! hash_tree_root of a fixed number of leaves as a circuit function.
//!
//! Input:  `leaf_0 || leaf_1 || ... || leaf_{n-1}`, 32 bytes each
//! Output: the root

use ark_bn254::Fr;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::ConstraintSystemRef;

use crate::circuit::bytes::{ByteWires, to_bytes32};
use crate::circuit::merkle::hash_tree_root;
use crate::constants::DIGEST_LEN;
use crate::errors::{ProverError, Result};
use crate::function::Circuit;
use crate::native::Bytes32;

/// Concatenates leaves into circuit input bytes.
pub fn encode_input(leaves: &[Bytes32]) -> Vec<u8> {
    leaves.concat()
}

#[derive(Clone, Debug)]
pub struct ListRootCircuit {
    nb_leaves: usize,
    input: ByteWires,
    output: ByteWires,
}

impl ListRootCircuit {
    pub fn new(nb_leaves: usize) -> Result<Self> {
        if !nb_leaves.is_power_of_two() {
            return Err(ProverError::LeafCountNotPowerOfTwo(nb_leaves));
        }
        let input_len = nb_leaves
            .checked_mul(DIGEST_LEN)
            .ok_or(ProverError::TooManyLeaves(nb_leaves))?;
        Ok(Self {
            nb_leaves,
            input: ByteWires::new(input_len),
            output: ByteWires::new(DIGEST_LEN),
        })
    }

    pub fn nb_leaves(&self) -> usize {
        self.nb_leaves
    }
}

impl Circuit for ListRootCircuit {
    fn set_witness(&mut self, input_bytes: &[u8]) -> Result<()> {
        self.input.assign(input_bytes)
    }

    fn define(&mut self, cs: ConstraintSystemRef<Fr>) -> Result<()> {
        let leaves = self
            .input
            .alloc(cs)?
            .chunks(DIGEST_LEN)
            .map(|chunk| to_bytes32(chunk.to_vec()))
            .collect::<Result<Vec<_>>>()?;
        let root = hash_tree_root(&leaves, self.nb_leaves)?;
        self.output.bind(root.to_vec())
    }

    fn input_bytes(&self) -> &[UInt8<Fr>] {
        self.input.vars()
    }

    fn output_bytes(&self) -> &[UInt8<Fr>] {
        self.output.vars()
    }
}
