//! In-circuit building blocks: byte wires, SHA-256 and SSZ Merkle proofs.

pub mod bytes;
pub mod hash;
pub mod merkle;

pub use bytes::{ByteWires, Bytes32Var};
pub use merkle::{
    hash_tree_root, restore_merkle_root, restore_merkle_root_with_gindex_variable, verify_proof,
    verify_proof_with_gindex_variable,
};
