//! SSZ Merkle proofs addressed by generalized index.
//!
//! ```text
//!                 1
//!              /     \
//!            2         3
//!           / \       / \
//!          4   5     6   7      gindex 5 = 0b101
//! ```
//!
//! Bit `i` of a gindex (least significant first) is 1 when the node at depth
//! `i` above the leaf is a right child. The leading 1 marks the root.

use ark_bn254::Fr;
use ark_r1cs_std::prelude::*;

use super::bytes::{Bytes32Var, enforce_bytes_equal, select_bytes32};
use super::hash::sha256_pair;
use crate::errors::{ProverError, Result};
use crate::native::check_gindex;

pub use crate::native::gindex_depth;

/// Rebuilds the root from `leaf` and its sibling path for a gindex known at
/// compile time. Costs one hash per level.
pub fn restore_merkle_root(
    leaf: &Bytes32Var,
    proof: &[Bytes32Var],
    gindex: u64,
) -> Result<Bytes32Var> {
    check_gindex(gindex, proof.len())?;

    let mut hash = leaf.clone();
    let mut index = gindex;
    for sibling in proof {
        hash = if index % 2 == 1 {
            sha256_pair(sibling, &hash)?
        } else {
            sha256_pair(&hash, sibling)?
        };
        index /= 2;
    }
    Ok(hash)
}

/// Asserts that `leaf` sits at `gindex` under `root`.
pub fn verify_proof(
    root: &Bytes32Var,
    leaf: &Bytes32Var,
    proof: &[Bytes32Var],
    gindex: u64,
) -> Result<()> {
    let restored = restore_merkle_root(leaf, proof, gindex)?;
    enforce_bytes_equal(root, &restored)
}

/// Rebuilds the root for a gindex only known at witness time.
///
/// Both concatenation orders are hashed at every level and the bit of the
/// gindex picks one, so this costs two hashes per level. The gindex is
/// decomposed into `proof.len() + 1` bits: the top one must be the root
/// marker and nothing may sit above it.
pub fn restore_merkle_root_with_gindex_variable(
    leaf: &Bytes32Var,
    proof: &[Bytes32Var],
    gindex: &UInt64<Fr>,
) -> Result<Bytes32Var> {
    let depth = proof.len();
    if depth >= 64 {
        return Err(ProverError::ProofTooDeep(depth));
    }

    let bits = gindex.to_bits_le()?;
    bits[depth].enforce_equal(&Boolean::TRUE)?;
    for bit in &bits[depth + 1..] {
        bit.enforce_equal(&Boolean::FALSE)?;
    }

    let mut hash = leaf.clone();
    for (sibling, is_right) in proof.iter().zip(bits.iter()) {
        let as_right = sha256_pair(sibling, &hash)?;
        let as_left = sha256_pair(&hash, sibling)?;
        hash = select_bytes32(is_right, &as_right, &as_left)?;
    }
    Ok(hash)
}

/// Asserts that `leaf` sits at the runtime `gindex` under `root`.
pub fn verify_proof_with_gindex_variable(
    root: &Bytes32Var,
    leaf: &Bytes32Var,
    proof: &[Bytes32Var],
    gindex: &UInt64<Fr>,
) -> Result<()> {
    let restored = restore_merkle_root_with_gindex_variable(leaf, proof, gindex)?;
    enforce_bytes_equal(root, &restored)
}

/// Root of the perfect binary tree over the first `nb_leaves` leaves.
pub fn hash_tree_root(leaves: &[Bytes32Var], nb_leaves: usize) -> Result<Bytes32Var> {
    if !nb_leaves.is_power_of_two() {
        return Err(ProverError::LeafCountNotPowerOfTwo(nb_leaves));
    }
    if leaves.len() < nb_leaves {
        return Err(ProverError::NotEnoughLeaves {
            needed: nb_leaves,
            got: leaves.len(),
        });
    }

    let mut layer = leaves[..nb_leaves].to_vec();
    while layer.len() > 1 {
        layer = layer
            .chunks_exact(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect::<Result<Vec<_>>>()?;
    }
    Ok(layer.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::bytes::{alloc_bytes32, bytes_value};
    use crate::native::{self, Bytes32};
    use ark_r1cs_std::alloc::AllocationMode;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};

    fn witness(cs: &ConstraintSystemRef<Fr>, value: &Bytes32) -> Bytes32Var {
        alloc_bytes32(cs.clone(), Some(value), AllocationMode::Witness).unwrap()
    }

    fn witness_all(cs: &ConstraintSystemRef<Fr>, values: &[Bytes32]) -> Vec<Bytes32Var> {
        values.iter().map(|v| witness(cs, v)).collect()
    }

    fn sample_leaves(n: usize) -> Vec<Bytes32> {
        (0..n).map(|i| native::sha256(&[i as u8])).collect()
    }

    #[test]
    fn test_restore_matches_reference() {
        let leaves = sample_leaves(4);
        let root = native::hash_tree_root(&leaves).unwrap();

        for index in 0..leaves.len() {
            let (proof, gindex) = native::merkle_proof(&leaves, index).unwrap();
            let cs = ConstraintSystem::<Fr>::new_ref();
            let leaf_var = witness(&cs, &leaves[index]);
            let proof_vars = witness_all(&cs, &proof);

            let restored = restore_merkle_root(&leaf_var, &proof_vars, gindex).unwrap();
            assert_eq!(bytes_value(&restored).unwrap(), root.to_vec());
            assert!(cs.is_satisfied().unwrap());
        }
    }

    #[test]
    fn test_gindex_five_order() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = [0u8; 32];
        let s0 = native::sha256(b"s0");
        let s1 = native::sha256(b"s1");

        let level1 = native::sha256_pair(&s0, &leaf);
        let expected = native::sha256_pair(&level1, &s1);

        let restored =
            restore_merkle_root(&witness(&cs, &leaf), &witness_all(&cs, &[s0, s1]), 5).unwrap();
        assert_eq!(bytes_value(&restored).unwrap(), expected.to_vec());
    }

    #[test]
    fn test_constant_gindex_rejects_wrong_depth() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = witness(&cs, &[0u8; 32]);
        let proof = witness_all(&cs, &sample_leaves(2));

        for gindex in [0u64, 1, 3, 8, 13] {
            let err = restore_merkle_root(&leaf, &proof, gindex).unwrap_err();
            assert!(matches!(err, ProverError::InvalidGIndex { .. }), "gindex {gindex}");
        }
    }

    #[test]
    fn test_verify_proof_rejects_forged_sibling() {
        let leaves = sample_leaves(4);
        let root = native::hash_tree_root(&leaves).unwrap();
        let (mut proof, gindex) = native::merkle_proof(&leaves, 2).unwrap();
        proof[1][0] ^= 1;

        let cs = ConstraintSystem::<Fr>::new_ref();
        verify_proof(
            &witness(&cs, &root),
            &witness(&cs, &leaves[2]),
            &witness_all(&cs, &proof),
            gindex,
        )
        .unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_variable_gindex_matches_constant() {
        let leaves = sample_leaves(4);
        let root = native::hash_tree_root(&leaves).unwrap();

        for index in 0..leaves.len() {
            let (proof, gindex) = native::merkle_proof(&leaves, index).unwrap();
            let cs = ConstraintSystem::<Fr>::new_ref();
            let leaf_var = witness(&cs, &leaves[index]);
            let proof_vars = witness_all(&cs, &proof);
            let gindex_var = UInt64::new_witness(cs.clone(), || Ok(gindex)).unwrap();

            let constant = restore_merkle_root(&leaf_var, &proof_vars, gindex).unwrap();
            let variable =
                restore_merkle_root_with_gindex_variable(&leaf_var, &proof_vars, &gindex_var)
                    .unwrap();
            assert_eq!(
                bytes_value(&constant).unwrap(),
                bytes_value(&variable).unwrap()
            );

            verify_proof_with_gindex_variable(
                &witness(&cs, &root),
                &leaf_var,
                &proof_vars,
                &gindex_var,
            )
            .unwrap();
            assert!(cs.is_satisfied().unwrap());
        }
    }

    #[test]
    fn test_variable_gindex_out_of_range_is_unsatisfied() {
        let leaves = sample_leaves(4);
        let root = native::hash_tree_root(&leaves).unwrap();
        let (proof, gindex) = native::merkle_proof(&leaves, 1).unwrap();
        assert_eq!(gindex, 5);

        // 0b01 drops the root marker, 0b1101 carries an extra level.
        for forged in [1u64, 13, 5 + (1 << 40)] {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let gindex_var = UInt64::new_witness(cs.clone(), || Ok(forged)).unwrap();
            verify_proof_with_gindex_variable(
                &witness(&cs, &root),
                &witness(&cs, &leaves[1]),
                &witness_all(&cs, &proof),
                &gindex_var,
            )
            .unwrap();
            assert!(!cs.is_satisfied().unwrap(), "gindex {forged}");
        }
    }

    #[test]
    fn test_hash_tree_root_matches_reference() {
        let leaves = sample_leaves(4);
        let cs = ConstraintSystem::<Fr>::new_ref();
        let root = hash_tree_root(&witness_all(&cs, &leaves), 4).unwrap();
        assert_eq!(
            bytes_value(&root).unwrap(),
            native::hash_tree_root(&leaves).unwrap().to_vec()
        );
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_hash_tree_root_single_byte_sensitivity() {
        let leaves = sample_leaves(2);
        let mut changed = leaves.clone();
        changed[1][17] ^= 0x80;

        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = hash_tree_root(&witness_all(&cs, &leaves), 2).unwrap();
        let again = hash_tree_root(&witness_all(&cs, &leaves), 2).unwrap();
        let b = hash_tree_root(&witness_all(&cs, &changed), 2).unwrap();

        assert_eq!(bytes_value(&a).unwrap(), bytes_value(&again).unwrap());
        assert_ne!(bytes_value(&a).unwrap(), bytes_value(&b).unwrap());
    }

    #[test]
    fn test_hash_tree_root_rejects_bad_counts() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaves = witness_all(&cs, &sample_leaves(5));

        for n in [0usize, 3, 5] {
            assert!(matches!(
                hash_tree_root(&leaves, n),
                Err(ProverError::LeafCountNotPowerOfTwo(got)) if got == n
            ));
        }
        assert!(matches!(
            hash_tree_root(&leaves[..2], 4),
            Err(ProverError::NotEnoughLeaves { needed: 4, got: 2 })
        ));
    }
}
