//! Host-side SHA-256 helpers and reference Merkle computations.
//!
//! These mirror the in-circuit gadgets byte for byte and are used to assign
//! witnesses, build fixtures and cross-check circuit outputs.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

use crate::constants::DIGEST_LEN;
use crate::errors::{ProverError, Result};

pub type Bytes32 = [u8; DIGEST_LEN];

pub fn sha256(data: &[u8]) -> Bytes32 {
    Sha256::digest(data).into()
}

/// SHA-256 of `left || right`
pub fn sha256_pair(left: &Bytes32, right: &Bytes32) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Keeps the low `nbits` bits of a big-endian 256-bit value.
pub fn truncate(mut digest: Bytes32, nbits: usize) -> Bytes32 {
    let cleared = DIGEST_LEN * 8 - nbits.min(DIGEST_LEN * 8);
    for (i, byte) in digest.iter_mut().enumerate() {
        let byte_start = i * 8;
        if byte_start + 8 <= cleared {
            *byte = 0;
        } else if byte_start < cleared {
            *byte &= 0xff >> (cleared - byte_start);
        }
    }
    digest
}

/// `sha256(data) & ((1 << nbits) - 1)`, big-endian
pub fn hash_and_truncate(data: &[u8], nbits: usize) -> Bytes32 {
    truncate(sha256(data), nbits)
}

/// Interprets a commitment as a big-endian field element.
pub fn commitment_to_field(commitment: &Bytes32) -> Fr {
    Fr::from_be_bytes_mod_order(commitment)
}

/// Depth of the node a generalized index points at (`floor(log2(gindex))`).
pub fn gindex_depth(gindex: u64) -> Option<usize> {
    if gindex == 0 {
        None
    } else {
        Some(63 - gindex.leading_zeros() as usize)
    }
}

/// Checks that `gindex` addresses a node exactly `proof_len` levels below the root.
pub fn check_gindex(gindex: u64, proof_len: usize) -> Result<()> {
    if proof_len >= 64 {
        return Err(ProverError::ProofTooDeep(proof_len));
    }
    match gindex_depth(gindex) {
        Some(depth) if depth == proof_len => Ok(()),
        _ => Err(ProverError::InvalidGIndex { gindex, proof_len }),
    }
}

/// Reference root reconstruction: odd index hashes `sibling || node`,
/// even index hashes `node || sibling`.
pub fn restore_merkle_root(leaf: &Bytes32, proof: &[Bytes32], mut gindex: u64) -> Bytes32 {
    let mut hash = *leaf;
    for sibling in proof {
        hash = if gindex % 2 == 1 {
            sha256_pair(sibling, &hash)
        } else {
            sha256_pair(&hash, sibling)
        };
        gindex /= 2;
    }
    hash
}

/// Root of a perfect binary tree over `leaves`.
pub fn hash_tree_root(leaves: &[Bytes32]) -> Result<Bytes32> {
    if !leaves.len().is_power_of_two() {
        return Err(ProverError::LeafCountNotPowerOfTwo(leaves.len()));
    }
    let mut layer = leaves.to_vec();
    while layer.len() > 1 {
        layer = layer
            .chunks_exact(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
    }
    Ok(layer[0])
}

/// Sibling path and generalized index for `leaves[index]` in a perfect tree.
pub fn merkle_proof(leaves: &[Bytes32], index: usize) -> Result<(Vec<Bytes32>, u64)> {
    if !leaves.len().is_power_of_two() {
        return Err(ProverError::LeafCountNotPowerOfTwo(leaves.len()));
    }
    if index >= leaves.len() {
        return Err(ProverError::NotEnoughLeaves {
            needed: index + 1,
            got: leaves.len(),
        });
    }

    let mut proof = Vec::new();
    let mut layer = leaves.to_vec();
    let mut position = index;
    while layer.len() > 1 {
        proof.push(layer[position ^ 1]);
        layer = layer
            .chunks_exact(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
        position /= 2;
    }

    let gindex = (leaves.len() + index) as u64;
    Ok((proof, gindex))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> Bytes32 {
        [n; 32]
    }

    #[test]
    fn test_truncate_253() {
        let t = truncate([0xff; 32], 253);
        assert_eq!(t[0], 0x1f);
        assert!(t[1..].iter().all(|b| *b == 0xff));

        let t = truncate([0xff; 32], 250);
        assert_eq!(t[0], 0x03);
        assert_eq!(t[1], 0xff);

        let t = truncate([0xff; 32], 248);
        assert_eq!(t[0], 0x00);
        assert!(t[1..].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_known_sha256() {
        // sha256("abc")
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_gindex_depth() {
        assert_eq!(gindex_depth(0), None);
        assert_eq!(gindex_depth(1), Some(0));
        assert_eq!(gindex_depth(5), Some(2));
        assert_eq!(gindex_depth(7), Some(2));
        assert_eq!(gindex_depth(8), Some(3));
        assert!(check_gindex(5, 2).is_ok());
        assert!(check_gindex(3, 2).is_err());
        assert!(check_gindex(8, 2).is_err());
    }

    #[test]
    fn test_gindex_five_concatenation_order() {
        let zero = [0u8; 32];
        let (s0, s1) = (leaf(1), leaf(2));
        let level1 = sha256_pair(&s0, &zero);
        let expected = sha256_pair(&level1, &s1);
        assert_eq!(restore_merkle_root(&zero, &[s0, s1], 5), expected);
    }

    #[test]
    fn test_proof_matches_tree_root() {
        let leaves: Vec<Bytes32> = (0..8).map(leaf).collect();
        let root = hash_tree_root(&leaves).unwrap();
        for index in 0..leaves.len() {
            let (proof, gindex) = merkle_proof(&leaves, index).unwrap();
            assert_eq!(proof.len(), 3);
            assert_eq!(gindex_depth(gindex), Some(3));
            assert_eq!(restore_merkle_root(&leaves[index], &proof, gindex), root);
        }
    }

    #[test]
    fn test_hash_tree_root_rejects_non_power_of_two() {
        for n in [0, 3, 5, 6] {
            let leaves: Vec<Bytes32> = (0..n as u8).map(leaf).collect();
            assert!(matches!(
                hash_tree_root(&leaves),
                Err(ProverError::LeafCountNotPowerOfTwo(got)) if got == n
            ));
        }
    }
}
