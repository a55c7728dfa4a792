use ark_bn254::Fr;
use ark_crypto_primitives::crh::sha256::constraints::Sha256Gadget;
use ark_ff::Field;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};

use super::bytes::{Bytes32Var, to_bytes32};
use crate::constants::DIGEST_LEN;
use crate::errors::Result;

/// SHA-256 of a byte sequence INSIDE the circuit
pub fn sha256(data: &[UInt8<Fr>]) -> Result<Bytes32Var> {
    let digest = Sha256Gadget::digest(data)?;
    to_bytes32(digest.0)
}

/// SHA-256 of `left || right` INSIDE the circuit
pub fn sha256_pair(left: &Bytes32Var, right: &Bytes32Var) -> Result<Bytes32Var> {
    let mut data = Vec::with_capacity(2 * DIGEST_LEN);
    data.extend_from_slice(left);
    data.extend_from_slice(right);
    sha256(&data)
}

/// Packs the low `nbits` bits of a big-endian digest into one field element.
///
/// Must agree with `native::hash_and_truncate` followed by
/// `native::commitment_to_field`.
pub fn truncate_to_field(digest: &Bytes32Var, nbits: usize) -> Result<FpVar<Fr>> {
    let mut bits = Vec::with_capacity(DIGEST_LEN * 8);
    for byte in digest.iter().rev() {
        bits.extend(byte.to_bits_le()?);
    }
    bits.truncate(nbits);

    let mut acc = FpVar::<Fr>::zero();
    let mut coeff = Fr::ONE;
    for bit in bits {
        acc += FpVar::from(bit) * coeff;
        coeff += coeff;
    }
    Ok(acc)
}

/// `sha256(data) & ((1 << nbits) - 1)` as a field element
pub fn hash_and_truncate(data: &[UInt8<Fr>], nbits: usize) -> Result<FpVar<Fr>> {
    let digest = sha256(data)?;
    truncate_to_field(&digest, nbits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::bytes::{alloc_bytes, bytes_value};
    use crate::constants::TRUNCATE_BITS;
    use crate::native;
    use ark_r1cs_std::alloc::AllocationMode;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_sha256_matches_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let data = b"hash tree root".to_vec();
        let vars = alloc_bytes(cs.clone(), Some(&data), data.len(), AllocationMode::Witness).unwrap();

        let digest = sha256(&vars).unwrap();
        assert_eq!(bytes_value(&digest).unwrap(), native::sha256(&data).to_vec());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_hash_and_truncate_matches_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let data: Vec<u8> = (0u8..40).collect();
        let vars = alloc_bytes(cs.clone(), Some(&data), data.len(), AllocationMode::Witness).unwrap();

        let truncated = hash_and_truncate(&vars, TRUNCATE_BITS).unwrap();
        let expected =
            native::commitment_to_field(&native::hash_and_truncate(&data, TRUNCATE_BITS));
        assert_eq!(truncated.value().unwrap(), expected);
        assert!(cs.is_satisfied().unwrap());
    }
}
