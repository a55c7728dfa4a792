//! Byte-level plumbing between host values and circuit variables.

use ark_bn254::Fr;
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    eq::EqGadget,
    prelude::*,
    select::CondSelectGadget,
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::constants::DIGEST_LEN;
use crate::errors::{ProverError, Result};

/// A 32-byte digest inside the circuit. Every byte is range-constrained by
/// its `UInt8` bit decomposition.
pub type Bytes32Var = [UInt8<Fr>; DIGEST_LEN];

/// Allocates `len` bytes; `values` may be `None` during key generation.
pub fn alloc_bytes(
    cs: ConstraintSystemRef<Fr>,
    values: Option<&[u8]>,
    len: usize,
    mode: AllocationMode,
) -> Result<Vec<UInt8<Fr>>> {
    if let Some(values) = values {
        if values.len() != len {
            return Err(ProverError::InvalidLength {
                what: "byte allocation",
                expected: len,
                got: values.len(),
            });
        }
    }

    (0..len)
        .map(|i| {
            let value = values.map(|v| v[i]);
            UInt8::new_variable(
                cs.clone(),
                || value.ok_or(SynthesisError::AssignmentMissing),
                mode,
            )
            .map_err(ProverError::from)
        })
        .collect()
}

pub fn alloc_bytes32(
    cs: ConstraintSystemRef<Fr>,
    value: Option<&[u8; DIGEST_LEN]>,
    mode: AllocationMode,
) -> Result<Bytes32Var> {
    let bytes = alloc_bytes(cs, value.map(|v| v.as_slice()), DIGEST_LEN, mode)?;
    to_bytes32(bytes)
}

pub fn to_bytes32(bytes: Vec<UInt8<Fr>>) -> Result<Bytes32Var> {
    bytes.try_into().map_err(|v: Vec<UInt8<Fr>>| ProverError::InvalidLength {
        what: "digest",
        expected: DIGEST_LEN,
        got: v.len(),
    })
}

/// `bit ? when_true : when_false`, byte by byte.
pub fn select_bytes32(
    bit: &Boolean<Fr>,
    when_true: &Bytes32Var,
    when_false: &Bytes32Var,
) -> Result<Bytes32Var> {
    let selected = when_true
        .iter()
        .zip(when_false.iter())
        .map(|(t, f)| UInt8::conditionally_select(bit, t, f))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    to_bytes32(selected)
}

/// Asserts equality per byte.
pub fn enforce_bytes_equal(a: &[UInt8<Fr>], b: &[UInt8<Fr>]) -> Result<()> {
    if a.len() != b.len() {
        return Err(ProverError::InvalidLength {
            what: "byte comparison",
            expected: a.len(),
            got: b.len(),
        });
    }
    for (x, y) in a.iter().zip(b.iter()) {
        x.enforce_equal(y)?;
    }
    Ok(())
}

/// Reads back the assigned values of a byte slice.
pub fn bytes_value(bytes: &[UInt8<Fr>]) -> std::result::Result<Vec<u8>, SynthesisError> {
    bytes.iter().map(|b| b.value()).collect()
}

/// Packs big-endian bytes (at most 8) into a `UInt64`.
pub fn uint64_from_be_bytes(bytes: &[UInt8<Fr>]) -> Result<UInt64<Fr>> {
    if bytes.len() > 8 {
        return Err(ProverError::InvalidLength {
            what: "u64",
            expected: 8,
            got: bytes.len(),
        });
    }
    let mut bits = Vec::with_capacity(64);
    for byte in bytes.iter().rev() {
        bits.extend(byte.to_bits_le()?);
    }
    bits.resize(64, Boolean::FALSE);
    Ok(UInt64::from_bits_le(&bits))
}

/// A fixed-width byte buffer that a circuit exposes as its input or output.
///
/// Holds the host-side assignment (if any) and, once the circuit has been
/// defined against a constraint system, the variables carrying it.
#[derive(Clone, Debug)]
pub struct ByteWires {
    len: usize,
    values: Option<Vec<u8>>,
    vars: Vec<UInt8<Fr>>,
}

impl ByteWires {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            values: None,
            vars: Vec::new(),
        }
    }

    /// Sets the host-side values.
    pub fn assign(&mut self, values: &[u8]) -> Result<()> {
        if values.len() != self.len {
            return Err(ProverError::InvalidLength {
                what: "byte wires",
                expected: self.len,
                got: values.len(),
            });
        }
        self.values = Some(values.to_vec());
        Ok(())
    }

    pub fn values(&self) -> Option<&[u8]> {
        self.values.as_deref()
    }

    /// Allocates the wires as witnesses and keeps the variables.
    pub fn alloc(&mut self, cs: ConstraintSystemRef<Fr>) -> Result<&[UInt8<Fr>]> {
        self.vars = alloc_bytes(
            cs,
            self.values.as_deref(),
            self.len,
            AllocationMode::Witness,
        )?;
        Ok(&self.vars)
    }

    /// Binds already-constrained variables (typically computed outputs).
    pub fn bind(&mut self, vars: Vec<UInt8<Fr>>) -> Result<()> {
        if vars.len() != self.len {
            return Err(ProverError::InvalidLength {
                what: "byte wires",
                expected: self.len,
                got: vars.len(),
            });
        }
        self.vars = vars;
        Ok(())
    }

    pub fn vars(&self) -> &[UInt8<Fr>] {
        &self.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_uint64_from_be_bytes() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let value = 0x0102_0304_0506_0708u64;
        let bytes = alloc_bytes(
            cs.clone(),
            Some(&value.to_be_bytes()),
            8,
            AllocationMode::Witness,
        )
        .unwrap();
        let packed = uint64_from_be_bytes(&bytes).unwrap();
        assert_eq!(packed.value().unwrap(), value);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_select_bytes32() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = alloc_bytes32(cs.clone(), Some(&[1u8; 32]), AllocationMode::Witness).unwrap();
        let b = alloc_bytes32(cs.clone(), Some(&[2u8; 32]), AllocationMode::Witness).unwrap();

        let yes = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let no = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();

        assert_eq!(bytes_value(&select_bytes32(&yes, &a, &b).unwrap()).unwrap(), vec![1u8; 32]);
        assert_eq!(bytes_value(&select_bytes32(&no, &a, &b).unwrap()).unwrap(), vec![2u8; 32]);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_enforce_bytes_equal_detects_difference() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut other = [7u8; 32];
        other[31] = 8;
        let a = alloc_bytes32(cs.clone(), Some(&[7u8; 32]), AllocationMode::Witness).unwrap();
        let b = alloc_bytes32(cs.clone(), Some(&other), AllocationMode::Witness).unwrap();
        enforce_bytes_equal(&a, &b).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_byte_wires_length_checked() {
        let mut wires = ByteWires::new(4);
        assert!(wires.assign(&[1, 2, 3]).is_err());
        wires.assign(&[1, 2, 3, 4]).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars = wires.alloc(cs).unwrap();
        assert_eq!(bytes_value(vars).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_alloc_without_values_in_setup_mode() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        let mut wires = ByteWires::new(3);
        assert_eq!(wires.alloc(cs).unwrap().len(), 3);
    }
}
