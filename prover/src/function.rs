//! Circuit functions: arbitrary computation bound to hash commitments.
//!
//! A [`CircuitFunction`] exposes exactly two public inputs, in this order:
//!
//! 1. `input_hash`  - SHA-256 of the input bytes, truncated to 253 bits
//! 2. `output_hash` - SHA-256 of the output bytes, truncated to 253 bits
//!
//! Everything else the embedded [`Circuit`] allocates is private witness.

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError, SynthesisMode,
};
use ark_std::rand::{CryptoRng, RngCore};

use crate::circuit::bytes::bytes_value;
use crate::circuit::hash::hash_and_truncate;
use crate::constants::TRUNCATE_BITS;
use crate::errors::{ProverError, Result};
use crate::native::{self, Bytes32};
use crate::pipeline::CircuitBuild;
use crate::proof::Groth16Proof;
use crate::r1cs::R1cs;

/// A computation that can be embedded in a [`CircuitFunction`].
pub trait Circuit {
    /// Stores the host-side input bytes and derives any private witness from them.
    fn set_witness(&mut self, input_bytes: &[u8]) -> Result<()>;

    /// Allocates the input bytes, constrains the computation and binds the
    /// output bytes. Must not allocate public inputs.
    fn define(&mut self, cs: ConstraintSystemRef<Fr>) -> Result<()>;

    /// Input byte variables, valid after [`Circuit::define`].
    fn input_bytes(&self) -> &[UInt8<Fr>];

    /// Output byte variables, valid after [`Circuit::define`].
    fn output_bytes(&self) -> &[UInt8<Fr>];
}

#[derive(Clone, Debug)]
pub struct CircuitFunction<C> {
    /// Truncated hash of the input bytes (public)
    pub input_hash: Option<Bytes32>,
    /// Truncated hash of the output bytes (public)
    pub output_hash: Option<Bytes32>,
    circuit: C,
}

impl<C: Circuit + Clone> CircuitFunction<C> {
    pub fn new(circuit: C) -> Self {
        Self {
            input_hash: None,
            output_hash: None,
            circuit,
        }
    }

    /// Assigns the input, runs the embedded computation on the host and
    /// records both commitments.
    pub fn set_witness(&mut self, input_bytes: &[u8]) -> Result<()> {
        self.circuit.set_witness(input_bytes)?;
        let output = self.compute_output()?;

        let input_hash = native::hash_and_truncate(input_bytes, TRUNCATE_BITS);
        let output_hash = native::hash_and_truncate(&output, TRUNCATE_BITS);
        tracing::debug!(
            input_len = input_bytes.len(),
            output_len = output.len(),
            input_hash = %hex::encode(input_hash),
            output_hash = %hex::encode(output_hash),
            "witness assigned"
        );

        self.input_hash = Some(input_hash);
        self.output_hash = Some(output_hash);
        Ok(())
    }

    /// Output bytes for the currently assigned input.
    ///
    /// Synthesizes a copy of the embedded circuit against a scratch
    /// constraint system and reads back the computed output wires.
    pub fn compute_output(&self) -> Result<Vec<u8>> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(SynthesisMode::Prove {
            construct_matrices: false,
        });

        let mut circuit = self.circuit.clone();
        circuit.define(cs)?;
        bytes_value(circuit.output_bytes()).map_err(|e| match e {
            SynthesisError::AssignmentMissing => ProverError::WitnessMissing("output bytes"),
            other => ProverError::Synthesis(other),
        })
    }

    /// Allocates the two commitments, defines the embedded circuit and
    /// constrains both commitments against the in-circuit hashes.
    pub fn define(&mut self, cs: ConstraintSystemRef<Fr>) -> Result<()> {
        let input_hash = FpVar::new_input(cs.clone(), || {
            self.input_hash
                .as_ref()
                .map(native::commitment_to_field)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let output_hash = FpVar::new_input(cs.clone(), || {
            self.output_hash
                .as_ref()
                .map(native::commitment_to_field)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;

        self.circuit.define(cs)?;

        hash_and_truncate(self.circuit.input_bytes(), TRUNCATE_BITS)?
            .enforce_equal(&input_hash)?;
        hash_and_truncate(self.circuit.output_bytes(), TRUNCATE_BITS)?
            .enforce_equal(&output_hash)?;
        Ok(())
    }

    /// Compiles to a constraint system without running key generation.
    pub fn compile(&self) -> Result<R1cs> {
        R1cs::compile(self)
    }

    /// Compiles and runs the one-time key generation.
    ///
    /// Uses the configured setup seed when there is one, fresh entropy otherwise.
    pub fn build(&self) -> Result<CircuitBuild> {
        let seed = ssz_config::SszConfig::try_global().and_then(|c| c.prover.setup_seed);
        CircuitBuild::build(self, seed)
    }

    /// Like [`CircuitFunction::build`] with caller-supplied randomness.
    pub fn build_with_rng<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<CircuitBuild> {
        CircuitBuild::build_with_rng(self, rng)
    }

    /// Assigns `input_bytes` and proves the resulting statement.
    pub fn prove(&mut self, input_bytes: &[u8], build: &CircuitBuild) -> Result<Groth16Proof> {
        self.set_witness(input_bytes)?;
        build.prove(self)
    }
}

impl<C: Circuit + Clone> ConstraintSynthesizer<Fr> for CircuitFunction<C> {
    fn generate_constraints(
        mut self,
        cs: ConstraintSystemRef<Fr>,
    ) -> std::result::Result<(), SynthesisError> {
        self.define(cs).map_err(ProverError::into_synthesis)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::circuit::bytes::ByteWires;

    /// XORs every input byte with a fixed mask.
    #[derive(Clone, Debug)]
    pub(crate) struct MaskCircuit {
        input: ByteWires,
        output: ByteWires,
        mask: u8,
    }

    impl MaskCircuit {
        pub(crate) fn new(len: usize, mask: u8) -> Self {
            Self {
                input: ByteWires::new(len),
                output: ByteWires::new(len),
                mask,
            }
        }
    }

    impl Circuit for MaskCircuit {
        fn set_witness(&mut self, input_bytes: &[u8]) -> Result<()> {
            self.input.assign(input_bytes)
        }

        fn define(&mut self, cs: ConstraintSystemRef<Fr>) -> Result<()> {
            let mask = UInt8::constant(self.mask);
            let masked = self
                .input
                .alloc(cs)?
                .iter()
                .map(|byte| byte ^ &mask)
                .collect();
            self.output.bind(masked)
        }

        fn input_bytes(&self) -> &[UInt8<Fr>] {
            self.input.vars()
        }

        fn output_bytes(&self) -> &[UInt8<Fr>] {
            self.output.vars()
        }
    }

    #[test]
    fn test_set_witness_commitments() {
        let mut function = CircuitFunction::new(MaskCircuit::new(4, 0x0f));
        function.set_witness(&[0x10, 0x20, 0x30, 0x40]).unwrap();

        assert_eq!(function.compute_output().unwrap(), vec![0x1f, 0x2f, 0x3f, 0x4f]);
        assert_eq!(
            function.input_hash,
            Some(native::hash_and_truncate(&[0x10, 0x20, 0x30, 0x40], TRUNCATE_BITS))
        );
        assert_eq!(
            function.output_hash,
            Some(native::hash_and_truncate(&[0x1f, 0x2f, 0x3f, 0x4f], TRUNCATE_BITS))
        );
        assert!(function.input_hash.unwrap()[0] < 0x20);
    }

    #[test]
    fn test_define_is_satisfied() {
        let mut function = CircuitFunction::new(MaskCircuit::new(3, 0xaa));
        function.set_witness(b"ssz").unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        function.clone().generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
        // one for the constant wire, two commitments
        assert_eq!(cs.num_instance_variables(), 3);
    }

    #[test]
    fn test_mismatched_commitment_is_unsatisfied() {
        let mut function = CircuitFunction::new(MaskCircuit::new(3, 0xaa));
        function.set_witness(b"ssz").unwrap();
        function.output_hash = Some(native::hash_and_truncate(b"other", TRUNCATE_BITS));

        let cs = ConstraintSystem::<Fr>::new_ref();
        function.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_mismatched_input_commitment_is_unsatisfied() {
        let mut function = CircuitFunction::new(MaskCircuit::new(3, 0xaa));
        function.set_witness(b"ssz").unwrap();
        function.input_hash = Some(native::hash_and_truncate(b"zss", TRUNCATE_BITS));

        let cs = ConstraintSystem::<Fr>::new_ref();
        function.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_wrong_input_length() {
        let mut function = CircuitFunction::new(MaskCircuit::new(3, 0));
        let err = function.set_witness(&[1, 2]).unwrap_err();
        assert!(matches!(err, ProverError::InvalidLength { expected: 3, got: 2, .. }));
        assert!(function.input_hash.is_none());
    }

    #[test]
    fn test_output_requires_witness() {
        let function = CircuitFunction::new(MaskCircuit::new(2, 0));
        assert!(function.compute_output().is_err());
    }
}
