//! Build, prove and verify.
//!
//! ```text
//!  CircuitFunction ──compile──▶ R1cs ──setup──▶ CircuitBuild ──prove──▶ Groth16Proof
//!                                                   ▲    │
//!                                          import   │    │ export
//!                                                   │    ▼
//!                                        r1cs.bin  pkey.bin  vkey.bin  FunctionVerifier.json
//! ```
//!
//! A [`CircuitBuild`] is immutable once built or imported and can be shared
//! across threads for concurrent proving and verification.

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{ConstraintSystem, OptimizationGoal};
use ark_snark::SNARK;
use ark_std::UniformRand;
use ark_std::rand::{CryptoRng, RngCore, SeedableRng, rngs::StdRng};
use sha2::{Digest, Sha256};

use crate::artifacts::{self, Artifact, ArtifactPaths};
use crate::constants::{DIGEST_LEN, TRUNCATE_BITS};
use crate::contract::{self, VerifierContract};
use crate::errors::{ProverError, Result};
use crate::function::{Circuit, CircuitFunction};
use crate::native::{self, Bytes32};
use crate::proof::Groth16Proof;
use crate::r1cs::R1cs;

const BLINDING_DOMAIN: &[u8] = b"ssz-prover/groth16-blinding/v1";

/// Compiled constraint system and Groth16 keys for one circuit.
#[derive(Clone)]
pub struct CircuitBuild {
    r1cs: R1cs,
    proving_key: ProvingKey<Bn254>,
}

impl CircuitBuild {
    /// Compiles `function` and runs key generation, seeded when `seed` is given
    /// and from the OS otherwise.
    pub fn build<C: Circuit + Clone>(
        function: &CircuitFunction<C>,
        seed: Option<u64>,
    ) -> Result<Self> {
        match seed {
            Some(seed) => {
                tracing::warn!(seed, "using a fixed setup seed, keys are reproducible");
                Self::build_with_rng(function, &mut StdRng::seed_from_u64(seed))
            }
            None => Self::build_with_rng(function, &mut rand::rngs::OsRng),
        }
    }

    pub fn build_with_rng<C: Circuit + Clone, R: RngCore + CryptoRng>(
        function: &CircuitFunction<C>,
        rng: &mut R,
    ) -> Result<Self> {
        let start = Instant::now();
        let r1cs = function.compile()?;
        tracing::info!(
            constraints = r1cs.num_constraints,
            public_inputs = r1cs.num_public_inputs(),
            "circuit compiled, running setup"
        );

        let (proving_key, _) = Groth16::<Bn254>::circuit_specific_setup(function.clone(), rng)
            .map_err(ProverError::Setup)?;

        let build = Self::from_parts(r1cs, proving_key)?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            circuit_id = %build.id()?,
            "circuit built"
        );
        Ok(build)
    }

    /// Pairs a constraint system with a proving key, checking they agree.
    pub fn from_parts(r1cs: R1cs, proving_key: ProvingKey<Bn254>) -> Result<Self> {
        let points = proving_key.vk.gamma_abc_g1.len();
        if points != r1cs.num_instance_variables {
            return Err(ProverError::ShapeMismatch {
                what: "public inputs in proving key",
                expected: r1cs.num_instance_variables,
                got: points,
            });
        }
        Ok(Self { r1cs, proving_key })
    }

    pub fn r1cs(&self) -> &R1cs {
        &self.r1cs
    }

    pub fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.proving_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.proving_key.vk
    }

    pub fn vk_hash(&self) -> Result<[u8; 32]> {
        contract::vk_hash(self.verifying_key())
    }

    /// Hex vk hash
    pub fn id(&self) -> Result<String> {
        Ok(hex::encode(self.vk_hash()?))
    }

    /// Writes the constraint system, both keys and the verifier contract.
    ///
    /// Everything is encoded before the first file is touched.
    pub fn export(&self, paths: &ArtifactPaths) -> Result<()> {
        let r1cs = artifacts::encode(Artifact::ConstraintSystem, &self.r1cs)?;
        let pk = artifacts::encode(Artifact::ProvingKey, &self.proving_key)?;
        let vk = artifacts::encode(Artifact::VerifyingKey, self.verifying_key())?;
        let contract = VerifierContract::from_vk(self.verifying_key())?.to_json()?;

        artifacts::write_all(&[
            (Artifact::ConstraintSystem, paths.r1cs.as_path(), r1cs.as_slice()),
            (Artifact::ProvingKey, paths.proving_key.as_path(), pk.as_slice()),
            (Artifact::VerifyingKey, paths.verifying_key.as_path(), vk.as_slice()),
            (Artifact::Contract, paths.contract.as_path(), contract.as_bytes()),
        ])?;

        tracing::info!(
            r1cs_bytes = r1cs.len(),
            pk_bytes = pk.len(),
            vk_bytes = vk.len(),
            dir = %paths.r1cs.parent().map(|p| p.display().to_string()).unwrap_or_default(),
            "build exported"
        );
        Ok(())
    }

    /// Reads the constraint system and proving key back.
    pub fn import(paths: &ArtifactPaths) -> Result<Self> {
        let start = Instant::now();
        let r1cs: R1cs = artifacts::load(Artifact::ConstraintSystem, &paths.r1cs)?;
        let proving_key: ProvingKey<Bn254> =
            artifacts::load(Artifact::ProvingKey, &paths.proving_key)?;
        let build = Self::from_parts(r1cs, proving_key)?;

        tracing::info!(
            constraints = build.r1cs.num_constraints,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "build imported"
        );
        Ok(build)
    }

    /// Proves an already assigned function.
    ///
    /// The witness is checked against every constraint first, so a forged
    /// input never reaches the backend. Blinding factors are derived from the
    /// full assignment: the same build and input always yield the same proof.
    pub fn prove<C: Circuit + Clone>(
        &self,
        function: &CircuitFunction<C>,
    ) -> Result<Groth16Proof> {
        let start = Instant::now();
        let input_hash = function
            .input_hash
            .ok_or(ProverError::WitnessMissing("input hash"))?;
        let output_hash = function
            .output_hash
            .ok_or(ProverError::WitnessMissing("output hash"))?;

        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        function.clone().define(cs.clone())?;

        if !cs.is_satisfied()? {
            let which = cs
                .which_is_unsatisfied()?
                .unwrap_or_else(|| "unknown constraint".to_string());
            tracing::warn!(constraint = %which, "witness does not satisfy the circuit");
            return Err(ProverError::Unsatisfied(which));
        }
        cs.finalize();

        let full_assignment = {
            let inner = cs
                .borrow()
                .ok_or(ProverError::WitnessMissing("constraint system"))?;
            self.r1cs.check_shape(
                inner.num_instance_variables,
                inner.num_witness_variables,
                inner.num_constraints,
            )?;
            let mut assignment = inner.instance_assignment.clone();
            assignment.extend_from_slice(&inner.witness_assignment);
            assignment
        };

        let mut rng = blinding_rng(&full_assignment);
        let r = Fr::rand(&mut rng);
        let s = Fr::rand(&mut rng);

        let proof = Groth16::<Bn254>::create_proof_with_reduction_and_matrices(
            &self.proving_key,
            r,
            s,
            &self.r1cs.to_matrices(),
            self.r1cs.num_instance_variables,
            self.r1cs.num_constraints,
            &full_assignment,
        )
        .map_err(ProverError::Proving)?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            input_hash = %hex::encode(input_hash),
            output_hash = %hex::encode(output_hash),
            "proof generated"
        );
        Ok(Groth16Proof::from_ark(&proof, input_hash, output_hash))
    }

    pub fn verify(&self, proof: &Groth16Proof) -> Result<bool> {
        verify(self.verifying_key(), proof)
    }
}

/// Checks a proof against a verifying key and the commitments it carries.
///
/// Returns `Ok(false)` for a well-formed proof that does not verify, and an
/// error when the proof or its commitments cannot even be decoded.
pub fn verify(vk: &VerifyingKey<Bn254>, proof: &Groth16Proof) -> Result<bool> {
    let public_inputs = [
        commitment_input("input hash", &proof.input_hash)?,
        commitment_input("output hash", &proof.output_hash)?,
    ];
    let ark_proof = proof.to_ark()?;

    let valid = Groth16::<Bn254>::verify(vk, &public_inputs, &ark_proof)
        .map_err(ProverError::Verification)?;
    if valid {
        tracing::debug!("proof verified");
    } else {
        tracing::warn!(
            input_hash = %hex::encode(proof.input_hash),
            output_hash = %hex::encode(proof.output_hash),
            "proof rejected"
        );
    }
    Ok(valid)
}

fn commitment_input(what: &str, commitment: &Bytes32) -> Result<Fr> {
    if native::truncate(*commitment, TRUNCATE_BITS) != *commitment {
        return Err(ProverError::InvalidPublicInput(format!(
            "{what} 0x{} does not fit in {TRUNCATE_BITS} bits",
            hex::encode(commitment)
        )));
    }
    Ok(native::commitment_to_field(commitment))
}

fn blinding_rng(assignment: &[Fr]) -> StdRng {
    let mut hasher = Sha256::new();
    hasher.update(BLINDING_DOMAIN);
    for value in assignment {
        hasher.update(value.into_bigint().to_bytes_le());
    }
    let seed: [u8; DIGEST_LEN] = hasher.finalize().into();
    StdRng::from_seed(seed)
}
