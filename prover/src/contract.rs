//! Verifier contract description derived from a verifying key.
//!
//! Points are laid out for the EVM pairing precompiles: G1 as `[x, y]`, G2 as
//! `[[x.c1, x.c0], [y.c1, y.c0]]`, each coordinate a big-endian hex word.

use ark_bn254::{Bn254, Fq, G1Affine, G2Affine};
use ark_ff::PrimeField;
use ark_groth16::VerifyingKey;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::artifacts::{self, Artifact};
use crate::errors::{ProverError, Result};
use crate::proof::Coordinate;

pub const CONTRACT_NAME: &str = "FunctionVerifier";

/// blake3 of the compressed verifying key
pub fn vk_hash(vk: &VerifyingKey<Bn254>) -> Result<[u8; 32]> {
    let bytes = artifacts::encode(Artifact::VerifyingKey, vk)?;
    Ok(*blake3::hash(&bytes).as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierContract {
    pub name: String,
    /// Hex vk hash, identifies the circuit
    pub circuit_id: String,
    pub public_inputs: Vec<String>,
    pub alpha: [Coordinate; 2],
    pub beta: [[Coordinate; 2]; 2],
    pub gamma: [[Coordinate; 2]; 2],
    pub delta: [[Coordinate; 2]; 2],
    /// One point per public input, plus the constant term first
    pub ic: Vec<[Coordinate; 2]>,
}

impl VerifierContract {
    pub fn from_vk(vk: &VerifyingKey<Bn254>) -> Result<Self> {
        if vk.gamma_abc_g1.len() < 3 {
            return Err(ProverError::ShapeMismatch {
                what: "verifying key input points",
                expected: 3,
                got: vk.gamma_abc_g1.len(),
            });
        }

        let mut public_inputs = vec!["inputHash".to_string(), "outputHash".to_string()];
        public_inputs.extend((3..vk.gamma_abc_g1.len()).map(|i| format!("input{}", i - 1)));

        Ok(Self {
            name: CONTRACT_NAME.to_string(),
            circuit_id: hex::encode(vk_hash(vk)?),
            public_inputs,
            alpha: g1_words(&vk.alpha_g1),
            beta: g2_words(&vk.beta_g2),
            gamma: g2_words(&vk.gamma_g2),
            delta: g2_words(&vk.delta_g2),
            ic: vk.gamma_abc_g1.iter().map(g1_words).collect(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| ProverError::Json {
            artifact: Artifact::Contract,
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ProverError::Json {
            artifact: Artifact::Contract,
            source,
        })
    }
}

fn word(fq: &Fq) -> Coordinate {
    Coordinate(BigUint::from(fq.into_bigint()))
}

fn g1_words(p: &G1Affine) -> [Coordinate; 2] {
    if p.infinity {
        return [Coordinate(BigUint::default()), Coordinate(BigUint::default())];
    }
    [word(&p.x), word(&p.y)]
}

fn g2_words(p: &G2Affine) -> [[Coordinate; 2]; 2] {
    [
        [word(&p.x.c1), word(&p.x.c0)],
        [word(&p.y.c1), word(&p.y.c0)],
    ]
}
