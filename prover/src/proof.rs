//! Groth16 proof wire format.
//!
//! The raw form is 8 big-endian 32-byte words in the order an EVM pairing
//! precompile expects:
//!
//! ```text
//! offset   0  A.x
//! offset  32  A.y
//! offset  64  B.x.c1
//! offset  96  B.x.c0
//! offset 128  B.y.c1
//! offset 160  B.y.c0
//! offset 192  C.x
//! offset 224  C.y
//! ```
//!
//! Calldata appends the input and output commitments to the raw proof.

use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::Proof;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::artifacts::Artifact;
use crate::constants::{CALLDATA_LEN, DIGEST_LEN, FP_SIZE, PROOF_COORDINATES, RAW_PROOF_LEN};
use crate::errors::{ProverError, Result};
use crate::native::Bytes32;

/// One base-field coordinate, rendered as a 0x-prefixed 32-byte hex word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coordinate(pub BigUint);

impl Coordinate {
    fn from_word(word: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(word))
    }

    /// Left-padded 32-byte big-endian encoding.
    pub fn to_word(&self) -> Result<[u8; FP_SIZE]> {
        let bytes = self.0.to_bytes_be();
        if bytes.len() > FP_SIZE {
            return Err(ProverError::MalformedProof(format!(
                "coordinate is {} bytes wide",
                bytes.len()
            )));
        }
        let mut word = [0u8; FP_SIZE];
        word[FP_SIZE - bytes.len()..].copy_from_slice(&bytes);
        Ok(word)
    }

    fn to_fq(&self) -> Result<Fq> {
        let word = self.to_word()?;
        let fq = Fq::from_be_bytes_mod_order(&word);
        if fq.into_bigint().to_bytes_be() != word {
            return Err(ProverError::MalformedProof(format!(
                "coordinate 0x{} is not below the base field modulus",
                hex::encode(word)
            )));
        }
        Ok(fq)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{:064x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .map(Coordinate)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex coordinate: {s}")))
    }
}

/// `0x`-prefixed hex for 32-byte words.
pub(crate) mod hex_word {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::native::Bytes32;

    pub fn parse(s: &str) -> Result<Bytes32, hex::FromHexError> {
        let mut word = [0u8; 32];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut word)?;
        Ok(word)
    }

    pub fn format(word: &Bytes32) -> String {
        format!("0x{}", hex::encode(word))
    }

    pub fn serialize<S: Serializer>(word: &Bytes32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(word))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes32, D::Error> {
        let s = String::deserialize(d)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub mod vec {
        use serde::{Deserialize, Deserializer, Serializer};

        use crate::native::Bytes32;

        pub fn serialize<S: Serializer>(words: &[Bytes32], s: S) -> Result<S::Ok, S::Error> {
            s.collect_seq(words.iter().map(super::format))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Bytes32>, D::Error> {
            Vec::<String>::deserialize(d)?
                .iter()
                .map(|s| super::parse(s).map_err(serde::de::Error::custom))
                .collect()
        }
    }
}

/// A proof together with the commitments it was produced for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Groth16Proof {
    /// `[A.x, A.y]`
    pub a: [Coordinate; 2],
    /// `[[B.x.c1, B.x.c0], [B.y.c1, B.y.c0]]`
    pub b: [[Coordinate; 2]; 2],
    /// `[C.x, C.y]`
    pub c: [Coordinate; 2],
    #[serde(with = "hex_word")]
    pub input_hash: Bytes32,
    #[serde(with = "hex_word")]
    pub output_hash: Bytes32,
}

impl Groth16Proof {
    pub fn from_ark(proof: &Proof<Bn254>, input_hash: Bytes32, output_hash: Bytes32) -> Self {
        let raw = raw_proof_bytes(proof);
        Self::from_raw_words(&raw, input_hash, output_hash)
    }

    /// Slices a raw proof buffer at its fixed offsets.
    pub fn from_raw(raw: &[u8], input_hash: Bytes32, output_hash: Bytes32) -> Result<Self> {
        if raw.len() != RAW_PROOF_LEN {
            return Err(ProverError::InvalidLength {
                what: "raw proof",
                expected: RAW_PROOF_LEN,
                got: raw.len(),
            });
        }
        Ok(Self::from_raw_words(raw, input_hash, output_hash))
    }

    fn from_raw_words(raw: &[u8], input_hash: Bytes32, output_hash: Bytes32) -> Self {
        let word = |i: usize| Coordinate::from_word(&raw[FP_SIZE * i..FP_SIZE * (i + 1)]);
        Self {
            a: [word(0), word(1)],
            b: [[word(2), word(3)], [word(4), word(5)]],
            c: [word(6), word(7)],
            input_hash,
            output_hash,
        }
    }

    fn coordinates(&self) -> [&Coordinate; PROOF_COORDINATES] {
        [
            &self.a[0],
            &self.a[1],
            &self.b[0][0],
            &self.b[0][1],
            &self.b[1][0],
            &self.b[1][1],
            &self.c[0],
            &self.c[1],
        ]
    }

    /// The 256-byte raw proof.
    pub fn to_raw(&self) -> Result<Vec<u8>> {
        let mut raw = Vec::with_capacity(RAW_PROOF_LEN);
        for coordinate in self.coordinates() {
            raw.extend_from_slice(&coordinate.to_word()?);
        }
        Ok(raw)
    }

    /// Raw proof followed by the input and output commitments.
    pub fn to_calldata(&self) -> Result<Vec<u8>> {
        let mut calldata = self.to_raw()?;
        calldata.extend_from_slice(&self.input_hash);
        calldata.extend_from_slice(&self.output_hash);
        Ok(calldata)
    }

    pub fn from_calldata(calldata: &[u8]) -> Result<Self> {
        if calldata.len() != CALLDATA_LEN {
            return Err(ProverError::InvalidLength {
                what: "calldata",
                expected: CALLDATA_LEN,
                got: calldata.len(),
            });
        }
        let (raw, hashes) = calldata.split_at(RAW_PROOF_LEN);
        let mut input_hash = [0u8; DIGEST_LEN];
        let mut output_hash = [0u8; DIGEST_LEN];
        input_hash.copy_from_slice(&hashes[..DIGEST_LEN]);
        output_hash.copy_from_slice(&hashes[DIGEST_LEN..]);
        Self::from_raw(raw, input_hash, output_hash)
    }

    /// Rebuilds the backend proof, rejecting non-canonical coordinates and
    /// points outside the prime-order subgroups.
    pub fn to_ark(&self) -> Result<Proof<Bn254>> {
        let a = g1_point("A", &self.a)?;
        let b = g2_point(&self.b)?;
        let c = g1_point("C", &self.c)?;
        Ok(Proof { a, b, c })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| ProverError::Json {
            artifact: Artifact::Proof,
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ProverError::Json {
            artifact: Artifact::Proof,
            source,
        })
    }
}

/// Serializes a backend proof into the fixed 8-word layout.
pub fn raw_proof_bytes(proof: &Proof<Bn254>) -> [u8; RAW_PROOF_LEN] {
    let mut raw = [0u8; RAW_PROOF_LEN];
    let words = g1_coordinates(&proof.a)
        .into_iter()
        .chain(g2_coordinates(&proof.b))
        .chain(g1_coordinates(&proof.c));
    for (i, word) in words.enumerate() {
        raw[FP_SIZE * i..FP_SIZE * (i + 1)].copy_from_slice(&fq_word(&word));
    }
    raw
}

fn fq_word(fq: &Fq) -> [u8; FP_SIZE] {
    let mut word = [0u8; FP_SIZE];
    let bytes = fq.into_bigint().to_bytes_be();
    word[FP_SIZE - bytes.len()..].copy_from_slice(&bytes);
    word
}

/// `[x, y]`, the identity encodes as zeros
fn g1_coordinates(p: &G1Affine) -> [Fq; 2] {
    if p.infinity {
        [Fq::from(0u64); 2]
    } else {
        [p.x, p.y]
    }
}

/// `[x.c1, x.c0, y.c1, y.c0]`
fn g2_coordinates(p: &G2Affine) -> [Fq; 4] {
    if p.infinity {
        [Fq::from(0u64); 4]
    } else {
        [p.x.c1, p.x.c0, p.y.c1, p.y.c0]
    }
}

fn g1_point(name: &str, coords: &[Coordinate; 2]) -> Result<G1Affine> {
    let x = coords[0].to_fq()?;
    let y = coords[1].to_fq()?;
    if x == Fq::from(0u64) && y == Fq::from(0u64) {
        return Ok(G1Affine::zero());
    }
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProverError::MalformedProof(format!(
            "{name} is not a point of G1"
        )));
    }
    Ok(point)
}

fn g2_point(coords: &[[Coordinate; 2]; 2]) -> Result<G2Affine> {
    let x = Fq2::new(coords[0][1].to_fq()?, coords[0][0].to_fq()?);
    let y = Fq2::new(coords[1][1].to_fq()?, coords[1][0].to_fq()?);
    if x == Fq2::from(0u64) && y == Fq2::from(0u64) {
        return Ok(G2Affine::zero());
    }
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProverError::MalformedProof("B is not a point of G2".into()));
    }
    Ok(point)
}
