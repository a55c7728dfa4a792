/// Length in bytes of a SHA-256 digest / SSZ chunk.
pub const DIGEST_LEN: usize = 32;

/// Commitments are SHA-256 digests truncated to this many bits so they fit
/// injectively below the BN254 scalar field modulus.
pub const TRUNCATE_BITS: usize = 253;

/// Width of one proof coordinate in the raw proof serialization.
pub const FP_SIZE: usize = 4 * 8;

/// Number of coordinates in a Groth16 proof: A (2) + B (4) + C (2).
pub const PROOF_COORDINATES: usize = 8;

/// Length of the raw proof serialization.
pub const RAW_PROOF_LEN: usize = FP_SIZE * PROOF_COORDINATES;

/// Length of the calldata encoding: coordinates followed by both commitments.
pub const CALLDATA_LEN: usize = RAW_PROOF_LEN + 2 * DIGEST_LEN;

/// Bytes used to encode a generalized index in circuit inputs (big-endian u64).
pub const GINDEX_LEN: usize = 8;
