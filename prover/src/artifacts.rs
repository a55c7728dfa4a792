//! Artifact files: constraint system, keys, verifier contract and proofs.
//!
//! Every I/O failure names the artifact it was working on. Nothing is retried.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ark_bn254::Bn254;
use ark_groth16::VerifyingKey;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ssz_config::ArtifactsConfig;

use crate::errors::{ProverError, Result};
use crate::proof::Groth16Proof;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    ConstraintSystem,
    ProvingKey,
    VerifyingKey,
    Contract,
    Proof,
    Witness,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConstraintSystem => "constraint system",
            Self::ProvingKey => "proving key",
            Self::VerifyingKey => "verifying key",
            Self::Contract => "verifier contract",
            Self::Proof => "proof",
            Self::Witness => "witness",
        };
        f.write_str(name)
    }
}

/// Where each artifact of a build lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub r1cs: PathBuf,
    pub proving_key: PathBuf,
    pub verifying_key: PathBuf,
    pub contract: PathBuf,
    pub proof: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::from_config(&ArtifactsConfig::default(), dir)
    }

    /// Configured file names inside `dir`.
    pub fn from_config(config: &ArtifactsConfig, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            r1cs: dir.join(&config.r1cs),
            proving_key: dir.join(&config.proving_key),
            verifying_key: dir.join(&config.verifying_key),
            contract: dir.join(&config.contract),
            proof: dir.join(&config.proof),
        }
    }
}

fn io_error(
    artifact: Artifact,
    action: &'static str,
    path: &Path,
    source: std::io::Error,
) -> ProverError {
    ProverError::ArtifactIo {
        artifact,
        action,
        path: path.to_path_buf(),
        source,
    }
}

pub fn read(artifact: Artifact, path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| io_error(artifact, "read", path, e))
}

pub fn read_to_string(artifact: Artifact, path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error(artifact, "read", path, e))
}

/// Writes `bytes` next to `path` and renames it into place.
pub fn write(artifact: Artifact, path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = staging_path(path);
    stage(artifact, path, &tmp, bytes)?;
    commit(artifact, &tmp, path)
}

/// Writes several artifacts so that a failure leaves no partial file behind.
///
/// Every file is staged first. Only when all of them are on disk are they
/// renamed into place.
pub fn write_all(files: &[(Artifact, &Path, &[u8])]) -> Result<()> {
    let mut staged = Vec::with_capacity(files.len());
    for &(artifact, path, bytes) in files {
        let tmp = staging_path(path);
        if let Err(e) = stage(artifact, path, &tmp, bytes) {
            for (_, tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            return Err(e);
        }
        staged.push((artifact, tmp, path));
    }

    for (artifact, tmp, path) in staged {
        commit(artifact, &tmp, path)?;
        tracing::debug!(%artifact, path = %path.display(), "artifact written");
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn stage(artifact: Artifact, path: &Path, tmp: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| io_error(artifact, "create directory for", path, e))?;
    }
    fs::write(tmp, bytes).map_err(|e| io_error(artifact, "write", tmp, e))
}

fn commit(artifact: Artifact, tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path).map_err(|e| io_error(artifact, "move into place", path, e))
}

/// Compressed canonical encoding.
pub fn encode<T: CanonicalSerialize>(artifact: Artifact, value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value
        .serialize_compressed(&mut bytes)
        .map_err(|e| ProverError::ArtifactEncode {
            artifact,
            message: e.to_string(),
        })?;
    Ok(bytes)
}

pub fn decode<T: CanonicalDeserialize>(artifact: Artifact, bytes: &[u8]) -> Result<T> {
    T::deserialize_compressed(bytes)
        .map_err(|source| ProverError::ArtifactDecode { artifact, source })
}

pub fn load<T: CanonicalDeserialize>(artifact: Artifact, path: &Path) -> Result<T> {
    let bytes = read(artifact, path)?;
    decode(artifact, &bytes)
}

/// Loads only the verifying key, for callers that never prove.
pub fn load_verifying_key(path: &Path) -> Result<VerifyingKey<Bn254>> {
    let vk = load(Artifact::VerifyingKey, path)?;
    tracing::debug!(path = %path.display(), "verifying key loaded");
    Ok(vk)
}

pub fn save_proof(path: &Path, proof: &Groth16Proof) -> Result<()> {
    write(Artifact::Proof, path, proof.to_json()?.as_bytes())
}

pub fn load_proof(path: &Path) -> Result<Groth16Proof> {
    Groth16Proof::from_json(&read_to_string(Artifact::Proof, path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_display_names() {
        assert_eq!(Artifact::ConstraintSystem.to_string(), "constraint system");
        assert_eq!(Artifact::VerifyingKey.to_string(), "verifying key");
        assert_eq!(Artifact::Contract.to_string(), "verifier contract");
    }

    #[test]
    fn test_default_paths() {
        let paths = ArtifactPaths::in_dir("build");
        assert_eq!(paths.r1cs, PathBuf::from("build/r1cs.bin"));
        assert_eq!(paths.contract, PathBuf::from("build/FunctionVerifier.json"));
        assert_eq!(paths.proof, PathBuf::from("build/proof.json"));
    }

    #[test]
    fn test_paths_from_config() {
        let config = ArtifactsConfig {
            proving_key: "pk.bin".into(),
            ..ArtifactsConfig::default()
        };
        let paths = ArtifactPaths::from_config(&config, "out");
        assert_eq!(paths.proving_key, PathBuf::from("out/pk.bin"));
        assert_eq!(paths.r1cs, PathBuf::from("out").join(&config.r1cs));
    }

    #[test]
    fn test_missing_file_names_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");
        let err = read(Artifact::ProvingKey, &path).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Artifact);
        assert!(err.to_string().starts_with("Failed to read proving key at "));
    }

    #[test]
    fn test_write_all_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("nested/a.bin");
        let b = dir.path().join("nested/b.json");

        write_all(&[
            (Artifact::ConstraintSystem, a.as_path(), b"r1cs".as_slice()),
            (Artifact::Contract, b.as_path(), b"{}".as_slice()),
        ])
        .unwrap();

        assert_eq!(fs::read(&a).unwrap(), b"r1cs");
        assert_eq!(fs::read(&b).unwrap(), b"{}");
        assert!(!staging_path(&a).exists());
    }

    #[test]
    fn test_write_all_leaves_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.bin");
        // a regular file cannot act as a parent directory
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let bad = blocker.join("bad.bin");

        let err = write_all(&[
            (Artifact::ProvingKey, good.as_path(), b"pk".as_slice()),
            (Artifact::VerifyingKey, bad.as_path(), b"vk".as_slice()),
        ])
        .unwrap_err();

        assert!(err.to_string().contains("verifying key"));
        assert!(!good.exists());
        assert!(!staging_path(&good).exists());
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = encode(Artifact::Proof, &vec![1u64, 2, 3]).unwrap();
        let err = decode::<Vec<u64>>(Artifact::ConstraintSystem, &bytes[..5]).unwrap_err();
        assert!(matches!(
            err,
            ProverError::ArtifactDecode {
                artifact: Artifact::ConstraintSystem,
                ..
            }
        ));
    }
}
