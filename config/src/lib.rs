//! SSZ prover configuration
//!
//! Handles loading configuration from:
//! 1. SSZ_CONFIG env var (explicit path)
//! 2. ./ssz-prover.toml (current directory)
//! 3. ~/.ssz-prover/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<SszConfig> = OnceLock::new();

const LOCAL_CONFIG_FILE: &str = "ssz-prover.toml";
const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".ssz-prover";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_BUILD_DIR: &str = "build";
const DEFAULT_R1CS: &str = "r1cs.bin";
const DEFAULT_PROVING_KEY: &str = "pkey.bin";
const DEFAULT_VERIFYING_KEY: &str = "vkey.bin";
const DEFAULT_CONTRACT: &str = "FunctionVerifier.json";
const DEFAULT_PROOF: &str = "proof.json";

const SETUP_SEED_SAMPLE: &str = "
# Fixed key generation seed. Test builds only, anyone knowing it can forge proofs.
# [prover]
# setup_seed = 1234
";

const DEFAULT_DEPTH: usize = 2;
const DEFAULT_LIST_LEAVES: usize = 4;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SszConfig {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub circuit: CircuitConfig,
}

/// Artifact locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactsConfig {
    #[serde(default = "default_build_dir")]
    pub dir: String,
    #[serde(default = "default_r1cs")]
    pub r1cs: String,
    #[serde(default = "default_proving_key")]
    pub proving_key: String,
    #[serde(default = "default_verifying_key")]
    pub verifying_key: String,
    #[serde(default = "default_contract")]
    pub contract: String,
    #[serde(default = "default_proof")]
    pub proof: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_BUILD_DIR.into(),
            r1cs: DEFAULT_R1CS.into(),
            proving_key: DEFAULT_PROVING_KEY.into(),
            verifying_key: DEFAULT_VERIFYING_KEY.into(),
            contract: DEFAULT_CONTRACT.into(),
            proof: DEFAULT_PROOF.into(),
        }
    }
}

fn default_build_dir() -> String {
    DEFAULT_BUILD_DIR.into()
}
fn default_r1cs() -> String {
    DEFAULT_R1CS.into()
}
fn default_proving_key() -> String {
    DEFAULT_PROVING_KEY.into()
}
fn default_verifying_key() -> String {
    DEFAULT_VERIFYING_KEY.into()
}
fn default_contract() -> String {
    DEFAULT_CONTRACT.into()
}
fn default_proof() -> String {
    DEFAULT_PROOF.into()
}

/// Prover settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProverConfig {
    /// Fixed seed for key generation. Only for reproducible test builds.
    #[serde(default)]
    pub setup_seed: Option<u64>,
}

/// Shape of the built-in circuits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Siblings in an inclusion proof
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Leaves reduced by the list root circuit
    #[serde(default = "default_list_leaves")]
    pub list_leaves: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            list_leaves: DEFAULT_LIST_LEAVES,
        }
    }
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}
fn default_list_leaves() -> usize {
    DEFAULT_LIST_LEAVES
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

/// Set Option<T> from env var if present and parseable
fn env_parse_option<T: std::str::FromStr>(key: &str, field: &mut Option<T>) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = Some(parsed),
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl SszConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check SSZ_CONFIG env var
        if let Ok(path) = env::var("SSZ_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("SSZ_CONFIG points to missing file: {}", path.display());
        }

        // 2. Check ./ssz-prover.toml (current directory)
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.ssz-prover/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        env_string("SSZ_BUILD_DIR", &mut self.artifacts.dir);
        env_parse_option("SSZ_SETUP_SEED", &mut self.prover.setup_seed);
        env_parse("SSZ_CIRCUIT_DEPTH", &mut self.circuit.depth);
        env_parse("SSZ_LIST_LEAVES", &mut self.circuit.list_leaves);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file.
    ///
    /// The setup seed stays commented out: a published seed makes the
    /// Groth16 setup randomness public.
    pub fn generate_sample() -> String {
        let mut sample = toml::to_string_pretty(&Self::default()).unwrap_or_default();
        sample.push_str(SETUP_SEED_SAMPLE);
        sample
    }

    /// Try to get the global config instance.
    ///
    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static SszConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: SszConfig) -> Result<(), SszConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SszConfig::default();
        assert_eq!(config.artifacts.dir, DEFAULT_BUILD_DIR);
        assert_eq!(config.artifacts.proving_key, DEFAULT_PROVING_KEY);
        assert_eq!(config.prover.setup_seed, None);
        assert_eq!(config.circuit.depth, DEFAULT_DEPTH);
    }

    #[test]
    fn test_generate_sample() {
        let sample = SszConfig::generate_sample();
        assert!(sample.contains("[artifacts]"));
        assert!(sample.contains("[circuit]"));
        assert!(sample.contains("# setup_seed = "));
        assert!(!sample.contains("\nsetup_seed"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = SszConfig::generate_sample();
        let parsed: SszConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.artifacts.contract, DEFAULT_CONTRACT);
        assert_eq!(parsed.prover.setup_seed, None);
    }

    #[test]
    fn test_partial_file() {
        let parsed: SszConfig = toml::from_str(
            r#"
            [artifacts]
            dir = "out"

            [circuit]
            depth = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.artifacts.dir, "out");
        assert_eq!(parsed.artifacts.r1cs, DEFAULT_R1CS);
        assert_eq!(parsed.circuit.depth, 5);
        assert_eq!(parsed.circuit.list_leaves, DEFAULT_LIST_LEAVES);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = SszConfig::load_from(Path::new("/nonexistent/ssz-prover.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
