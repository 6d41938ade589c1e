use serde::{Deserialize, Serialize};

use crate::address::HashAlgorithm;
use crate::error::CodecError;

/// Largest single block written before a document is split (1 MB).
pub const DEFAULT_BLOCK_SIZE_LIMIT: usize = 1_000_000;

/// Largest encoded document accepted at all (10 MB).
pub const DEFAULT_HARD_SIZE_LIMIT: usize = 10_000_000;

/// Size limits and hashing for a [`Codec`](crate::Codec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CodecConfig {
    pub block_size_limit: usize,
    pub hard_size_limit: usize,
    pub hash: HashAlgorithm,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            block_size_limit: DEFAULT_BLOCK_SIZE_LIMIT,
            hard_size_limit: DEFAULT_HARD_SIZE_LIMIT,
            hash: HashAlgorithm::default(),
        }
    }
}

impl CodecConfig {
    pub fn with_block_size_limit(mut self, limit: usize) -> Self {
        self.block_size_limit = limit;
        self
    }

    pub fn with_hard_size_limit(mut self, limit: usize) -> Self {
        self.hard_size_limit = limit;
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.block_size_limit == 0 {
            return Err(CodecError::Config("block size limit must be positive".into()));
        }
        if self.block_size_limit > self.hard_size_limit {
            return Err(CodecError::Config(format!(
                "block size limit {} exceeds hard size limit {}",
                self.block_size_limit, self.hard_size_limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.block_size_limit, 1_000_000);
        assert_eq!(config.hard_size_limit, 10_000_000);
        assert_eq!(config.hash, HashAlgorithm::Sha2_256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_limits() {
        let zero = CodecConfig::default().with_block_size_limit(0);
        assert!(matches!(zero.validate(), Err(CodecError::Config(_))));

        let inverted = CodecConfig::default()
            .with_block_size_limit(100)
            .with_hard_size_limit(10);
        assert!(matches!(inverted.validate(), Err(CodecError::Config(_))));
    }

    #[test]
    fn partial_config_from_json() {
        let config: CodecConfig =
            serde_json::from_str(r#"{"block-size-limit": 4096, "hash": "blake3-256"}"#).unwrap();
        assert_eq!(config.block_size_limit, 4096);
        assert_eq!(config.hard_size_limit, DEFAULT_HARD_SIZE_LIMIT);
        assert_eq!(config.hash, HashAlgorithm::Blake3_256);
    }

    #[test]
    fn config_serializes_with_kebab_keys() {
        let json = serde_json::to_value(CodecConfig::default()).unwrap();
        assert_eq!(json["hard-size-limit"], 10_000_000);
        assert_eq!(json["hash"], "sha2-256");
    }
}
