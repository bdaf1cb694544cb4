//! Chunker configuration

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChunkError;

/// Which evaluation annotations survive rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvalRetention {
    /// Keep evals on branch points, line ends and commented moves
    #[default]
    RetainAtBranchesAndComments,
    RetainAll,
    RetainNone,
}

impl FromStr for EvalRetention {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "retain-at-branches-and-comments" => Ok(Self::RetainAtBranchesAndComments),
            "retain-all" => Ok(Self::RetainAll),
            "retain-none" => Ok(Self::RetainNone),
            _ => Err(ChunkError::Config("unknown eval retention policy")),
        }
    }
}

/// Where an oversized subtree is cut first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchDescent {
    /// Cut at the nearest branch point below the split start.
    #[default]
    Shallowest,
    /// Peel side variations off the deepest branch points until the rest fits.
    Deepest,
}

impl FromStr for BranchDescent {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shallowest" => Ok(Self::Shallowest),
            "deepest" => Ok(Self::Deepest),
            _ => Err(ChunkError::Config("unknown branch descent")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Token ceiling for a single chunk
    pub max_chunk_tokens: usize,

    /// Chunks below this size are merged with a neighbour when possible
    pub min_chunk_tokens: usize,

    pub eval_retention: EvalRetention,

    pub branch_descent: BranchDescent,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 7800,
            min_chunk_tokens: 2000,
            eval_retention: EvalRetention::default(),
            branch_descent: BranchDescent::default(),
        }
    }
}

impl ChunkerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ChunkError> {
        let defaults = Self::default();

        let max_chunk_tokens = env::var("CHUNK_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_chunk_tokens);

        let min_chunk_tokens = env::var("CHUNK_MIN_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.min_chunk_tokens);

        let eval_retention = match env::var("CHUNK_EVAL_RETENTION") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.eval_retention,
        };

        let branch_descent = match env::var("CHUNK_BRANCH_DESCENT") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.branch_descent,
        };

        let config = Self {
            max_chunk_tokens,
            min_chunk_tokens,
            eval_retention,
            branch_descent,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.max_chunk_tokens == 0 {
            return Err(ChunkError::Config("max_chunk_tokens must be positive"));
        }
        if self.min_chunk_tokens > self.max_chunk_tokens {
            return Err(ChunkError::Config(
                "min_chunk_tokens must not exceed max_chunk_tokens",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChunkerConfig::default();
        assert_eq!(config.max_chunk_tokens, 7800);
        assert_eq!(config.min_chunk_tokens, 2000);
        assert_eq!(config.eval_retention, EvalRetention::RetainAtBranchesAndComments);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let config = ChunkerConfig {
            max_chunk_tokens: 100,
            min_chunk_tokens: 200,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!("retain-all".parse::<EvalRetention>().unwrap(), EvalRetention::RetainAll);
        assert_eq!("retain-none".parse::<EvalRetention>().unwrap(), EvalRetention::RetainNone);
        assert!("sometimes".parse::<EvalRetention>().is_err());
        assert_eq!("deepest".parse::<BranchDescent>().unwrap(), BranchDescent::Deepest);
    }

    #[test]
    fn test_json_uses_kebab_case() {
        let config: ChunkerConfig =
            serde_json::from_str(r#"{"max_chunk_tokens": 500, "eval_retention": "retain-none"}"#)
                .unwrap();
        assert_eq!(config.max_chunk_tokens, 500);
        assert_eq!(config.min_chunk_tokens, 2000);
        assert_eq!(config.eval_retention, EvalRetention::RetainNone);
    }
}
