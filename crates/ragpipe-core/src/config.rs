//! Configuration loading and validated config structs.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars for the file-backed surface, and exposes typed structs that validate
//! their invariants at construction so bad parameters fail before any work
//! begins.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

/// Chunking parameters for ingestion. Overlap must be strictly smaller than
/// the chunk size; both are counted in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let cfg = Self { chunk_size, chunk_overlap };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be < chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

/// Dense/sparse blend used by the document store's hybrid ranking.
/// A store-level constant, not a per-query knob.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HybridWeights {
    pub dense: f32,
    pub sparse: f32,
}

impl HybridWeights {
    pub fn new(dense: f32, sparse: f32) -> Result<Self> {
        let w = Self { dense, sparse };
        w.validate()?;
        Ok(w)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dense < 0.0 || self.sparse < 0.0 {
            return Err(Error::InvalidConfig("hybrid weights must be non-negative".to_string()));
        }
        if self.dense == 0.0 && self.sparse == 0.0 {
            return Err(Error::InvalidConfig("at least one hybrid weight must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self { dense: 0.7, sparse: 0.3 }
    }
}

/// Sampling and streaming parameters for one generation engine instance.
/// Immutable for the engine's lifetime; validated at construction.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_length: usize,
    pub generation_timeout: Duration,
    pub repetition_penalty: f32,
}

impl GenerationConfig {
    pub fn new(
        temperature: f32,
        max_length: usize,
        generation_timeout: Duration,
        repetition_penalty: f32,
    ) -> Result<Self> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(Error::InvalidConfig(format!(
                "temperature must be within [0, 2], got {temperature}"
            )));
        }
        if max_length == 0 {
            return Err(Error::InvalidConfig("max_length must be > 0".to_string()));
        }
        if generation_timeout.is_zero() {
            return Err(Error::InvalidConfig("generation_timeout must be > 0".to_string()));
        }
        if repetition_penalty <= 0.0 {
            return Err(Error::InvalidConfig("repetition_penalty must be > 0".to_string()));
        }
        Ok(Self { temperature, max_length, generation_timeout, repetition_penalty })
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_length: 512,
            generation_timeout: Duration::from_secs(120),
            repetition_penalty: 1.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_rejects_overlap_not_smaller_than_size() {
        assert!(ChunkingConfig::new(100, 20).is_ok());
        assert!(matches!(ChunkingConfig::new(100, 100), Err(Error::InvalidConfig(_))));
        assert!(matches!(ChunkingConfig::new(0, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn generation_config_bounds() {
        assert!(GenerationConfig::new(0.3, 512, Duration::from_secs(30), 1.1).is_ok());
        assert!(GenerationConfig::new(2.5, 512, Duration::from_secs(30), 1.1).is_err());
        assert!(GenerationConfig::new(0.3, 0, Duration::from_secs(30), 1.1).is_err());
        assert!(GenerationConfig::new(0.3, 512, Duration::ZERO, 1.1).is_err());
    }

    #[test]
    fn hybrid_weights_must_not_both_be_zero() {
        assert!(HybridWeights::new(1.0, 0.0).is_ok());
        assert!(HybridWeights::new(0.0, 0.0).is_err());
        assert!(HybridWeights::new(-0.1, 0.5).is_err());
    }
}
