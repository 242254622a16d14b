//! Embedding providers behind `ragpipe_core::traits::Embedder`.
//!
//! Model-backed embedding is an external collaborator; the in-tree provider
//! is a deterministic hashed bag-of-words embedder suitable for offline use
//! and tests. Swap in a real provider by implementing `Embedder`.

use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use twox_hash::XxHash64;

use ragpipe_core::error::{Error, Result};
use ragpipe_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 256;

/// Deterministic, dependency-free embedder: each whitespace token is hashed
/// into one of `dim` buckets and the resulting vector is l2-normalized.
/// Identical text always embeds to the identical vector.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dim must be > 0".to_string()));
        }
        Ok(Self { dim })
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

/// Default provider for local/offline deployments.
pub fn default_embedder() -> Result<Arc<dyn Embedder>> {
    tracing::debug!(dim = DEFAULT_DIM, "using hashed bag-of-words embedder");
    Ok(Arc::new(HashEmbedder::new(DEFAULT_DIM)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedding_is_deterministic_and_normalized() {
        let e = HashEmbedder::new(64).unwrap();
        let a = e.embed("fire starting basics").await.unwrap();
        let b = e.embed("fire starting basics").await.unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn different_text_embeds_differently() {
        let e = HashEmbedder::new(64).unwrap();
        let a = e.embed("water purification").await.unwrap();
        let b = e.embed("solar panel wiring").await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn zero_dim_is_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }
}
