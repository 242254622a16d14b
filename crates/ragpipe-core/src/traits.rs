//! Collaborator seams. Embedding, model serving, reranking, and document
//! parsing all live behind these traits; the pipeline only ever sees the
//! contracts below.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::types::RetrievedFragment;

/// Embedding provider. Fixed dimensionality per deployment.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Extracts plain text from a document on disk. Parsing is the loader's
/// concern; the ingestion pipeline only routes by file extension.
pub trait TextLoader: Send + Sync {
    /// Lower-case extensions (without the dot) this loader handles.
    fn extensions(&self) -> &[&str];

    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Optional secondary scorer applied after initial retrieval.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        fragments: Vec<RetrievedFragment>,
    ) -> Result<Vec<RetrievedFragment>>;
}

/// Streaming language model. Each call is one fresh, finite generation:
/// the model pushes ordered text deltas into `tx` and returns once the
/// sequence ends. A closed receiver means the caller stopped listening;
/// implementations stop generating and return `Ok(())`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        tx: mpsc::Sender<String>,
    ) -> Result<()>;
}
