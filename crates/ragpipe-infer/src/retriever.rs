//! Query-side retrieval: embed the query, delegate to the store's hybrid
//! ranking. Deterministic for a fixed store state and `k`.

use std::sync::Arc;
use std::time::Duration;

use ragpipe_core::error::{Error, Result};
use ragpipe_core::traits::Embedder;
use ragpipe_core::types::RetrievedFragment;
use ragpipe_store::DocumentStore;

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<DocumentStore>,
    embed_timeout: Duration,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<DocumentStore>) -> Result<Self> {
        if embedder.dim() != store.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder dim {} does not match store dim {}",
                embedder.dim(),
                store.dim()
            )));
        }
        Ok(Self { embedder, store, embed_timeout: DEFAULT_EMBED_TIMEOUT })
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedFragment>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be > 0".to_string()));
        }
        let embedding = tokio::time::timeout(self.embed_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| Error::Timeout("query embedding took too long".to_string()))??;
        let fragments = self.store.hybrid_query(query, &embedding, k)?;
        tracing::debug!(k, returned = fragments.len(), "retrieval done");
        Ok(fragments)
    }
}
