//! The ingestion pipeline: load, chunk, embed, then one atomic store write.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use ragpipe_core::config::ChunkingConfig;
use ragpipe_core::error::{Error, Result};
use ragpipe_core::traits::Embedder;
use ragpipe_core::types::{DocumentChunk, DocumentMetadata, IngestionResult};
use ragpipe_store::sparse::tokenize;
use ragpipe_store::DocumentStore;

use crate::chunker::chunk_text;
use crate::loader::LoaderRegistry;

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(60);

pub struct IngestionPipeline {
    loaders: LoaderRegistry,
    embedder: Arc<dyn Embedder>,
    store: Arc<DocumentStore>,
    chunking: ChunkingConfig,
    embed_timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(
        loaders: LoaderRegistry,
        embedder: Arc<dyn Embedder>,
        store: Arc<DocumentStore>,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        chunking.validate()?;
        if embedder.dim() != store.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder dim {} does not match store dim {}",
                embedder.dim(),
                store.dim()
            )));
        }
        Ok(Self { loaders, embedder, store, chunking, embed_timeout: DEFAULT_EMBED_TIMEOUT })
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Ingest one file. Failures come back as a structured result, never as
    /// an `Err`: bad files and provider hiccups are expected conditions the
    /// caller branches on.
    pub async fn add_document(&self, path: &Path) -> IngestionResult {
        match self.ingest(path).await {
            Ok(metadata) => {
                info!(
                    file_name = %metadata.file_name,
                    chunk_count = metadata.chunk_count,
                    "document ingested"
                );
                IngestionResult::ok(metadata)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ingestion failed");
                IngestionResult::failed(e.to_string())
            }
        }
    }

    /// Walk a directory (sorted order) and ingest every file with a
    /// registered loader. Returns one result per attempted file.
    pub async fn add_directory(&self, dir: &Path) -> Vec<(PathBuf, IngestionResult)> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| self.loaders.supports(p))
            .collect();
        files.sort();

        let mut results = Vec::with_capacity(files.len());
        for path in files {
            let result = self.add_document(&path).await;
            results.push((path, result));
        }
        results
    }

    async fn ingest(&self, path: &Path) -> Result<DocumentMetadata> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::InvalidArgument(format!("not a file path: {}", path.display())))?;

        let text = self.loaders.extract_text(path)?;
        if text.trim().is_empty() {
            return Err(Error::Operation(format!("no extractable text in {file_name}")));
        }

        let pieces = chunk_text(&text, &self.chunking);
        let embeddings = tokio::time::timeout(
            self.embed_timeout,
            self.embedder.embed_batch(&pieces),
        )
        .await
        .map_err(|_| Error::Timeout(format!("embedding {file_name} took too long")))??;

        let chunks: Vec<DocumentChunk> = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(sequence_index, (piece, embedding))| DocumentChunk {
                id: DocumentChunk::derive_id(&file_name, sequence_index),
                source_file: file_name.clone(),
                sparse_terms: tokenize(&piece),
                text: piece,
                embedding,
                sequence_index,
            })
            .collect();
        let chunk_count = chunks.len();

        // Single write: the whole document lands or none of it, and a
        // shrunken revision drops its old trailing chunks.
        self.store.replace_document(&file_name, &chunks)?;

        Ok(DocumentMetadata { file_name, chunk_count, ingested_at: Utc::now() })
    }
}
