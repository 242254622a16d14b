//! Domain types shared across the ingestion and inference pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A bounded slice of a source document, the unit of embedding and retrieval.
///
/// Chunks are immutable once created and identified by
/// `(source_file, sequence_index)`; `id` is a content-addressed hash of that
/// pair. The document store owns every chunk written into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub source_file: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub sparse_terms: Vec<String>,
    pub sequence_index: usize,
}

impl DocumentChunk {
    pub fn derive_id(source_file: &str, sequence_index: usize) -> ChunkId {
        blake3::hash(format!("{source_file}:{sequence_index}").as_bytes())
            .to_hex()
            .to_string()
    }
}

/// Produced once per successful ingestion; read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Outcome of one `add_document` call. Exactly one of `document_metadata`
/// and `error_message` is populated; ingestion failures are expected,
/// recoverable conditions and never surface as an `Err` to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    pub success: bool,
    pub document_metadata: Option<DocumentMetadata>,
    pub error_message: Option<String>,
}

impl IngestionResult {
    pub fn ok(metadata: DocumentMetadata) -> Self {
        Self { success: true, document_metadata: Some(metadata), error_message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, document_metadata: None, error_message: Some(message.into()) }
    }
}

/// One ranked retrieval hit. Ephemeral, produced per query; ordered by
/// descending score with ties broken by ingestion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedFragment {
    pub chunk: DocumentChunk,
    pub relevance_score: f32,
    pub rank: usize,
}

/// Typed event stream emitted by one inference call.
///
/// Strict order: exactly one `Metadata`, zero or more `Chunk`, then exactly
/// one terminal event (`Complete`, `Error`, or `Cancelled`). A call
/// cancelled before setup finishes emits only `Cancelled`. Times are
/// fractional seconds of wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InferenceEvent {
    Metadata { setup_time: f64 },
    Chunk { chunk_text: String },
    Complete { total_time: f64 },
    Error { message: String },
    Cancelled,
}

impl InferenceEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InferenceEvent::Complete { .. } | InferenceEvent::Error { .. } | InferenceEvent::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_stable_per_source_and_index() {
        let a = DocumentChunk::derive_id("notes.txt", 0);
        let b = DocumentChunk::derive_id("notes.txt", 0);
        let c = DocumentChunk::derive_id("notes.txt", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ingestion_result_populates_exactly_one_side() {
        let ok = IngestionResult::ok(DocumentMetadata {
            file_name: "a.txt".to_string(),
            chunk_count: 3,
            ingested_at: Utc::now(),
        });
        assert!(ok.success && ok.document_metadata.is_some() && ok.error_message.is_none());

        let failed = IngestionResult::failed("bad file");
        assert!(!failed.success && failed.document_metadata.is_none());
        assert_eq!(failed.error_message.as_deref(), Some("bad file"));
    }

    #[test]
    fn event_serializes_with_type_and_data_tags() {
        let ev = InferenceEvent::Chunk { chunk_text: "hello".to_string() };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "chunk");
        assert_eq!(json["data"]["chunk_text"], "hello");
        assert!(!ev.is_terminal());
        assert!(InferenceEvent::Cancelled.is_terminal());
    }
}
