//! The inference orchestrator.
//!
//! One call moves through `Setup -> Streaming -> {Completed | Failed |
//! Cancelled}` and emits a typed event sequence over a bounded channel:
//! exactly one `Metadata`, the generation deltas as `Chunk`s in arrival
//! order, then one terminal event. Cancellation propagates through a
//! `CancellationToken` and stops the underlying generation; chunks already
//! emitted stand as a valid partial answer.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ragpipe_core::config::GenerationConfig;
use ragpipe_core::error::{Error, Result};
use ragpipe_core::traits::{LanguageModel, Reranker};
use ragpipe_core::types::InferenceEvent;

use crate::engine::GenerationEngine;
use crate::prompt::{PromptAssembler, TemplateKind};
use crate::retriever::Retriever;
use crate::session::Session;

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct InferencerConfig {
    pub default_k: usize,
    pub enable_reranking: bool,
    pub template_kinds: Vec<TemplateKind>,
}

impl InferencerConfig {
    /// Template names resolve here, at configuration time; an unknown name
    /// fails before any inference work begins.
    pub fn new(default_k: usize, enable_reranking: bool, template_types: &[&str]) -> Result<Self> {
        if default_k == 0 {
            return Err(Error::InvalidConfig("default_k must be > 0".to_string()));
        }
        if template_types.is_empty() {
            return Err(Error::InvalidConfig("at least one template type is required".to_string()));
        }
        let template_kinds = template_types
            .iter()
            .map(|s| s.parse::<TemplateKind>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { default_k, enable_reranking, template_kinds })
    }
}

pub struct Inferencer {
    retriever: Arc<Retriever>,
    reranker: Option<Arc<dyn Reranker>>,
    assembler: Arc<PromptAssembler>,
    model: Arc<dyn LanguageModel>,
    generation: GenerationConfig,
    config: InferencerConfig,
}

impl Inferencer {
    pub fn new(
        retriever: Arc<Retriever>,
        model: Arc<dyn LanguageModel>,
        generation: GenerationConfig,
        assembler: Arc<PromptAssembler>,
        reranker: Option<Arc<dyn Reranker>>,
        config: InferencerConfig,
    ) -> Self {
        Self { retriever, reranker, assembler, model, generation, config }
    }

    /// Start one inference call on the shared runtime and return its event
    /// stream. The consumer pulls from a bounded channel (backpressure);
    /// dropping the stream or cancelling the token stops generation.
    pub fn infer_stream(
        &self,
        query: &str,
        k: Option<usize>,
        session: &Session,
        cancel: CancellationToken,
    ) -> ReceiverStream<InferenceEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let call = InferenceCall {
            retriever: Arc::clone(&self.retriever),
            reranker: if self.config.enable_reranking { self.reranker.clone() } else { None },
            assembler: Arc::clone(&self.assembler),
            model: Arc::clone(&self.model),
            generation: self.generation.clone(),
            template_kinds: self.config.template_kinds.clone(),
            query: query.to_string(),
            k: k.unwrap_or(self.config.default_k),
            history: session.render(),
        };
        tokio::spawn(call.run(cancel, tx));

        ReceiverStream::new(rx)
    }
}

/// Everything one call owns. Calls share nothing mutable but the store
/// behind the retriever.
struct InferenceCall {
    retriever: Arc<Retriever>,
    reranker: Option<Arc<dyn Reranker>>,
    assembler: Arc<PromptAssembler>,
    model: Arc<dyn LanguageModel>,
    generation: GenerationConfig,
    template_kinds: Vec<TemplateKind>,
    query: String,
    k: usize,
    history: Option<String>,
}

impl InferenceCall {
    async fn run(self, cancel: CancellationToken, tx: mpsc::Sender<InferenceEvent>) {
        let started = Instant::now();

        let setup_result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = tx.send(InferenceEvent::Cancelled).await;
                return;
            }
            result = self.setup() => result,
        };

        let setup_time = started.elapsed().as_secs_f64();
        if tx.send(InferenceEvent::Metadata { setup_time }).await.is_err() {
            return;
        }
        let prompt = match setup_result {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "inference setup failed");
                let _ = tx.send(InferenceEvent::Error { message: e.to_string() }).await;
                return;
            }
        };
        info!(setup_time, k = self.k, "inference setup complete");

        let engine = GenerationEngine::new(Arc::clone(&self.model), self.generation.clone());
        let mut deltas = engine.generate(&prompt);
        let mut emitted = 0usize;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    // Dropping the delta stream stops the model task.
                    let _ = tx.send(InferenceEvent::Cancelled).await;
                    return;
                }
                next = deltas.next() => match next {
                    Some(Ok(chunk_text)) => {
                        emitted += 1;
                        if tx.send(InferenceEvent::Chunk { chunk_text }).await.is_err() {
                            return;
                        }
                    }
                    // A collaborator observing its own stop signal is a
                    // cancellation, not a failure.
                    Some(Err(Error::Cancelled)) => {
                        let _ = tx.send(InferenceEvent::Cancelled).await;
                        return;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, emitted, "generation failed mid-stream");
                        let _ = tx.send(InferenceEvent::Error { message: e.to_string() }).await;
                        return;
                    }
                    None => break,
                },
            }
        }

        let total_time = started.elapsed().as_secs_f64();
        info!(chunks = emitted, total_time, "inference complete");
        let _ = tx.send(InferenceEvent::Complete { total_time }).await;
    }

    async fn setup(&self) -> Result<String> {
        let fragments = self.retriever.retrieve(&self.query, self.k).await?;
        let fragments = match &self.reranker {
            Some(reranker) => reranker.rerank(&self.query, fragments).await?,
            None => fragments,
        };
        let mut prompt = self.assembler.assemble(&self.template_kinds, &self.query, &fragments)?;
        if let Some(history) = &self.history {
            prompt = format!("{history}\n{prompt}");
        }
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_unknown_template_and_zero_k() {
        assert!(InferencerConfig::new(2, false, &["system", "friendly"]).is_ok());
        assert!(matches!(
            InferencerConfig::new(2, false, &["system", "casual"]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(InferencerConfig::new(0, false, &["system"]).is_err());
        assert!(InferencerConfig::new(2, false, &[]).is_err());
    }
}
