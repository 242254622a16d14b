//! Streaming generation engine.
//!
//! Wraps a `LanguageModel` and an immutable `GenerationConfig`. The model
//! pushes deltas into a bounded channel from its own task; the engine
//! re-exposes them as a `Stream`, enforcing the per-delta progress timeout
//! so a stalled runtime terminates the sequence instead of hanging.

use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ragpipe_core::config::GenerationConfig;
use ragpipe_core::error::{Error, Result};
use ragpipe_core::traits::LanguageModel;

const DELTA_CHANNEL_CAPACITY: usize = 32;

pub struct GenerationEngine {
    model: Arc<dyn LanguageModel>,
    config: GenerationConfig,
}

struct GenState {
    rx: mpsc::Receiver<String>,
    handle: Option<JoinHandle<Result<()>>>,
    timeout: Duration,
}

impl Drop for GenState {
    fn drop(&mut self) {
        // Dropping the stream mid-generation must stop the model task.
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl GenerationEngine {
    pub fn new(model: Arc<dyn LanguageModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Start one fresh generation. The returned stream yields ordered text
    /// deltas; it ends after the model's sequence is exhausted, or after a
    /// single `Err` item (timeout or model failure).
    pub fn generate(&self, prompt: &str) -> BoxStream<'static, Result<String>> {
        let (tx, rx) = mpsc::channel(DELTA_CHANNEL_CAPACITY);
        let model = Arc::clone(&self.model);
        let config = self.config.clone();
        let prompt = prompt.to_string();
        tracing::debug!(model = model.model_name(), prompt_chars = prompt.len(), "generation start");
        let handle = tokio::spawn(async move { model.generate(&prompt, &config, tx).await });

        let state = GenState { rx, handle: Some(handle), timeout: self.config.generation_timeout };
        futures::stream::unfold(Some(state), |state| async move {
            let mut state = state?;
            match tokio::time::timeout(state.timeout, state.rx.recv()).await {
                Ok(Some(delta)) => Some((Ok(delta), Some(state))),
                Ok(None) => {
                    // Channel closed: the model task finished, surface its outcome.
                    let handle = state.handle.take()?;
                    match handle.await {
                        Ok(Ok(())) => None,
                        Ok(Err(e)) => Some((Err(e), None)),
                        Err(e) => Some((
                            Err(Error::Operation(format!("generation task failed: {e}"))),
                            None,
                        )),
                    }
                }
                Err(_) => {
                    let timeout = state.timeout;
                    drop(state);
                    Some((
                        Err(Error::Timeout(format!(
                            "no generation progress within {timeout:?}"
                        ))),
                        None,
                    ))
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedModel;

    fn config(timeout: Duration) -> GenerationConfig {
        GenerationConfig::new(0.3, 512, timeout, 1.1).expect("config")
    }

    #[tokio::test]
    async fn deltas_arrive_in_order_and_concatenate() {
        let model = Arc::new(ScriptedModel::new(["Hello", ", ", "world"]));
        let engine = GenerationEngine::new(model, config(Duration::from_secs(5)));
        let mut stream = engine.generate("prompt");

        let mut full = String::new();
        while let Some(delta) = stream.next().await {
            full.push_str(&delta.expect("delta"));
        }
        assert_eq!(full, "Hello, world");
    }

    #[tokio::test]
    async fn each_call_is_a_fresh_generation() {
        let model = Arc::new(ScriptedModel::new(["a", "b"]));
        let engine = GenerationEngine::new(model, config(Duration::from_secs(5)));
        for _ in 0..2 {
            let deltas: Vec<_> = engine.generate("p").collect().await;
            assert_eq!(deltas.len(), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_model_times_out() {
        let model = Arc::new(ScriptedModel::new(["first"]).with_stall_after(1));
        let engine = GenerationEngine::new(model, config(Duration::from_millis(100)));
        let mut stream = engine.generate("p");

        assert_eq!(stream.next().await.expect("some").expect("first delta"), "first");
        let err = stream.next().await.expect("timeout item").unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(stream.next().await.is_none(), "stream terminates after the timeout");
    }

    #[tokio::test]
    async fn model_failure_surfaces_after_partial_output() {
        let model = Arc::new(ScriptedModel::new(["a", "b", "c"]).with_failure_after(2));
        let engine = GenerationEngine::new(model, config(Duration::from_secs(5)));
        let items: Vec<_> = engine.generate("p").collect().await;
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok() && items[1].is_ok());
        assert!(matches!(items[2], Err(Error::Provider(_))));
    }

    #[tokio::test]
    async fn max_length_caps_the_delta_count() {
        let model = Arc::new(ScriptedModel::new(["a", "b", "c", "d"]));
        let cfg = GenerationConfig::new(0.3, 2, Duration::from_secs(5), 1.1).expect("config");
        let engine = GenerationEngine::new(model, cfg);
        let items: Vec<_> = engine.generate("p").collect().await;
        assert_eq!(items.len(), 2);
    }
}
