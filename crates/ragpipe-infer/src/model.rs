//! Offline language models.
//!
//! Real model serving is an external collaborator behind
//! `ragpipe_core::traits::LanguageModel`. The models here are deterministic
//! stand-ins: `ScriptedModel` replays a fixed delta script (tests, demos),
//! `ExtractiveModel` streams the context section of the prompt back word by
//! word (offline CLI chat).

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

use ragpipe_core::config::GenerationConfig;
use ragpipe_core::error::{Error, Result};
use ragpipe_core::traits::LanguageModel;

/// Replays a fixed sequence of deltas. Optional per-delta delay, an
/// injected failure point, and a stall point (stops making progress so
/// timeout handling can be exercised).
pub struct ScriptedModel {
    deltas: Vec<String>,
    delay: Duration,
    fail_after: Option<usize>,
    stall_after: Option<usize>,
    cancel_after: Option<usize>,
}

impl ScriptedModel {
    pub fn new<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: deltas.into_iter().map(Into::into).collect(),
            delay: Duration::ZERO,
            fail_after: None,
            stall_after: None,
            cancel_after: None,
        }
    }

    /// Split `response` into whitespace-separated deltas.
    pub fn from_response(response: &str) -> Self {
        Self::new(response.split_whitespace().map(|w| format!("{w} ")))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Return a provider error after emitting `n` deltas.
    pub fn with_failure_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Stop making progress after emitting `n` deltas.
    pub fn with_stall_after(mut self, n: usize) -> Self {
        self.stall_after = Some(n);
        self
    }

    /// Report an external stop signal after emitting `n` deltas, the way a
    /// model runtime that watches its own kill switch would.
    pub fn with_cancellation_after(mut self, n: usize) -> Self {
        self.cancel_after = Some(n);
        self
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _prompt: &str,
        config: &GenerationConfig,
        tx: mpsc::Sender<String>,
    ) -> Result<()> {
        for (i, delta) in self.deltas.iter().take(config.max_length).enumerate() {
            if self.fail_after == Some(i) {
                return Err(Error::Provider("model runtime failed mid-generation".to_string()));
            }
            if self.cancel_after == Some(i) {
                return Err(Error::Cancelled);
            }
            if self.stall_after == Some(i) {
                std::future::pending::<()>().await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if tx.send(delta.clone()).await.is_err() {
                // Receiver gone: the caller stopped listening.
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Streams the prompt's context section back word by word. Good enough to
/// exercise the full pipeline without any model runtime.
pub struct ExtractiveModel {
    delay: Duration,
}

impl ExtractiveModel {
    pub fn new() -> Self {
        Self { delay: Duration::from_millis(20) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn answer_from(prompt: &str) -> String {
        // Everything between the context header and the next blank line pair.
        let body = prompt
            .split_once("Context:\n")
            .map(|(_, rest)| rest)
            .unwrap_or(prompt);
        let body = body.split("\n\nQuestion:").next().unwrap_or(body);
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "I found no relevant context for that question.".to_string()
        } else {
            format!("Based on the retrieved context: {trimmed}")
        }
    }
}

impl Default for ExtractiveModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for ExtractiveModel {
    fn model_name(&self) -> &str {
        "extractive"
    }

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        tx: mpsc::Sender<String>,
    ) -> Result<()> {
        let answer = Self::answer_from(prompt);
        for word in answer.split_whitespace().take(config.max_length) {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if tx.send(format!("{word} ")).await.is_err() {
                return Ok(());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractive_answer_pulls_the_context_section() {
        let prompt = "You are a helpful assistant.\n\nContext:\nfire needs oxygen\n\nQuestion: how?";
        let answer = ExtractiveModel::answer_from(prompt);
        assert!(answer.contains("fire needs oxygen"));
        assert!(!answer.contains("Question"));
    }

    #[test]
    fn from_response_round_trips_words() {
        let m = ScriptedModel::from_response("one two three");
        assert_eq!(m.deltas.len(), 3);
        assert_eq!(m.deltas[0], "one ");
    }
}
