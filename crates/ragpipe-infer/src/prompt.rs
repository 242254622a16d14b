//! Prompt assembly from a fixed template set.
//!
//! Template kinds are a closed enumeration resolved from configuration
//! strings up front, so an unknown template name fails config validation
//! rather than an inference call. Bodies may use `{query}` and `{context}`
//! placeholders; context is the retrieved fragment texts joined with
//! `CONTEXT_SEPARATOR` in rank order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ragpipe_core::error::{Error, Result};
use ragpipe_core::types::RetrievedFragment;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    System,
    Friendly,
    Instruction,
}

impl FromStr for TemplateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "system" => Ok(TemplateKind::System),
            "friendly" => Ok(TemplateKind::Friendly),
            "instruction" => Ok(TemplateKind::Instruction),
            other => Err(Error::InvalidConfig(format!("unknown template type: {other}"))),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateKind::System => "system",
            TemplateKind::Friendly => "friendly",
            TemplateKind::Instruction => "instruction",
        };
        write!(f, "{name}")
    }
}

pub struct PromptAssembler {
    bodies: HashMap<TemplateKind, String>,
}

impl PromptAssembler {
    /// Assembler with no bodies registered; every kind must be added
    /// explicitly via `register`.
    pub fn empty() -> Self {
        Self { bodies: HashMap::new() }
    }

    pub fn register(&mut self, kind: TemplateKind, body: impl Into<String>) {
        self.bodies.insert(kind, body.into());
    }

    /// Concatenate the bodies for `kinds` in caller order, substituting
    /// `{query}` and `{context}`.
    pub fn assemble(
        &self,
        kinds: &[TemplateKind],
        query: &str,
        fragments: &[RetrievedFragment],
    ) -> Result<String> {
        let context = fragments
            .iter()
            .map(|f| f.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let mut sections = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let body = self
                .bodies
                .get(kind)
                .ok_or_else(|| Error::UnknownTemplate(kind.to_string()))?;
            sections.push(body.replace("{query}", query).replace("{context}", &context));
        }
        Ok(sections.join("\n\n"))
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        let mut assembler = Self::empty();
        assembler.register(
            TemplateKind::System,
            "You are a helpful assistant. Answer using only the context below.\n\nContext:\n{context}",
        );
        assembler.register(
            TemplateKind::Friendly,
            "Keep the tone warm and conversational.",
        );
        assembler.register(
            TemplateKind::Instruction,
            "Question: {query}\n\nAnswer from the context above. If the context is not enough, say so.",
        );
        assembler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragpipe_core::types::DocumentChunk;

    fn fragment(text: &str, rank: usize) -> RetrievedFragment {
        RetrievedFragment {
            chunk: DocumentChunk {
                id: DocumentChunk::derive_id("t.txt", rank),
                source_file: "t.txt".to_string(),
                text: text.to_string(),
                embedding: vec![0.0; 4],
                sparse_terms: Vec::new(),
                sequence_index: rank,
            },
            relevance_score: 1.0,
            rank,
        }
    }

    #[test]
    fn unknown_template_strings_fail_at_parse_time() {
        assert_eq!("system".parse::<TemplateKind>().unwrap(), TemplateKind::System);
        assert_eq!("Friendly".parse::<TemplateKind>().unwrap(), TemplateKind::Friendly);
        assert!(matches!(
            "casual".parse::<TemplateKind>(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn assemble_substitutes_query_and_context_in_rank_order() {
        let assembler = PromptAssembler::default();
        let fragments = vec![fragment("first passage", 0), fragment("second passage", 1)];
        let prompt = assembler
            .assemble(
                &[TemplateKind::System, TemplateKind::Instruction],
                "how do I start?",
                &fragments,
            )
            .expect("assemble");

        assert!(prompt.contains("how do I start?"));
        let first = prompt.find("first passage").expect("first");
        let second = prompt.find("second passage").expect("second");
        assert!(first < second);
        assert!(prompt.contains(CONTEXT_SEPARATOR));
        assert!(!prompt.contains("{query}"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn missing_body_is_unknown_template() {
        let assembler = PromptAssembler::empty();
        let err = assembler
            .assemble(&[TemplateKind::System], "q", &[])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTemplate(_)));
    }

    #[test]
    fn caller_order_is_preserved() {
        let mut assembler = PromptAssembler::empty();
        assembler.register(TemplateKind::Friendly, "AAA");
        assembler.register(TemplateKind::System, "BBB");
        let prompt = assembler
            .assemble(&[TemplateKind::Friendly, TemplateKind::System], "q", &[])
            .expect("assemble");
        assert_eq!(prompt, "AAA\n\nBBB");
    }
}
