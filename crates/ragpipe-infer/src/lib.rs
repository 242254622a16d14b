//! ragpipe-infer
//!
//! Query-time orchestration: hybrid retrieval, prompt assembly from a fixed
//! template set, a streaming generation engine with per-delta timeouts, and
//! the inferencer that ties them into one cancellable typed event stream.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod engine;
pub mod model;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod session;

pub use engine::GenerationEngine;
pub use orchestrator::{Inferencer, InferencerConfig};
pub use prompt::{PromptAssembler, TemplateKind};
pub use retriever::Retriever;
pub use session::Session;
