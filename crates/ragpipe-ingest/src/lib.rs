//! ragpipe-ingest
//!
//! The ingestion pipeline: extension-keyed text loaders, a deterministic
//! overlapping chunker, and an embed-then-write path that leaves the store
//! untouched when anything fails.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod loader;
pub mod pipeline;

pub use loader::{LoaderRegistry, PlainTextLoader};
pub use pipeline::IngestionPipeline;
