use std::fs;
use std::path::Path;

use tempfile::TempDir;

use ragpipe_core::config::{resolve_with_base, ChunkingConfig, Config, GenerationConfig};
use ragpipe_core::types::{DocumentChunk, InferenceEvent};

#[test]
fn config_load_merges_toml_file_and_env_overrides() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(
        tmp.path().join("config.toml"),
        "[store]\ndim = 64\n\n[data]\ndocs_dir = \"./docs\"\n",
    )
    .expect("write config");

    // Figment resolves relative file paths at extraction time, so stay in
    // the fixture directory until every lookup is done.
    let prev = std::env::current_dir().expect("cwd");
    std::env::set_current_dir(tmp.path()).expect("chdir");
    std::env::set_var("APP_ANSWER", "42");

    let config = Config::load().expect("load");
    let dim = config.get::<usize>("store.dim");
    let docs_dir = config.get::<String>("data.docs_dir");
    let answer = config.get::<String>("answer");
    let missing = config.get::<String>("no.such.key");

    std::env::remove_var("APP_ANSWER");
    std::env::set_current_dir(prev).expect("restore cwd");

    assert_eq!(dim.expect("store.dim"), 64);
    assert_eq!(docs_dir.expect("data.docs_dir"), "./docs");
    assert_eq!(answer.expect("env override"), "42");
    assert!(missing.is_err());
}

#[test]
fn resolve_with_base_keeps_absolute_paths() {
    let base = Path::new("/data");
    assert_eq!(resolve_with_base(base, "/abs/file.txt"), Path::new("/abs/file.txt"));
    assert_eq!(resolve_with_base(base, "rel/file.txt"), Path::new("/data/rel/file.txt"));
}

#[test]
fn default_configs_are_valid() {
    ChunkingConfig::default().validate().expect("default chunking");
    let g = GenerationConfig::default();
    GenerationConfig::new(g.temperature, g.max_length, g.generation_timeout, g.repetition_penalty)
        .expect("default generation");
}

#[test]
fn event_json_shape_matches_consumer_contract() {
    let ev = InferenceEvent::Metadata { setup_time: 0.25 };
    let json = serde_json::to_string(&ev).expect("serialize");
    assert!(json.contains("\"type\":\"metadata\""));
    assert!(json.contains("setup_time"));

    let back: InferenceEvent = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, ev);
}

#[test]
fn chunk_ids_differ_across_documents() {
    assert_ne!(
        DocumentChunk::derive_id("a.txt", 0),
        DocumentChunk::derive_id("b.txt", 0)
    );
}
