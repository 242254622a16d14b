use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ragpipe_core::config::{expand_path, ChunkingConfig, Config, GenerationConfig, HybridWeights};
use ragpipe_core::traits::Embedder;
use ragpipe_core::types::InferenceEvent;
use ragpipe_embed::{HashEmbedder, DEFAULT_DIM};
use ragpipe_infer::model::ExtractiveModel;
use ragpipe_infer::{Inferencer, InferencerConfig, PromptAssembler, Retriever, Session};
use ragpipe_ingest::{IngestionPipeline, LoaderRegistry};
use ragpipe_store::DocumentStore;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query|chat> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

struct Stack {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn Embedder>,
    pipeline: IngestionPipeline,
}

fn build_stack(config: &Config) -> anyhow::Result<Stack> {
    let dim: usize = config.get("store.dim").unwrap_or(DEFAULT_DIM);
    let weights = HybridWeights::new(
        config.get("store.dense_weight").unwrap_or(0.7),
        config.get("store.sparse_weight").unwrap_or(0.3),
    )?;
    let chunking = ChunkingConfig::new(
        config.get("ingest.chunk_size").unwrap_or(1000),
        config.get("ingest.chunk_overlap").unwrap_or(200),
    )?;

    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(dim)?);
    let store = Arc::new(DocumentStore::new(dim, weights)?);
    let pipeline = IngestionPipeline::new(
        LoaderRegistry::with_defaults(),
        Arc::clone(&embedder),
        Arc::clone(&store),
        chunking,
    )?;
    Ok(Stack { store, embedder, pipeline })
}

fn docs_dir(config: &Config, args: &[String]) -> PathBuf {
    args.first().map(|s| expand_path(s)).unwrap_or_else(|| {
        let dir: String = config.get("data.docs_dir").unwrap_or_else(|_| "./docs".to_string());
        expand_path(dir)
    })
}

async fn ingest_dir(stack: &Stack, dir: &PathBuf) -> anyhow::Result<usize> {
    println!("Ingesting from {}", dir.display());
    let results = stack.pipeline.add_directory(dir).await;

    let bar = ProgressBar::new(results.len() as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
    let mut ok = 0usize;
    for (path, result) in &results {
        bar.inc(1);
        if result.success {
            ok += 1;
        } else if let Some(message) = &result.error_message {
            bar.println(format!("⚠️  {}: {}", path.display(), message));
        }
    }
    bar.finish_and_clear();

    println!(
        "✅ Ingested {}/{} files ({} chunks in store)",
        ok,
        results.len(),
        stack.store.len()?
    );
    Ok(ok)
}

fn generation_config(config: &Config) -> anyhow::Result<GenerationConfig> {
    Ok(GenerationConfig::new(
        config.get("generation.temperature").unwrap_or(0.3),
        config.get("generation.max_length").unwrap_or(512),
        Duration::from_secs(config.get("generation.timeout_secs").unwrap_or(120)),
        config.get("generation.repetition_penalty").unwrap_or(1.1),
    )?)
}

fn inferencer_config(config: &Config) -> anyhow::Result<InferencerConfig> {
    let templates: Vec<String> = config
        .get("inference.templates")
        .unwrap_or_else(|_| vec!["system".to_string(), "instruction".to_string()]);
    let template_refs: Vec<&str> = templates.iter().map(String::as_str).collect();
    Ok(InferencerConfig::new(
        config.get("inference.default_k").unwrap_or(3),
        config.get("inference.enable_reranking").unwrap_or(false),
        &template_refs,
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();

    match cmd.as_str() {
        "ingest" => {
            let stack = build_stack(&config)?;
            let dir = docs_dir(&config, &args);
            ingest_dir(&stack, &dir).await?;
            for name in stack.store.document_names()? {
                println!("  📄 {}", name);
            }
        }
        "query" => {
            let query_text = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: ragpipe query \"<query>\" [docs_dir]");
                std::process::exit(1)
            });
            let stack = build_stack(&config)?;
            let dir = docs_dir(&config, &args[1..]);
            ingest_dir(&stack, &dir).await?;

            let retriever =
                Retriever::new(Arc::clone(&stack.embedder), Arc::clone(&stack.store))?;
            let k: usize = config.get("inference.default_k").unwrap_or(3);
            let fragments = retriever.retrieve(&query_text, k).await?;
            if fragments.is_empty() {
                println!("No matches.");
            }
            for f in fragments {
                println!(
                    "#{} [{:.4}] {} — {}",
                    f.rank + 1,
                    f.relevance_score,
                    f.chunk.source_file,
                    f.chunk.text.chars().take(120).collect::<String>()
                );
            }
        }
        "chat" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: ragpipe chat \"<question>\" [docs_dir]");
                std::process::exit(1)
            });
            let stack = build_stack(&config)?;
            let dir = docs_dir(&config, &args[1..]);
            ingest_dir(&stack, &dir).await?;

            let retriever = Arc::new(Retriever::new(
                Arc::clone(&stack.embedder),
                Arc::clone(&stack.store),
            )?);
            let inferencer = Inferencer::new(
                retriever,
                Arc::new(ExtractiveModel::new()),
                generation_config(&config)?,
                Arc::new(PromptAssembler::default()),
                None,
                inferencer_config(&config)?,
            );

            // Ctrl-C cancels the in-flight call; chunks already printed stand.
            let cancel = CancellationToken::new();
            let ctrl_c_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_cancel.cancel();
                }
            });

            let mut events =
                inferencer.infer_stream(&question, None, &Session::new(), cancel);
            while let Some(event) = events.next().await {
                match event {
                    InferenceEvent::Metadata { setup_time } => {
                        println!("🔍 Retrieved context in {:.2}s\n", setup_time);
                    }
                    InferenceEvent::Chunk { chunk_text } => {
                        print!("{}", chunk_text);
                        use std::io::Write;
                        std::io::stdout().flush()?;
                    }
                    InferenceEvent::Complete { total_time } => {
                        println!("\n\n✅ Done in {:.2}s", total_time);
                    }
                    InferenceEvent::Error { message } => {
                        println!("\n❌ {}", message);
                        std::process::exit(1);
                    }
                    InferenceEvent::Cancelled => {
                        println!("\n🛑 Cancelled");
                        break;
                    }
                }
            }
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
