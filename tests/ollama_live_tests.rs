//! Live pipeline tests against a running Ollama server.
//!
//! Ignored by default. They need Ollama with a chat model and an embedding
//! model pulled.
//!
//! ```bash
//! OLLAMA_LIVE_TESTS=1 cargo test --test ollama_live_tests -- --ignored --nocapture
//! ```
//!
//! - `OLLAMA_URL` - server address (default: http://localhost:11434)
//! - `OLLAMA_CHAT_MODEL` - chat model (default: llama3.2)
//! - `OLLAMA_EMBED_MODEL` - embedding model (default: nomic-embed-text)

use playground::llm::{ModelParams, Provider};
use playground::rag::{EmbeddingBackend, EmbeddingService, PipelineSettings, QueryRequest, RagPipeline};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn should_run_live_tests() -> bool {
    std::env::var("OLLAMA_LIVE_TESTS").is_ok()
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn live_pipeline() -> RagPipeline {
    let base_url = env_or("OLLAMA_URL", "http://localhost:11434");

    let embedder = EmbeddingBackend::Ollama {
        base_url: base_url.clone(),
        model: env_or("OLLAMA_EMBED_MODEL", "nomic-embed-text"),
    }
    .create_embedder(Duration::from_secs(60))
    .expect("embedder");

    let llm = Provider::Ollama {
        base_url,
        model: env_or("OLLAMA_CHAT_MODEL", "llama3.2"),
    }
    .create_client(Duration::from_secs(10))
    .expect("llm client");

    RagPipeline::new(
        Arc::new(EmbeddingService::new(embedder)),
        llm,
        PipelineSettings {
            generation_timeout: Duration::from_secs(180),
            ..PipelineSettings::default()
        },
    )
}

const DOCUMENT: &str = "The lighthouse on Skerry Point was built in 1871. \
Its keeper, Maren Holt, kept the lamp burning for forty years. \
The island's only pier sits on the eastern shore, facing the mainland ferry route. \
Puffins nest on the western cliffs every summer.";

#[tokio::test]
#[ignore]
async fn test_live_split_and_query() {
    if !should_run_live_tests() {
        eprintln!("Skipping live test (set OLLAMA_LIVE_TESTS=1)");
        return;
    }

    let pipeline = live_pipeline();

    let start = Instant::now();
    let index = pipeline.build_index(DOCUMENT, 12, 3).await.unwrap();
    println!("Indexed {} chunks in {:?}", index.len(), start.elapsed());
    assert!(index.len() > 1);

    let start = Instant::now();
    let answer = pipeline
        .answer_query(
            &index,
            &QueryRequest {
                query_text: "Who kept the lighthouse lamp burning?".to_string(),
                top_k: 2,
                params: ModelParams::default(),
            },
        )
        .await
        .unwrap();
    println!("Answered in {:?}: {}", start.elapsed(), answer.text);

    assert!(!answer.text.trim().is_empty());
    assert!(answer
        .grounding
        .iter()
        .any(|hit| hit.chunk.text.contains("Maren")));
}
