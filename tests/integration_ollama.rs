#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance with the configured models pulled
// Run with: cargo test --test integration_ollama -- --ignored

use rules_rag::ask::{DEFAULT_QUESTION, NO_RESPONSE_MESSAGE, ask};
use rules_rag::commands::DEMO_QUERIES;
use rules_rag::config::{Config, OllamaConfig};
use rules_rag::embeddings::{Embedder, OllamaEmbedder};
use rules_rag::indexer::{IndexOutcome, ensure_index};
use rules_rag::ollama::OllamaClient;
use rules_rag::rag::RagPipeline;
use std::env;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

fn live_config() -> Config {
    let mut ollama = OllamaConfig::default();
    if let Ok(host) = env::var("OLLAMA_HOST") {
        ollama.host = host;
    }
    if let Some(port) = env::var("OLLAMA_PORT").ok().and_then(|p| p.parse().ok()) {
        ollama.port = port;
    }
    if let Ok(model) = env::var("OLLAMA_MODEL") {
        ollama.model = model;
    }
    if let Ok(model) = env::var("OLLAMA_EMBEDDING_MODEL") {
        ollama.embedding_model = model;
    }

    Config {
        ollama,
        ..Config::default()
    }
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_health_check() {
    init_test_tracing();
    let config = live_config();
    let client = OllamaClient::new(&config.ollama).expect("Failed to create Ollama client");

    let result = client.health_check(&config.ollama.model);
    assert!(
        result.is_ok(),
        "Health check should succeed with local Ollama: {:?}",
        result
    );
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_direct_question() {
    init_test_tracing();
    let config = live_config();
    let client = OllamaClient::new(&config.ollama)
        .expect("Failed to create Ollama client")
        .with_retry_attempts(1);

    let answer = ask(&client, &config.ollama.model, DEFAULT_QUESTION);
    info!("Answer: {}", answer);

    assert!(!answer.trim().is_empty());
    assert_ne!(answer, NO_RESPONSE_MESSAGE);
    assert!(!answer.starts_with("Connection error"));
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_embeddings_share_dimension() {
    init_test_tracing();
    let config = live_config();
    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");

    let vectors = embedder
        .embed_batch(&[
            "Forbid the pipe operator in conditions.".to_string(),
            "Allow the pipe operator for bit flags.".to_string(),
        ])
        .expect("embedding succeeds");

    assert_eq!(vectors.len(), 2);
    assert!(!vectors[0].is_empty());
    assert_eq!(vectors[0].len(), vectors[1].len());
}

#[tokio::test]
#[ignore = "requires a local Ollama instance"]
async fn real_ollama_demo_over_bundled_rules() {
    init_test_tracing();
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = live_config();
    config.rag.rules_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("rules");
    config.rag.persist_dir = temp_dir.path().join("vector_db");

    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");
    let outcome = ensure_index(&config, &embedder).await.expect("index builds");
    assert!(matches!(outcome, IndexOutcome::Built(_)));

    let pipeline = RagPipeline::open(&config).await.expect("pipeline opens");
    for code in DEMO_QUERIES {
        let answer = pipeline.query(code).await.expect("query succeeds");
        info!("{} => {}", code, answer);
        assert!(!answer.trim().is_empty());
    }
}
