#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end index and query flow against a fake Ollama server

use rules_rag::RagError;
use rules_rag::commands::show_status;
use rules_rag::config::{Config, OllamaConfig};
use rules_rag::embeddings::OllamaEmbedder;
use rules_rag::indexer::{IndexManifest, IndexOutcome, ensure_index, rebuild_index};
use rules_rag::rag::RagPipeline;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const DIMENSION: usize = 32;

const FORBID_RULE: &str = "Forbid the | operator when it is used as a logical or inside an if \
                           condition, for example if (value | 0).";
const ALLOW_RULE: &str = "Allow the | operator when it combines bit flags, for example \
                          flags = MASK_A | MASK_B.";

/// `/api/embed` stand-in: counts hashed lowercase words per component
struct WordCountEmbeddings;

impl WordCountEmbeddings {
    fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; DIMENSION];
        vector[DIMENSION - 1] = 0.01;
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(5381_u32, |hash, byte| hash.wrapping_mul(33) ^ u32::from(byte));
            vector[hash as usize % (DIMENSION - 1)] += 1.0;
        }
        vector
    }
}

impl Respond for WordCountEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("request body is json");
        let embeddings: Vec<Vec<f32>> = body["input"]
            .as_array()
            .expect("input is an array")
            .iter()
            .map(|text| Self::vector_for(text.as_str().unwrap_or_default()))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "embeddings": embeddings }))
    }
}

/// `/api/chat` stand-in: answers with the first decision word found in the prompt context
struct DecisionChat;

impl Respond for DecisionChat {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("request body is json");
        let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
        let context = prompt
            .split("RULES (Context):")
            .nth(1)
            .unwrap_or_default();
        let decision = match (context.find("Forbid"), context.find("Allow")) {
            (Some(forbid), Some(allow)) if allow < forbid => "Allow",
            (Some(_), _) => "Forbid",
            (None, Some(_)) => "Allow",
            (None, None) => "Unknown",
        };
        ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": format!("{decision}: per the rules.\n")}
        }))
    }
}

async fn start_fake_ollama() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(WordCountEmbeddings)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(DecisionChat)
        .mount(&server)
        .await;
    server
}

fn create_test_config(server: &MockServer) -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let rules_dir = temp_dir.path().join("rules");
    fs::create_dir_all(&rules_dir).expect("should create rules dir");
    fs::write(rules_dir.join("logical_or.txt"), FORBID_RULE).expect("should write rule");
    fs::write(rules_dir.join("bit_flags.txt"), ALLOW_RULE).expect("should write rule");

    let address = server.address();
    let mut config = Config {
        ollama: OllamaConfig {
            host: address.ip().to_string(),
            port: address.port(),
            timeout_seconds: 10,
            retry_attempts: 1,
            ..OllamaConfig::default()
        },
        ..Config::default()
    };
    config.rag.rules_dir = rules_dir;
    config.rag.persist_dir = temp_dir.path().join("vector_db");
    config.rag.top_k = 1;
    (config, temp_dir)
}

#[tokio::test]
async fn index_once_then_answer_queries() {
    let server = start_fake_ollama().await;
    let (config, _temp_dir) = create_test_config(&server);
    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");

    let outcome = ensure_index(&config, &embedder).await.expect("index builds");
    let IndexOutcome::Built(stats) = outcome else {
        panic!("expected a fresh build, got {outcome:?}");
    };
    assert_eq!(stats.documents, 2);
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.dimension, DIMENSION);

    let again = ensure_index(&config, &embedder).await.expect("reuse");
    assert_eq!(again, IndexOutcome::Reused);

    let pipeline = RagPipeline::open(&config).await.expect("pipeline opens");

    let truthiness = pipeline
        .query("if (value | 0) { console.log('Error'); }")
        .await
        .expect("query succeeds");
    assert_eq!(truthiness, "Forbid: per the rules.\n");

    let flags = pipeline
        .query("flags = MASK_A | MASK_B;")
        .await
        .expect("query succeeds");
    assert_eq!(flags, "Allow: per the rules.\n");
}

#[tokio::test]
async fn chat_request_carries_prompt_and_temperature() {
    let server = start_fake_ollama().await;
    let (config, _temp_dir) = create_test_config(&server);
    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");
    ensure_index(&config, &embedder).await.expect("index builds");

    let pipeline = RagPipeline::open(&config).await.expect("pipeline opens");
    pipeline
        .query("flags = MASK_A | MASK_B;")
        .await
        .expect("query succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    let chat = requests
        .iter()
        .find(|request| request.url.path() == "/api/chat")
        .expect("chat request was sent");
    let body: Value = serde_json::from_slice(&chat.body).expect("chat body is json");

    assert_eq!(body["model"], "mistral");
    assert_eq!(body["stream"], false);
    assert_eq!(body["options"]["temperature"], 0.0);
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
    let prompt = body["messages"][0]["content"].as_str().expect("prompt text");
    assert!(prompt.contains(ALLOW_RULE));
    assert!(prompt.contains("flags = MASK_A | MASK_B;"));
    assert!(prompt.starts_with("You are a strict Code Analyzer."));
}

#[tokio::test]
async fn changed_embedding_model_is_rejected() {
    let server = start_fake_ollama().await;
    let (mut config, _temp_dir) = create_test_config(&server);
    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");
    ensure_index(&config, &embedder).await.expect("index builds");

    config
        .ollama
        .set_embedding_model("nomic-embed-text".to_string())
        .expect("valid model name");

    let result = RagPipeline::open(&config).await;
    assert!(matches!(
        result,
        Err(RagError::EmbeddingModelMismatch { .. })
    ));

    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");
    rebuild_index(&config, &embedder).await.expect("rebuild");
    let manifest = IndexManifest::load(&config.rag.persist_dir).expect("manifest");
    assert_eq!(manifest.embedding_model, "nomic-embed-text");
    assert!(RagPipeline::open(&config).await.is_ok());
}

#[tokio::test]
async fn query_without_index_fails() {
    let server = start_fake_ollama().await;
    let (config, _temp_dir) = create_test_config(&server);

    let result = RagPipeline::open(&config).await;
    assert!(matches!(result, Err(RagError::IndexMissing(_))));
}

#[tokio::test]
async fn unreachable_server_during_indexing() {
    let server = start_fake_ollama().await;
    let (mut config, _temp_dir) = create_test_config(&server);

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    config.ollama.port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");
    let result = ensure_index(&config, &embedder).await;

    assert!(matches!(result, Err(RagError::Embedding(_))));
    assert!(!config.rag.persist_dir.exists());
}

#[tokio::test]
async fn status_survives_an_unreadable_store() {
    let server = start_fake_ollama().await;
    let (config, _temp_dir) = create_test_config(&server);
    let embedder = OllamaEmbedder::from_config(&config.ollama).expect("embedder");
    ensure_index(&config, &embedder).await.expect("index builds");

    fs::remove_dir_all(config.rag.persist_dir.join("rules.lance")).expect("remove table");

    show_status(&config)
        .await
        .expect("status reports store errors instead of failing");
}
