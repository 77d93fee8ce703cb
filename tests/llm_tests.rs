//! LLM client tests against a mocked HTTP backend.

use playground::llm::client::Provider;
use playground::llm::ModelParams;
use playground::types::{AppError, GenerationFailureReason};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai(server: &MockServer) -> Provider {
    Provider::OpenAI {
        api_key: "test-key".to_string(),
        api_base: format!("{}/v1", server.uri()),
        model: "gpt-4".to_string(),
    }
}

fn ollama(server: &MockServer) -> Provider {
    Provider::Ollama {
        base_url: server.uri(),
        model: "llama3.2".to_string(),
    }
}

fn assert_reason(err: AppError, expected: GenerationFailureReason) {
    match err {
        AppError::GenerationFailure { reason, .. } => assert_eq!(reason, expected),
        other => panic!("expected generation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_generate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "temperature": 0.5,
            "top_p": 0.25,
            "messages": [{ "role": "user", "content": "What is 2+2?" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "4" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = openai(&server)
        .create_client(Duration::from_secs(5))
        .unwrap();
    let answer = client
        .generate("What is 2+2?", &ModelParams::new(0.5, 0.25))
        .await
        .unwrap();

    assert_eq!(answer, "4");
    assert_eq!(client.model_name(), "gpt-4");
}

#[tokio::test]
async fn test_openai_system_message_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "Be terse." },
                { "role": "user", "content": "Hi" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "Hello." } }]
        })))
        .mount(&server)
        .await;

    let client = openai(&server)
        .create_client(Duration::from_secs(5))
        .unwrap();
    let answer = client
        .generate_with_system(Some("Be terse."), "Hi", &ModelParams::default())
        .await
        .unwrap();
    assert_eq!(answer, "Hello.");
}

#[tokio::test]
async fn test_openai_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = openai(&server)
        .create_client(Duration::from_secs(5))
        .unwrap();
    let err = client
        .generate("q", &ModelParams::default())
        .await
        .unwrap_err();
    assert_reason(err, GenerationFailureReason::RateLimited);
}

#[tokio::test]
async fn test_openai_server_error_is_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = openai(&server)
        .create_client(Duration::from_secs(5))
        .unwrap();
    let err = client
        .generate("q", &ModelParams::default())
        .await
        .unwrap_err();
    assert_reason(err, GenerationFailureReason::Upstream);
}

#[tokio::test]
async fn test_openai_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = openai(&server)
        .create_client(Duration::from_secs(5))
        .unwrap();
    let err = client
        .generate("q", &ModelParams::default())
        .await
        .unwrap_err();
    assert_reason(err, GenerationFailureReason::MalformedResponse);
}

#[tokio::test]
async fn test_ollama_generate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "stream": false,
            "options": { "temperature": 0.0, "top_p": 1.0 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "message": { "role": "assistant", "content": "Paris" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ollama(&server)
        .create_client(Duration::from_secs(5))
        .unwrap();
    let answer = client
        .generate("Capital of France?", &ModelParams::default())
        .await
        .unwrap();
    assert_eq!(answer, "Paris");
}

#[tokio::test]
async fn test_ollama_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = ollama(&server)
        .create_client(Duration::from_secs(5))
        .unwrap();
    let err = client
        .generate("q", &ModelParams::default())
        .await
        .unwrap_err();
    assert_reason(err, GenerationFailureReason::MalformedResponse);
}

#[tokio::test]
async fn test_unreachable_backend_is_upstream() {
    // Nothing listens on port 9 on loopback.
    let provider = Provider::Ollama {
        base_url: "http://127.0.0.1:9".to_string(),
        model: "llama3.2".to_string(),
    };
    let client = provider.create_client(Duration::from_secs(2)).unwrap();

    let err = client
        .generate("q", &ModelParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GenerationFailure { .. }));
}
