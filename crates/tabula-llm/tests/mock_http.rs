//! Mock HTTP server tests for every backend client.
//!
//! Uses [`wiremock`] to stand up a local server that emulates each native
//! API, exercising the full request/response path without a real backend.
//!
//! Coverage:
//! - Successful completion per backend, with request-shape assertions
//! - 401/403 authentication failure
//! - 429 rate limiting (retry hint extraction, quota exhaustion)
//! - 404 model not found
//! - 500 internal server error
//! - Malformed JSON response
//! - Empty responses
//! - Ollama connectivity probe

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tabula_llm::config::builtin_config;
use tabula_llm::{
    ChatMessage, ChatRequest, ModelConfig, ProviderError, ProviderKind, build_provider,
};

fn mock_config(kind: ProviderKind, server_url: &str) -> ModelConfig {
    let mut cfg = builtin_config(kind);
    cfg.base_url = Some(server_url.into());
    if kind.requires_api_key() {
        cfg.api_key = Some("sk-mock-key".into());
    }
    cfg
}

fn user_request(cfg: &ModelConfig, text: &str) -> ChatRequest {
    ChatRequest::from_config(cfg, vec![ChatMessage::user(text)])
}

fn openai_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test-001",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo-0125",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18 }
    })
}

// ── OpenAI ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn openai_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-mock-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 2048,
            "messages": [
                { "role": "system", "content": "You are a helpful AI assistant." },
                { "role": "user", "content": "Hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("Hi there!")))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::OpenAi, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    provider.initialize().await.unwrap();

    let req = ChatRequest::from_config(
        &cfg,
        vec![
            ChatMessage::system("You are a helpful AI assistant."),
            ChatMessage::user("Hello"),
        ],
    );
    let completion = provider.complete(&req).await.unwrap();

    assert_eq!(completion.text, "Hi there!");
    assert_eq!(completion.model, "gpt-3.5-turbo-0125");
    let usage = completion.usage.unwrap();
    assert_eq!(usage.input_tokens, 10);
    assert_eq!(usage.output_tokens, 8);
}

#[tokio::test]
async fn openai_empty_choices_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::OpenAi, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider
        .complete(&user_request(&cfg, "Hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResponse(ref p) if p == "openai"));
}

// ── Anthropic ──────────────────────────────────────────────────────────

#[tokio::test]
async fn anthropic_success() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-sonnet-20240229",
        "content": [
            { "type": "text", "text": "Revenue rose " },
            { "type": "text", "text": "12% in Q3." }
        ],
        "usage": { "input_tokens": 20, "output_tokens": 6 }
    });

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-mock-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-3-sonnet-20240229",
            "max_tokens": 2048,
            "messages": [{ "role": "user", "content": "How did revenue change?" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Anthropic, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let completion = provider
        .complete(&user_request(&cfg, "How did revenue change?"))
        .await
        .unwrap();

    assert_eq!(completion.text, "Revenue rose 12% in Q3.");
    assert_eq!(completion.usage.unwrap().output_tokens, 6);
}

#[tokio::test]
async fn anthropic_403_is_auth_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "type": "error",
            "error": { "type": "permission_error", "message": "key disabled" }
        })))
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Anthropic, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "hi")).await.unwrap_err();
    assert!(matches!(err, ProviderError::AuthFailed(ref m) if m == "key disabled"));
}

// ── Gemini ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn gemini_success() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": "The median is 42." }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 5, "candidatesTokenCount": 4 }
    });

    Mock::given(method("POST"))
        .and(path("/models/gemini-pro:generateContent"))
        .and(header("x-goog-api-key", "sk-mock-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": "median?" }] }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 2048 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Gemini, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let completion = provider.complete(&user_request(&cfg, "median?")).await.unwrap();

    assert_eq!(completion.text, "The median is 42.");
    assert_eq!(completion.model, "gemini-pro");
    assert_eq!(completion.usage.unwrap().input_tokens, 5);
}

#[tokio::test]
async fn gemini_no_candidates_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-pro:generateContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
        )
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Gemini, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResponse(_)));
}

// ── Ollama ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn ollama_probe_and_generate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "models": [{ "name": "llama2:latest" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama2",
            "prompt": "count the rows",
            "stream": false,
            "options": { "temperature": 0.7, "num_predict": 2048 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama2",
            "response": "There are 120 rows.",
            "done": true,
            "prompt_eval_count": 11,
            "eval_count": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Ollama, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    provider.initialize().await.unwrap();
    let completion = provider
        .complete(&user_request(&cfg, "count the rows"))
        .await
        .unwrap();

    assert_eq!(completion.text, "There are 120 rows.");
    assert_eq!(completion.usage.unwrap().output_tokens, 7);
}

#[tokio::test]
async fn ollama_probe_non_200_is_unreachable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Ollama, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.initialize().await.unwrap_err();
    match err {
        ProviderError::Unreachable { endpoint, reason } => {
            assert_eq!(endpoint, server.uri());
            assert!(reason.contains("503"), "reason: {reason}");
        }
        other => panic!("expected Unreachable, got: {other}"),
    }
}

#[tokio::test]
async fn ollama_error_body_is_extracted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "error": "model 'llama2' not found" })),
        )
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Ollama, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    match err {
        ProviderError::ModelNotFound(msg) => {
            assert!(msg.contains("llama2"));
            assert!(msg.contains("not found"));
        }
        other => panic!("expected ModelNotFound, got: {other}"),
    }
}

// ── Shared status mapping ──────────────────────────────────────────────

#[tokio::test]
async fn status_401_is_auth_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Invalid API key", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::OpenAi, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    assert!(matches!(err, ProviderError::AuthFailed(ref m) if m == "Invalid API key"));
}

#[tokio::test]
async fn status_429_uses_retry_after_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "2")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Anthropic, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::RateLimited {
            retry_after_ms: 2000
        }
    ));
}

#[tokio::test]
async fn status_429_uses_body_hint_then_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(serde_json::json!({ "retry_after_ms": 750 })),
        )
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::OpenAi, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::RateLimited {
            retry_after_ms: 750
        }
    ));
}

#[tokio::test]
async fn status_429_quota_exhausted_is_request_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "message": "You exceeded your current quota", "code": "insufficient_quota" }
        })))
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::OpenAi, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::RequestFailed(ref m) if m.contains("quota")),
        "got: {err}"
    );
}

#[tokio::test]
async fn status_404_is_model_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-ultra-9:generateContent"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": 404, "message": "models/gemini-ultra-9 is not found" }
        })))
        .mount(&server)
        .await;

    let mut cfg = mock_config(ProviderKind::Gemini, &server.uri());
    cfg.model_name = "gemini-ultra-9".into();
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    match err {
        ProviderError::ModelNotFound(msg) => assert!(msg.starts_with("model 'gemini-ultra-9'")),
        other => panic!("expected ModelNotFound, got: {other}"),
    }
}

#[tokio::test]
async fn status_500_is_request_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::OpenAi, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    match err {
        ProviderError::RequestFailed(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("Internal Server Error"));
        }
        other => panic!("expected RequestFailed, got: {other}"),
    }
}

#[tokio::test]
async fn malformed_json_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&server)
        .await;

    let cfg = mock_config(ProviderKind::Anthropic, &server.uri());
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    match err {
        ProviderError::InvalidResponse(msg) => {
            assert!(msg.starts_with("failed to parse response"))
        }
        other => panic!("expected InvalidResponse, got: {other}"),
    }
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_body("late"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut cfg = mock_config(ProviderKind::OpenAi, &server.uri());
    cfg.timeout_secs = Some(1);
    let provider = build_provider(&cfg).unwrap();
    let err = provider.complete(&user_request(&cfg, "x")).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout), "got: {err}");
}
