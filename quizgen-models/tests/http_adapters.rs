//! Adapter tests against fake provider endpoints
//!
//! Each test stands up a small axum app on an ephemeral port that mimics the
//! wire format of one backend, then drives the adapter through the uniform
//! `ModelProvider` contract.

use std::net::SocketAddr;

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, response::IntoResponse};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use quizgen_models::Error;
use quizgen_models::auth::ApiKey;
use quizgen_models::providers::{
    AnthropicProvider, ModelProvider, ModelSelection, OllamaProvider, OpenAiProvider, QuizPrompt,
};

/// Spawns the app in a background task, returns bound address
async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

fn prompt() -> QuizPrompt {
    QuizPrompt::new("Return a JSON object.", "Material: the sky is blue.")
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible
// ────────────────────────────────────────────────────────────────────────────

async fn openai_chat(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer sk-test");
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Incorrect API key provided"}})),
        );
    }

    let json_mode = body["response_format"]["type"] == "json_object";
    let finish = if body["max_tokens"] == 5 { "length" } else { "stop" };
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": format!("{{\"json_mode\": {json_mode}}}")
                },
                "finish_reason": finish
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        })),
    )
}

async fn openai_embeddings(Json(body): Json<Value>) -> impl IntoResponse {
    assert_eq!(body["model"], "text-embedding-3-small");
    assert_eq!(body["input"].as_array().map(Vec::len), Some(2));
    Json(json!({
        "data": [
            {"index": 0, "embedding": [3.0, 4.0]},
            {"index": 1, "embedding": [3.0, 4.0]}
        ],
        "usage": {"prompt_tokens": 2, "total_tokens": 2}
    }))
}

fn openai_app() -> Router {
    Router::new()
        .route("/v1/chat/completions", post(openai_chat))
        .route("/v1/embeddings", post(openai_embeddings))
}

#[tokio::test]
async fn openai_generate_quiz_sends_json_mode_and_bearer_token() {
    let addr = spawn_app(openai_app()).await;
    let provider = OpenAiProvider::new(ModelSelection::new("gpt-4o-mini"))
        .with_base_url(format!("http://{addr}/v1"))
        .with_api_key(ApiKey::new("sk-test"));

    let generation = provider.generate_quiz(&prompt()).await.unwrap();
    assert_eq!(generation.text, "{\"json_mode\": true}");
    assert!(!generation.truncated);
}

#[tokio::test]
async fn openai_length_finish_is_reported_as_truncation() {
    let addr = spawn_app(openai_app()).await;
    let provider = OpenAiProvider::new(ModelSelection::new("gpt-4o-mini").max_tokens(5))
        .with_base_url(format!("http://{addr}/v1"))
        .with_api_key(ApiKey::new("sk-test"));

    let generation = provider.generate_quiz(&prompt()).await.unwrap();
    assert!(generation.truncated);
}

#[tokio::test]
async fn openai_bad_key_is_auth_error() {
    let addr = spawn_app(openai_app()).await;
    let provider = OpenAiProvider::new(ModelSelection::new("gpt-4o-mini"))
        .with_base_url(format!("http://{addr}/v1"))
        .with_api_key(ApiKey::new("sk-wrong"));

    let err = provider.generate_quiz(&prompt()).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "got {err:?}");
    assert!(err.to_string().contains("Incorrect API key"));
}

#[tokio::test]
async fn openai_score_similarity_embeds_both_strings() {
    let addr = spawn_app(openai_app()).await;
    let provider = OpenAiProvider::new(
        ModelSelection::new("gpt-4o-mini").embedding_model("text-embedding-3-small"),
    )
    .with_base_url(format!("http://{addr}/v1"));

    let score = provider
        .score_similarity("photosynthesis", "plants make sugar from light")
        .await
        .unwrap();
    assert!((score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn throttled_backend_is_rate_limit_error() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"message": "slow down"}})),
            )
        }),
    );
    let addr = spawn_app(app).await;
    let provider = OpenAiProvider::new(ModelSelection::new("gpt-4o-mini"))
        .with_base_url(format!("http://{addr}/v1"));

    let err = provider.generate_quiz(&prompt()).await.unwrap_err();
    assert!(matches!(err, Error::RateLimited(_)), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    // Bind then drop so the port is very likely closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = OpenAiProvider::new(ModelSelection::new("gpt-4o-mini"))
        .with_base_url(format!("http://{addr}/v1"));

    let err = provider.generate_quiz(&prompt()).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn partial_embedding_response_is_an_error() {
    let app = Router::new().route(
        "/v1/embeddings",
        post(|| async { Json(json!({"data": [{"index": 0, "embedding": [1.0, 0.0]}]})) }),
    );
    let addr = spawn_app(app).await;
    let provider =
        OpenAiProvider::new(ModelSelection::new("gpt-4o-mini").embedding_model("e"))
            .with_base_url(format!("http://{addr}/v1"));

    let err = provider.score_similarity("a", "b").await.unwrap_err();
    assert!(matches!(err, Error::InvalidEmbedding(_)), "got {err:?}");
}

#[tokio::test]
async fn unparseable_success_body_is_serialization_error() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::OK, "<html>gateway page</html>") }),
    );
    let addr = spawn_app(app).await;
    let provider = OpenAiProvider::new(ModelSelection::new("gpt-4o-mini"))
        .with_base_url(format!("http://{addr}/v1"));

    let err = provider.generate_quiz(&prompt()).await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)), "got {err:?}");
    assert!(!err.is_retryable());
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn anthropic_sends_key_header_and_system_field() {
    let app = Router::new().route(
        "/v1/messages",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["x-api-key"], "sk-ant-test");
            assert_eq!(headers["anthropic-version"], "2023-06-01");
            assert_eq!(body["system"], "Return a JSON object.");
            Json(json!({
                "content": [{"type": "text", "text": "{\"questions\": []}"}],
                "stop_reason": "max_tokens",
                "usage": {"input_tokens": 9, "output_tokens": 4096}
            }))
        }),
    );
    let addr = spawn_app(app).await;
    let provider = AnthropicProvider::new(
        ApiKey::new("sk-ant-test"),
        ModelSelection::new("claude-3-5-haiku-latest"),
    )
    .with_base_url(format!("http://{addr}"));

    let generation = provider.generate_quiz(&prompt()).await.unwrap();
    assert_eq!(generation.text, "{\"questions\": []}");
    assert!(generation.truncated);
}

// ────────────────────────────────────────────────────────────────────────────
// Ollama
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ollama_chat_and_embed_round_trip() {
    let app = Router::new()
        .route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["format"], "json");
                assert_eq!(body["stream"], false);
                Json(json!({
                    "model": "llama3",
                    "message": {"role": "assistant", "content": "{\"questions\": []}"},
                    "done": true,
                    "done_reason": "stop"
                }))
            }),
        )
        .route(
            "/api/embed",
            post(|| async {
                Json(json!({
                    "model": "nomic-embed-text",
                    "embeddings": [[1.0, 0.0], [0.0, 1.0]]
                }))
            }),
        );
    let addr = spawn_app(app).await;
    let provider = OllamaProvider::new(
        ModelSelection::new("llama3").embedding_model("nomic-embed-text"),
    )
    .with_base_url(format!("http://{addr}"));

    let generation = provider.generate_quiz(&prompt()).await.unwrap();
    assert_eq!(generation.text, "{\"questions\": []}");
    assert!(!generation.truncated);

    let score = provider.score_similarity("left", "right").await.unwrap();
    assert!(score.abs() < 1e-6);
}
