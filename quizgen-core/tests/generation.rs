//! End-to-end generation and grading against scripted providers
//!
//! The providers here implement only the low-level `chat`/`embed` calls (or
//! override `score_similarity` outright), so the tests exercise the same
//! provided methods real adapters use.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quizgen_models::providers::{
    ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, ModelProvider, ModelSelection,
    StopReason, Usage,
};
use quizgen_models::{Capabilities, Error as ProviderError};

use quizgen_core::{
    Error, GenerationConfig, GenerationWarning, Generator, Grade, QuestionKind, QuizConfig,
    grade_open_answer,
};

/// Replies with a fixed body and records every request.
struct ScriptedProvider {
    reply: String,
    stop_reason: StopReason,
    selection: ModelSelection,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            stop_reason: StopReason::EndTurn,
            selection: ModelSelection::new("scripted"),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn truncated(mut self) -> Self {
        self.stop_reason = StopReason::MaxTokens;
        self
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::chat().with_json_mode()
    }

    fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    async fn chat(&self, request: ChatRequest) -> quizgen_models::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(ChatResponse {
            content: self.reply.clone(),
            stop_reason: self.stop_reason,
            usage: Usage::new(100, 50),
        })
    }
}

/// Always fails with the given error.
struct FailingProvider {
    selection: ModelSelection,
}

#[async_trait]
impl ModelProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::chat()
    }

    fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    async fn chat(&self, _request: ChatRequest) -> quizgen_models::Result<ChatResponse> {
        Err(ProviderError::Auth("invalid x-api-key".to_string()))
    }
}

/// Reports a fixed similarity for every pair.
struct FixedSimilarity {
    similarity: f32,
    selection: ModelSelection,
    calls: Mutex<Vec<(String, String)>>,
}

impl FixedSimilarity {
    fn new(similarity: f32) -> Self {
        Self {
            similarity,
            selection: ModelSelection::new("fixed").embedding_model("fixed-embed"),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModelProvider for FixedSimilarity {
    fn name(&self) -> &str {
        "fixed"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    async fn chat(&self, _request: ChatRequest) -> quizgen_models::Result<ChatResponse> {
        Err(ProviderError::ProviderApi("chat not scripted".to_string()))
    }

    async fn score_similarity(&self, a: &str, b: &str) -> quizgen_models::Result<f32> {
        self.calls
            .lock()
            .unwrap()
            .push((a.to_string(), b.to_string()));
        Ok(self.similarity)
    }
}

/// Embeds every text as the same vector.
struct ConstantEmbedder {
    selection: ModelSelection,
}

#[async_trait]
impl ModelProvider for ConstantEmbedder {
    fn name(&self) -> &str {
        "constant"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    async fn chat(&self, _request: ChatRequest) -> quizgen_models::Result<ChatResponse> {
        Err(ProviderError::ProviderApi("chat not scripted".to_string()))
    }

    async fn embed(&self, request: EmbedRequest) -> quizgen_models::Result<EmbedResponse> {
        Ok(EmbedResponse {
            embeddings: request.texts.iter().map(|_| vec![0.3, 0.4, 0.5]).collect(),
            usage: Usage::default(),
        })
    }
}

fn mc_only() -> GenerationConfig {
    GenerationConfig::none().with_count(QuestionKind::MultipleChoice, 2)
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generates_quiz_with_one_json_mode_request() {
    let reply = r#"{"questions": [
        {"kind": "multiple_choice", "question": "Capital of Australia?", "options": ["Sydney", "Canberra"], "answer": 1},
        {"kind": "multiple_choice", "question": "Largest planet?", "options": ["Jupiter", "Mars"], "answer": 0}
    ]}"#;
    let provider = Arc::new(ScriptedProvider::new(reply));
    let generator = Generator::new(provider.clone(), mc_only());

    let generated = generator
        .generate(&["Canberra is the capital.", "Jupiter is large."])
        .await
        .unwrap();

    assert_eq!(generated.quiz.len(), 2);
    assert!(generated.warnings.is_empty());
    assert_eq!(provider.request_count(), 1);

    let requests = provider.requests.lock().unwrap();
    let request = &requests[0];
    assert!(request.response_format.is_some());
    assert!(request.messages[1].content.contains("2 multiple choice questions"));
    assert!(request.messages[1].content.contains("Canberra is the capital."));
    assert!(!request.messages[0].content.contains("true_false"));
}

#[tokio::test]
async fn one_malformed_element_of_three_is_reported() {
    let reply = r#"{"questions": [
        {"question": "Water boils at 100C at sea level.", "answer": true},
        {"question": "Pick one", "options": ["a", "b"], "answer": 9},
        {"question": "Name the ___ of the cell.", "answer": ["powerhouse"]}
    ]}"#;
    let generator = Generator::new(
        Arc::new(ScriptedProvider::new(reply)),
        GenerationConfig::default(),
    );

    let generated = generator.generate(&["notes"]).await.unwrap();
    assert_eq!(generated.quiz.len(), 2);
    assert_eq!(
        generated
            .quiz
            .iter()
            .map(|q| q.kind())
            .collect::<Vec<_>>(),
        vec![QuestionKind::TrueFalse, QuestionKind::FillInTheBlank]
    );
    assert_eq!(generated.warnings.len(), 1);
    assert!(matches!(
        &generated.warnings[0],
        GenerationWarning::ElementMalformed { index: 1, reason } if reason.contains("out of range")
    ));
}

#[tokio::test]
async fn truncated_reply_keeps_parsed_questions_and_warns() {
    let reply = r#"{"questions": [{"question": "Explain osmosis.", "answer": "Water moves across a membrane."}, {"question": "Expl"#;
    let generator = Generator::new(
        Arc::new(ScriptedProvider::new(reply).truncated()),
        GenerationConfig::default(),
    );

    let generated = generator.generate(&["notes"]).await.unwrap();
    assert!(generated.is_truncated());
    assert_eq!(generated.quiz.len(), 1);
    assert_eq!(
        generated.quiz.questions()[0].kind(),
        QuestionKind::ShortOrLongAnswer
    );
}

#[tokio::test]
async fn empty_request_never_calls_provider() {
    let provider = Arc::new(ScriptedProvider::new("{}"));
    let generator = Generator::new(provider.clone(), GenerationConfig::none());

    let err = generator.generate(&["notes"]).await.unwrap_err();
    assert!(matches!(err, Error::EmptyRequest));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn reply_without_questions_is_malformed() {
    let generator = Generator::new(
        Arc::new(ScriptedProvider::new(r#"{"quiz": []}"#)),
        mc_only(),
    );
    let err = generator.generate(&["notes"]).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn provider_errors_propagate_unchanged() {
    let generator = Generator::new(
        Arc::new(FailingProvider {
            selection: ModelSelection::new("m"),
        }),
        mc_only(),
    );
    let err = generator.generate(&["notes"]).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::Auth(_))));
    assert_eq!(err.to_string(), "authentication failed: invalid x-api-key");
}

// ────────────────────────────────────────────────────────────────────────────
// Grading
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn grading_threshold_is_eighty_percent() {
    let grade = grade_open_answer("answer", "reference", &FixedSimilarity::new(0.8))
        .await
        .unwrap();
    assert!(grade.is_correct(), "{grade:?}");

    let grade = grade_open_answer("answer", "reference", &FixedSimilarity::new(0.79999))
        .await
        .unwrap();
    let Grade::Scored {
        percentage,
        correct,
    } = grade
    else {
        panic!("expected a score");
    };
    assert!(!correct);
    assert!((percentage - 79.999).abs() < 1e-3);
}

#[tokio::test]
async fn skip_bypasses_the_provider() {
    let provider = FixedSimilarity::new(1.0);
    let grade = grade_open_answer("  SKIP ", "reference", &provider)
        .await
        .unwrap();
    assert_eq!(grade, Grade::Skipped);
    assert!(provider.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn answers_are_trimmed_before_scoring() {
    let provider = FixedSimilarity::new(0.5);
    grade_open_answer("  mitochondria\n", " the powerhouse ", &provider)
        .await
        .unwrap();
    assert_eq!(
        provider.calls.lock().unwrap()[0],
        ("mitochondria".to_string(), "the powerhouse".to_string())
    );
}

#[tokio::test]
async fn identical_embeddings_grade_as_full_marks() {
    let provider = ConstantEmbedder {
        selection: ModelSelection::new("c").embedding_model("c-embed"),
    };
    let grade = grade_open_answer("a", "a", &provider).await.unwrap();
    let Grade::Scored { percentage, correct } = grade else {
        panic!("expected a score");
    };
    assert!(correct);
    assert!((percentage - 100.0).abs() < 1e-3);
}

#[tokio::test]
async fn grading_without_embeddings_is_unsupported() {
    let provider = ScriptedProvider::new("{}");
    let err = grade_open_answer("a", "b", &provider).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Provider(ProviderError::UnsupportedCapability {
            capability: "embeddings",
            ..
        })
    ));
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn config_file_loads_with_defaults_for_missing_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quizgen.toml");
    std::fs::write(
        &path,
        r#"
[generation]
multiple_choice = 2
true_false = 0

[provider]
provider = "openai"
base_url = "http://localhost:1234/v1"
max_tokens = 4000
"#,
    )
    .unwrap();

    let config = QuizConfig::load(&path).unwrap();
    assert_eq!(config.generation.multiple_choice, 2);
    assert_eq!(config.generation.true_false, 0);
    assert_eq!(config.generation.language, "English");
    assert_eq!(config.codec.inline_separator, "::");

    let provider = config.build_provider().unwrap();
    assert_eq!(provider.name(), "openai");
    assert_eq!(provider.selection().max_tokens, Some(4000));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = QuizConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
