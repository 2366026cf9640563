//! Generation orchestrator.
//!
//! [`Generator`] builds the prompts for its [`GenerationConfig`], sends one
//! request through the configured adapter, and decodes the returned text into
//! a [`Quiz`]. Problems with individual elements and output truncation are
//! reported as [`GenerationWarning`]s next to the questions that did parse.
//!
//! # Example
//!
//! ```ignore
//! use quizgen_core::{GenerationConfig, Generator, QuizConfig};
//!
//! let config = QuizConfig::load("quizgen.toml")?;
//! let generator = Generator::new(config.build_provider()?, config.generation);
//! let generated = generator.generate(&["Photosynthesis converts light..."]).await?;
//! for warning in &generated.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

mod parse;

use std::fmt;
use std::sync::Arc;

use quizgen_models::providers::{Generation, ModelProvider};
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::prompt::build_prompt;
use crate::question::Quiz;
use crate::{Error, Result};

/// A non-fatal problem found while generating a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationWarning {
    /// The provider stopped at its output limit; the quiz may be incomplete.
    Truncated,
    /// One element of the `questions` array could not be used.
    ElementMalformed { index: usize, reason: String },
    /// A kept question holds control characters, usually a LaTeX command
    /// such as `\theta` whose backslash was read as a JSON escape.
    ControlCharacters { index: usize },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationWarning::Truncated => {
                f.write_str("response was cut off at the output token limit")
            }
            GenerationWarning::ElementMalformed { index, reason } => {
                write!(f, "question {index} skipped: {reason}")
            }
            GenerationWarning::ControlCharacters { index } => write!(
                f,
                "question {index} contains control characters; check for unescaped LaTeX"
            ),
        }
    }
}

/// Parsed questions plus any warnings raised along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuiz {
    pub quiz: Quiz,
    pub warnings: Vec<GenerationWarning>,
}

impl GeneratedQuiz {
    /// Whether the provider output was truncated.
    pub fn is_truncated(&self) -> bool {
        self.warnings.contains(&GenerationWarning::Truncated)
    }
}

/// Turns source material into a quiz through one adapter.
pub struct Generator {
    provider: Arc<dyn ModelProvider>,
    config: GenerationConfig,
}

impl Generator {
    pub fn new(provider: Arc<dyn ModelProvider>, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Generate a quiz from cleaned source text blocks.
    ///
    /// Sends exactly one request and never retries. Adapter errors propagate
    /// unchanged as [`Error::Provider`].
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyRequest`] when the config requests no questions
    /// - [`Error::Provider`] when the adapter call fails
    /// - [`Error::MalformedResponse`] when no question could be parsed
    pub async fn generate(&self, sources: &[impl AsRef<str>]) -> Result<GeneratedQuiz> {
        if self.config.total() == 0 {
            return Err(Error::EmptyRequest);
        }

        let prompt = build_prompt(&self.config, sources);
        debug!(
            provider = self.provider.name(),
            requested = self.config.total(),
            sources = sources.len(),
            "generating quiz"
        );

        let generation = self.provider.generate_quiz(&prompt).await?;
        let generated = parse_generation(&generation)?;

        info!(
            provider = self.provider.name(),
            questions = generated.quiz.len(),
            warnings = generated.warnings.len(),
            "quiz generated"
        );
        Ok(generated)
    }
}

/// Decode provider output into a quiz.
///
/// Malformed elements are skipped and reported; a truncated response is
/// salvaged up to its last complete element.
pub fn parse_generation(generation: &Generation) -> Result<GeneratedQuiz> {
    let text = parse::unwrap_fence(&generation.text);
    let mut warnings = Vec::new();
    if generation.truncated {
        warnings.push(GenerationWarning::Truncated);
    }

    let elements = match parse::parse_envelope(text) {
        Ok(elements) => elements,
        Err(reason) if generation.truncated => parse::salvage_truncated(text).ok_or_else(|| {
            Error::MalformedResponse(format!("{reason} (response was truncated)"))
        })?,
        Err(reason) => return Err(Error::MalformedResponse(reason)),
    };

    let mut questions = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        match parse::decode_element(element) {
            Ok(question) => {
                if parse::has_control_characters(element) {
                    warn!(index, "question contains control characters");
                    warnings.push(GenerationWarning::ControlCharacters { index });
                }
                questions.push(question);
            }
            Err(reason) => {
                warn!(index, %reason, "skipping malformed question");
                warnings.push(GenerationWarning::ElementMalformed { index, reason });
            }
        }
    }

    if questions.is_empty() {
        return Err(Error::MalformedResponse(format!(
            "no usable questions in {} elements",
            elements.len()
        )));
    }

    Ok(GeneratedQuiz {
        quiz: Quiz::new(questions),
        warnings,
    })
}
