//! Configuration loaded from TOML.
//!
//! ```toml
//! [generation]
//! multiple_choice = 3
//! matching = 0
//! language = "French"
//!
//! [provider]
//! provider = "openai"
//! generation_model = "gpt-4o"
//!
//! [codec]
//! list_separator = "; "
//! ```
//!
//! Every section and field is optional except `provider.provider` when a
//! `[provider]` table is present.

use std::path::Path;
use std::sync::Arc;

use quizgen_models::providers::ModelProvider;
use quizgen_models::{ProviderConfig, build_provider};
use serde::{Deserialize, Serialize};

use crate::question::QuestionKind;
use crate::{Error, Result};

/// Language used for answer content when none is configured.
pub const DEFAULT_LANGUAGE: &str = "English";

fn default_count() -> u32 {
    1
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// How many questions of each kind to request, and in which language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_count")]
    pub true_false: u32,
    #[serde(default = "default_count")]
    pub multiple_choice: u32,
    #[serde(default = "default_count")]
    pub select_all_that_apply: u32,
    #[serde(default = "default_count")]
    pub fill_in_the_blank: u32,
    #[serde(default = "default_count")]
    pub matching: u32,
    #[serde(default = "default_count")]
    pub short_or_long_answer: u32,
    /// Natural language for question and answer content.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            true_false: default_count(),
            multiple_choice: default_count(),
            select_all_that_apply: default_count(),
            fill_in_the_blank: default_count(),
            matching: default_count(),
            short_or_long_answer: default_count(),
            language: default_language(),
        }
    }
}

impl GenerationConfig {
    /// A config requesting nothing, for building up with [`with_count`](Self::with_count).
    pub fn none() -> Self {
        Self {
            true_false: 0,
            multiple_choice: 0,
            select_all_that_apply: 0,
            fill_in_the_blank: 0,
            matching: 0,
            short_or_long_answer: 0,
            language: default_language(),
        }
    }

    /// Set the count for one kind.
    pub fn with_count(mut self, kind: QuestionKind, count: u32) -> Self {
        *self.count_mut(kind) = count;
        self
    }

    /// Set the output language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Requested count for one kind.
    pub fn count(&self, kind: QuestionKind) -> u32 {
        match kind {
            QuestionKind::TrueFalse => self.true_false,
            QuestionKind::MultipleChoice => self.multiple_choice,
            QuestionKind::SelectAllThatApply => self.select_all_that_apply,
            QuestionKind::FillInTheBlank => self.fill_in_the_blank,
            QuestionKind::Matching => self.matching,
            QuestionKind::ShortOrLongAnswer => self.short_or_long_answer,
        }
    }

    fn count_mut(&mut self, kind: QuestionKind) -> &mut u32 {
        match kind {
            QuestionKind::TrueFalse => &mut self.true_false,
            QuestionKind::MultipleChoice => &mut self.multiple_choice,
            QuestionKind::SelectAllThatApply => &mut self.select_all_that_apply,
            QuestionKind::FillInTheBlank => &mut self.fill_in_the_blank,
            QuestionKind::Matching => &mut self.matching,
            QuestionKind::ShortOrLongAnswer => &mut self.short_or_long_answer,
        }
    }

    /// Kinds with a non-zero count, with their counts, in prompt order.
    pub fn requested(&self) -> Vec<(QuestionKind, u32)> {
        QuestionKind::ALL
            .into_iter()
            .map(|kind| (kind, self.count(kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Total number of questions requested.
    pub fn total(&self) -> u32 {
        QuestionKind::ALL.into_iter().map(|k| self.count(k)).sum()
    }
}

/// Separators used by the persistence codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Separates stem and answer on one line (spaced-repetition dialect).
    pub inline_separator: String,
    /// Own-line separator before multi-line answers (spaced-repetition dialect).
    pub multiline_separator: String,
    /// Joins fill-in-the-blank answers.
    pub list_separator: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            inline_separator: "::".to_string(),
            multiline_separator: "?".to_string(),
            list_separator: ", ".to_string(),
        }
    }
}

/// Complete quizgen configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub codec: CodecConfig,
}

impl QuizConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: QuizConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the codec cannot work with.
    pub fn validate(&self) -> Result<()> {
        let codec = &self.codec;
        for (name, value) in [
            ("inline_separator", &codec.inline_separator),
            ("multiline_separator", &codec.multiline_separator),
            ("list_separator", &codec.list_separator),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("codec.{name} must not be blank")));
            }
        }
        if codec.multiline_separator.contains('\n') {
            return Err(Error::Config(
                "codec.multiline_separator must be a single line".into(),
            ));
        }
        Ok(())
    }

    /// Build the adapter named by the `[provider]` section.
    pub fn build_provider(&self) -> Result<Arc<dyn ModelProvider>> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::Config("missing [provider] section".into()))?;
        Ok(build_provider(provider)?)
    }
}
