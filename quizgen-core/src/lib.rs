//! quizgen-core: quiz generation, grading, and note persistence
//!
//! This crate turns cleaned source text into a structured quiz and back into
//! plain-text notes:
//!
//! - **Question model** - [`Question`], its six variants, and [`Quiz`]
//! - **Prompt builder** - [`prompt::build_prompt`] for a [`GenerationConfig`]
//! - **Generation** - [`Generator`] drives one adapter request and parses the
//!   reply into a [`GeneratedQuiz`]
//! - **Grading** - [`grading::grade_open_answer`] scores free-text answers by
//!   embedding similarity
//! - **Persistence** - [`Codec`] encodes questions as callout or
//!   spaced-repetition notes and decodes them again
//! - **Configuration** - [`QuizConfig`] loaded from TOML
//!
//! Provider adapters live in [`quizgen_models`].
//!
//! # Quick Start
//!
//! ```ignore
//! use quizgen_core::{Codec, Dialect, Generator, QuizConfig};
//!
//! async fn example() -> quizgen_core::Result<()> {
//!     let config = QuizConfig::load("quizgen.toml")?;
//!     let generator = Generator::new(config.build_provider()?, config.generation.clone());
//!
//!     let generated = generator.generate(&["The mitochondria is..."]).await?;
//!     let codec = Codec::new(config.codec.clone());
//!     let mut note = String::new();
//!     codec.append_to(&mut note, generated.quiz.iter(), Dialect::Callout);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   QuizPrompt   ┌─────────────────┐
//! │ prompt       │ ─────────────▶ │ ModelProvider   │
//! └──────────────┘                │ (quizgen-models)│
//!        ▲                        └────────┬────────┘
//!        │ GenerationConfig                │ Generation
//! ┌──────┴───────┐                         ▼
//! │ Generator    │ ◀──────────── parse into Quiz
//! └──────┬───────┘
//!        │ Question
//!        ▼
//! ┌──────────────┐  Layout  ┌────────────────────────────┐
//! │ Codec        │ ───────▶ │ Callout / SpacedRepetition │
//! └──────────────┘          └────────────────────────────┘
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod generate;
pub mod grading;
pub mod prompt;
pub mod question;

// Re-export key types for convenience
pub use codec::{Codec, DecodeError, DecodedBlock, Dialect};
pub use config::{CodecConfig, GenerationConfig, QuizConfig};
pub use error::{Error, Result};
pub use generate::{GeneratedQuiz, GenerationWarning, Generator, parse_generation};
pub use grading::{CORRECT_THRESHOLD, Grade, Response, grade_choice, grade_open_answer};
pub use question::{
    FillInTheBlank, InvalidQuestion, MatchPair, Matching, MultipleChoice, Question, QuestionKind,
    Quiz, SelectAllThatApply, ShortOrLongAnswer, TrueFalse,
};
