//! Persistence codec for quiz notes.
//!
//! Questions are written into one of two plain-text dialects and read back
//! from either:
//!
//! - [`Dialect::Callout`]: nested `>` callout blocks
//! - [`Dialect::SpacedRepetition`]: flashcards with a bold kind label and
//!   `::` / `?` answer separators
//!
//! Matching questions are shuffled on every encode; decoding recovers the set
//! of pairs but not their original order.
//!
//! # Example
//!
//! ```ignore
//! use quizgen_core::codec::{Codec, Dialect};
//!
//! let codec = Codec::default();
//! let mut note = std::fs::read_to_string("Quiz.md")?;
//! codec.append_to(&mut note, &generated.quiz, Dialect::Callout);
//! let reviewed = codec.decode(&note);
//! ```

mod grammar;
mod layout;
mod letters;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::CodecConfig;
use crate::question::{InvalidQuestion, Question};
use grammar::{CALLOUT, Grammar, SPACED_REPETITION};
use layout::Layout;

/// Text encoding for persisted questions.
///
/// A callout question ends at its first unquoted line. A spaced-repetition
/// card ends at its first blank line, or after the header line when the
/// answer is inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Callout,
    SpacedRepetition,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Callout, Dialect::SpacedRepetition];

    fn grammar(&self) -> &'static Grammar {
        match self {
            Dialect::Callout => &CALLOUT,
            Dialect::SpacedRepetition => &SPACED_REPETITION,
        }
    }

    /// The dialect whose header starts at `line`, if any.
    fn of_header(line: &str) -> Option<Dialect> {
        Dialect::ALL
            .into_iter()
            .find(|d| d.grammar().header(line).is_some())
    }
}

/// Why a question block could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("question has no answer")]
    MissingAnswer,

    #[error("expected True or False, got '{0}'")]
    NotBoolean(String),

    #[error("'{0}' does not name an option")]
    UnknownOption(String),

    #[error("malformed matching line '{0}'")]
    MalformedPair(String),

    #[error("unexpected number of option groups: {0}")]
    GroupCount(usize),

    #[error(transparent)]
    Invalid(#[from] InvalidQuestion),
}

/// Outcome of decoding one question block.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBlock {
    /// 1-based line number of the block's header.
    pub line: usize,
    pub dialect: Dialect,
    pub result: Result<Question, DecodeError>,
}

/// Encoder and decoder for both dialects.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode one question. Matching questions are shuffled with the thread
    /// RNG.
    pub fn encode(&self, question: &Question, dialect: Dialect) -> String {
        self.encode_with_rng(question, dialect, &mut rand::thread_rng())
    }

    /// Encode one question, shuffling matching pairs with `rng`.
    pub fn encode_with_rng<R: Rng + ?Sized>(
        &self,
        question: &Question,
        dialect: Dialect,
        rng: &mut R,
    ) -> String {
        let layout = Layout::from_question(question, &self.config.list_separator, rng);
        dialect.grammar().render(&layout, &self.config)
    }

    /// Encode several questions separated by blank lines.
    pub fn encode_quiz<'a>(
        &self,
        questions: impl IntoIterator<Item = &'a Question>,
        dialect: Dialect,
    ) -> String {
        let mut rng = rand::thread_rng();
        questions
            .into_iter()
            .map(|q| self.encode_with_rng(q, dialect, &mut rng))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Append encoded questions to a note, keeping a blank line before each.
    pub fn append_to<'a>(
        &self,
        buffer: &mut String,
        questions: impl IntoIterator<Item = &'a Question>,
        dialect: Dialect,
    ) {
        let mut rng = rand::thread_rng();
        for question in questions {
            if !buffer.is_empty() {
                while !buffer.ends_with("\n\n") {
                    buffer.push('\n');
                }
            }
            buffer.push_str(&self.encode_with_rng(question, dialect, &mut rng));
            buffer.push('\n');
        }
    }

    /// Decode every recognizable question in `text`, in order.
    ///
    /// Blocks that fail to decode are skipped with a warning; use
    /// [`decode_blocks`](Self::decode_blocks) to see why.
    pub fn decode(&self, text: &str) -> Vec<Question> {
        self.decode_blocks(text)
            .into_iter()
            .filter_map(|block| match block.result {
                Ok(question) => Some(question),
                Err(e) => {
                    warn!(line = block.line, dialect = ?block.dialect, error = %e, "skipping undecodable question");
                    None
                }
            })
            .collect()
    }

    /// Decode `text` block by block. A block starts at a header line of
    /// either dialect; see [`Dialect`] for where each dialect's blocks end.
    pub fn decode_blocks(&self, text: &str) -> Vec<DecodedBlock> {
        let lines: Vec<&str> = text.lines().collect();

        let mut blocks = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let parsed = Dialect::of_header(lines[i]).and_then(|dialect| {
                let (layout, len) = dialect.grammar().parse_block(&lines[i..], &self.config)?;
                Some((dialect, layout, len))
            });
            let Some((dialect, layout, len)) = parsed else {
                i += 1;
                continue;
            };
            blocks.push(DecodedBlock {
                line: i + 1,
                dialect,
                result: layout.into_question(&self.config.list_separator),
            });
            i += len;
        }
        blocks
    }
}
