//! Question model: six closed variants and the quiz container.
//!
//! Every variant serializes with an explicit `"kind"` discriminant next to its
//! `question`/`options`/`answer` fields:
//!
//! ```json
//! {"kind": "multiple_choice", "question": "Capital of Australia?",
//!  "options": ["Sydney", "Canberra"], "answer": 1}
//! ```
//!
//! [`Question::validate`] enforces the per-variant invariants; constructing a
//! value directly does not.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Matches one blank marker: three or more underscores, optionally in backticks.
const BLANK_PATTERN: &str = r"`?_{3,}`?";

fn blank_regex() -> Option<&'static Regex> {
    static BLANK: OnceLock<Option<Regex>> = OnceLock::new();
    BLANK.get_or_init(|| Regex::new(BLANK_PATTERN).ok()).as_ref()
}

/// Number of blank markers in a fill-in-the-blank stem.
pub fn blank_count(text: &str) -> usize {
    blank_regex().map_or(0, |re| re.find_iter(text).count())
}

/// Whether `text` contains at least one blank marker.
pub fn has_blank(text: &str) -> bool {
    blank_regex().is_some_and(|re| re.is_match(text))
}

// ────────────────────────────────────────────────────────────────────────────
// Variants
// ────────────────────────────────────────────────────────────────────────────

/// A statement the learner marks true or false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueFalse {
    pub question: String,
    pub answer: bool,
}

/// One correct option out of several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoice {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub answer: usize,
}

/// Any number of correct options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectAllThatApply {
    pub question: String,
    pub options: Vec<String>,
    /// Indices into `options`, unique.
    pub answer: Vec<usize>,
}

/// A stem with blank markers, answered left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillInTheBlank {
    pub question: String,
    /// One entry per blank marker, in order.
    pub answer: Vec<String>,
}

/// Pairs the learner reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching {
    pub question: String,
    pub answer: Vec<MatchPair>,
}

/// One left-to-right association in a [`Matching`] question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPair {
    pub left_option: String,
    pub right_option: String,
}

impl MatchPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left_option: left.into(),
            right_option: right.into(),
        }
    }
}

/// Open-ended question graded by semantic similarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortOrLongAnswer {
    pub question: String,
    pub answer: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Question
// ────────────────────────────────────────────────────────────────────────────

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Question {
    TrueFalse(TrueFalse),
    MultipleChoice(MultipleChoice),
    SelectAllThatApply(SelectAllThatApply),
    FillInTheBlank(FillInTheBlank),
    Matching(Matching),
    ShortOrLongAnswer(ShortOrLongAnswer),
}

impl Question {
    /// The variant discriminant.
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::TrueFalse(_) => QuestionKind::TrueFalse,
            Question::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Question::SelectAllThatApply(_) => QuestionKind::SelectAllThatApply,
            Question::FillInTheBlank(_) => QuestionKind::FillInTheBlank,
            Question::Matching(_) => QuestionKind::Matching,
            Question::ShortOrLongAnswer(_) => QuestionKind::ShortOrLongAnswer,
        }
    }

    /// The question stem.
    pub fn stem(&self) -> &str {
        match self {
            Question::TrueFalse(q) => &q.question,
            Question::MultipleChoice(q) => &q.question,
            Question::SelectAllThatApply(q) => &q.question,
            Question::FillInTheBlank(q) => &q.question,
            Question::Matching(q) => &q.question,
            Question::ShortOrLongAnswer(q) => &q.question,
        }
    }

    /// Check the variant's invariants.
    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.stem().trim().is_empty() {
            return Err(InvalidQuestion::EmptyQuestion);
        }
        match self {
            Question::TrueFalse(_) => Ok(()),
            Question::MultipleChoice(q) => {
                check_options(&q.options)?;
                check_index(q.answer, q.options.len())
            }
            Question::SelectAllThatApply(q) => {
                check_options(&q.options)?;
                if q.answer.is_empty() {
                    return Err(InvalidQuestion::EmptyAnswer);
                }
                let mut seen = HashSet::new();
                for &index in &q.answer {
                    check_index(index, q.options.len())?;
                    if !seen.insert(index) {
                        return Err(InvalidQuestion::DuplicateAnswer(index));
                    }
                }
                Ok(())
            }
            Question::FillInTheBlank(q) => {
                let blanks = blank_count(&q.question);
                if blanks == 0 {
                    return Err(InvalidQuestion::EmptyAnswer);
                }
                if blanks != q.answer.len() {
                    return Err(InvalidQuestion::BlankCountMismatch {
                        blanks,
                        answers: q.answer.len(),
                    });
                }
                Ok(())
            }
            Question::Matching(q) => {
                if q.answer.is_empty() {
                    return Err(InvalidQuestion::EmptyAnswer);
                }
                let mut lefts = HashSet::new();
                let mut rights = HashSet::new();
                for pair in &q.answer {
                    if !lefts.insert(pair.left_option.as_str()) {
                        return Err(InvalidQuestion::DuplicateMatch(pair.left_option.clone()));
                    }
                    if !rights.insert(pair.right_option.as_str()) {
                        return Err(InvalidQuestion::DuplicateMatch(pair.right_option.clone()));
                    }
                }
                Ok(())
            }
            Question::ShortOrLongAnswer(q) => {
                if q.answer.trim().is_empty() {
                    Err(InvalidQuestion::EmptyAnswer)
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn check_options(options: &[String]) -> Result<(), InvalidQuestion> {
    if options.len() < 2 {
        Err(InvalidQuestion::TooFewOptions(options.len()))
    } else {
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<(), InvalidQuestion> {
    if index < len {
        Ok(())
    } else {
        Err(InvalidQuestion::AnswerOutOfRange { index, len })
    }
}

/// A broken question invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    #[error("question text is empty")]
    EmptyQuestion,

    #[error("expected at least 2 options, got {0}")]
    TooFewOptions(usize),

    #[error("answer index {index} is out of range for {len} options")]
    AnswerOutOfRange { index: usize, len: usize },

    #[error("answer index {0} is listed more than once")]
    DuplicateAnswer(usize),

    #[error("'{0}' appears in more than one pair")]
    DuplicateMatch(String),

    #[error("{blanks} blanks but {answers} answers")]
    BlankCountMismatch { blanks: usize, answers: usize },

    #[error("answer is empty")]
    EmptyAnswer,
}

// ────────────────────────────────────────────────────────────────────────────
// QuestionKind
// ────────────────────────────────────────────────────────────────────────────

/// Fieldless discriminant of [`Question`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    TrueFalse,
    MultipleChoice,
    SelectAllThatApply,
    FillInTheBlank,
    Matching,
    ShortOrLongAnswer,
}

impl QuestionKind {
    /// Every kind, in prompt order.
    pub const ALL: [QuestionKind; 6] = [
        QuestionKind::TrueFalse,
        QuestionKind::MultipleChoice,
        QuestionKind::SelectAllThatApply,
        QuestionKind::FillInTheBlank,
        QuestionKind::Matching,
        QuestionKind::ShortOrLongAnswer,
    ];

    /// The serialized `"kind"` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::SelectAllThatApply => "select_all_that_apply",
            QuestionKind::FillInTheBlank => "fill_in_the_blank",
            QuestionKind::Matching => "matching",
            QuestionKind::ShortOrLongAnswer => "short_or_long_answer",
        }
    }

    /// Human-readable name used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::TrueFalse => "true or false",
            QuestionKind::MultipleChoice => "multiple choice",
            QuestionKind::SelectAllThatApply => "select all that apply",
            QuestionKind::FillInTheBlank => "fill in the blank",
            QuestionKind::Matching => "matching",
            QuestionKind::ShortOrLongAnswer => "short or long answer",
        }
    }

    /// Parse a serialized `"kind"` tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quiz
// ────────────────────────────────────────────────────────────────────────────

/// Questions in generation order.
///
/// Serializes as the generation wire envelope `{"questions": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    questions: Vec<Question>,
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

impl<'a> IntoIterator for &'a Quiz {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}
