//! Answer grading.
//!
//! Open-ended answers are scored by embedding similarity through an adapter.
//! Closed kinds are checked exactly with [`grade_choice`].

use std::collections::HashSet;

use quizgen_models::providers::ModelProvider;
use tracing::debug;

use crate::Result;
use crate::question::{MatchPair, Question};

/// Percentage at or above which an open answer counts as correct.
pub const CORRECT_THRESHOLD: f32 = 80.0;

/// Typing this instead of an answer reveals the reference without grading.
pub const SKIP_KEYWORD: &str = "skip";

/// Outcome of grading an open-ended answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grade {
    /// Similarity to the reference answer, in percent.
    Scored { percentage: f32, correct: bool },
    /// The learner asked to see the answer.
    Skipped,
}

impl Grade {
    /// Grade from a similarity in [-1, 1].
    pub fn from_similarity(similarity: f32) -> Self {
        let percentage = (similarity * 100.0).clamp(0.0, 100.0);
        Grade::Scored {
            percentage,
            correct: percentage >= CORRECT_THRESHOLD,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Grade::Scored { correct: true, .. })
    }
}

/// Grade a free-text answer against the reference.
///
/// # Errors
///
/// Fails with [`quizgen_models::Error::UnsupportedCapability`] (wrapped in
/// [`crate::Error::Provider`]) when the adapter has no embeddings.
pub async fn grade_open_answer(
    user_answer: &str,
    reference: &str,
    provider: &dyn ModelProvider,
) -> Result<Grade> {
    let user_answer = user_answer.trim();
    if user_answer.eq_ignore_ascii_case(SKIP_KEYWORD) {
        return Ok(Grade::Skipped);
    }

    let similarity = provider
        .score_similarity(user_answer, reference.trim())
        .await?;
    let grade = Grade::from_similarity(similarity);
    debug!(provider = provider.name(), similarity, ?grade, "graded open answer");
    Ok(grade)
}

/// A learner's response to a closed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    TrueFalse(bool),
    /// Chosen option index.
    MultipleChoice(usize),
    /// Chosen option indices, in any order.
    SelectAllThatApply(Vec<usize>),
    /// One entry per blank.
    FillInTheBlank(Vec<String>),
    Matching(Vec<MatchPair>),
}

/// Check a closed-question response exactly.
///
/// Returns `None` when the response kind does not fit the question, including
/// any response to a short or long answer question.
pub fn grade_choice(question: &Question, response: &Response) -> Option<bool> {
    let correct = match (question, response) {
        (Question::TrueFalse(q), Response::TrueFalse(r)) => q.answer == *r,
        (Question::MultipleChoice(q), Response::MultipleChoice(r)) => q.answer == *r,
        (Question::SelectAllThatApply(q), Response::SelectAllThatApply(r)) => {
            let expected: HashSet<_> = q.answer.iter().collect();
            let given: HashSet<_> = r.iter().collect();
            expected == given
        }
        (Question::FillInTheBlank(q), Response::FillInTheBlank(r)) => {
            q.answer.len() == r.len()
                && q.answer
                    .iter()
                    .zip(r)
                    .all(|(expected, given)| normalize(expected) == normalize(given))
        }
        (Question::Matching(q), Response::Matching(r)) => {
            let expected: HashSet<_> = q.answer.iter().collect();
            let given: HashSet<_> = r.iter().collect();
            q.answer.len() == r.len() && expected == given
        }
        _ => return None,
    };
    Some(correct)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
