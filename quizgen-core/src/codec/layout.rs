//! Dialect-independent form of an encoded question.
//!
//! A [`Layout`] is what both dialects agree on: a stem, lettered option
//! groups, and answer lines. Converting between [`Question`] and `Layout` is
//! where letters are assigned and matching questions are shuffled; the
//! dialect grammars only decide how the pieces are written out.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::DecodeError;
use super::letters::{index_of, letter, split_lettered};
use crate::question::{
    FillInTheBlank, MatchPair, Matching, MultipleChoice, Question, QuestionKind,
    SelectAllThatApply, ShortOrLongAnswer, TrueFalse,
};

/// Lettered options; the first item is labelled `letter(start)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Group {
    pub start: usize,
    pub items: Vec<String>,
}

impl Group {
    fn new(start: usize, items: Vec<String>) -> Self {
        Self { start, items }
    }

    /// Position within the group of the option whose label decodes to `index`.
    fn position(&self, index: usize) -> Option<usize> {
        index
            .checked_sub(self.start)
            .filter(|pos| *pos < self.items.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub kind: QuestionKind,
    pub stem: String,
    pub groups: Vec<Group>,
    pub answer: Vec<String>,
}

impl Layout {
    /// Lay out `question`, shuffling matching pairs with `rng`.
    pub fn from_question<R: Rng + ?Sized>(
        question: &Question,
        list_separator: &str,
        rng: &mut R,
    ) -> Self {
        let (groups, answer) = match question {
            Question::TrueFalse(q) => {
                let answer = if q.answer { "True" } else { "False" };
                (Vec::new(), vec![answer.to_string()])
            }
            Question::MultipleChoice(q) => (
                vec![Group::new(0, q.options.clone())],
                vec![option_line(&q.options, q.answer)],
            ),
            Question::SelectAllThatApply(q) => (
                vec![Group::new(0, q.options.clone())],
                q.answer
                    .iter()
                    .map(|&i| option_line(&q.options, i))
                    .collect(),
            ),
            Question::FillInTheBlank(q) => (Vec::new(), vec![q.answer.join(list_separator)]),
            Question::Matching(q) => matching_layout(&q.answer, rng),
            Question::ShortOrLongAnswer(q) => {
                let mut lines: Vec<String> = q.answer.lines().map(str::to_string).collect();
                if lines.is_empty() {
                    lines.push(String::new());
                }
                (Vec::new(), lines)
            }
        };

        Self {
            kind: question.kind(),
            stem: question.stem().to_string(),
            groups,
            answer,
        }
    }

    /// Rebuild and validate the question this layout describes.
    pub fn into_question(self, list_separator: &str) -> Result<Question, DecodeError> {
        let Layout {
            kind,
            stem,
            mut groups,
            mut answer,
        } = self;

        while answer.last().is_some_and(|line| line.trim().is_empty()) {
            answer.pop();
        }
        if answer.is_empty() {
            return Err(DecodeError::MissingAnswer);
        }

        let question = match kind {
            QuestionKind::TrueFalse => {
                let line = answer[0].trim();
                let value = if line.eq_ignore_ascii_case("true") {
                    true
                } else if line.eq_ignore_ascii_case("false") {
                    false
                } else {
                    return Err(DecodeError::NotBoolean(line.to_string()));
                };
                Question::TrueFalse(TrueFalse {
                    question: stem,
                    answer: value,
                })
            }
            QuestionKind::MultipleChoice => {
                let group = single_group(groups)?;
                let index = option_index(&group, &answer[0])?;
                Question::MultipleChoice(MultipleChoice {
                    question: stem,
                    options: group.items,
                    answer: index,
                })
            }
            QuestionKind::SelectAllThatApply => {
                let group = single_group(groups)?;
                let mut seen = HashSet::new();
                let mut indices = Vec::new();
                for line in answer.iter().filter(|l| !l.trim().is_empty()) {
                    let index = option_index(&group, line)?;
                    if seen.insert(index) {
                        indices.push(index);
                    }
                }
                Question::SelectAllThatApply(SelectAllThatApply {
                    question: stem,
                    options: group.items,
                    answer: indices,
                })
            }
            QuestionKind::FillInTheBlank => {
                let answers = if list_separator.is_empty() {
                    vec![answer[0].trim().to_string()]
                } else {
                    answer[0]
                        .split(list_separator)
                        .map(|s| s.trim().to_string())
                        .collect()
                };
                Question::FillInTheBlank(FillInTheBlank {
                    question: stem,
                    answer: answers,
                })
            }
            QuestionKind::Matching => {
                if groups.len() == 1 {
                    groups = split_in_half(groups.remove(0))?;
                }
                let [left, right] = <[Group; 2]>::try_from(groups)
                    .map_err(|groups| DecodeError::GroupCount(groups.len()))?;
                let pairs = answer
                    .iter()
                    .filter(|l| !l.trim().is_empty())
                    .map(|line| match_pair(&left, &right, line))
                    .collect::<Result<Vec<_>, _>>()?;
                Question::Matching(Matching {
                    question: stem,
                    answer: pairs,
                })
            }
            QuestionKind::ShortOrLongAnswer => Question::ShortOrLongAnswer(ShortOrLongAnswer {
                question: stem,
                answer: answer.join("\n"),
            }),
        };

        question.validate()?;
        Ok(question)
    }
}

/// `"c) Canberra"`, or just the letter when the index is out of range.
fn option_line(options: &[String], index: usize) -> String {
    match options.get(index) {
        Some(text) => format!("{}) {text}", letter(index)),
        None => format!("{})", letter(index)),
    }
}

/// Shuffle both sides independently and map left letters to right letters.
///
/// Left items take labels from `a`; right items continue after the left group
/// so the two label ranges never overlap.
fn matching_layout<R: Rng + ?Sized>(
    pairs: &[MatchPair],
    rng: &mut R,
) -> (Vec<Group>, Vec<String>) {
    let n = pairs.len();
    let mut left_order: Vec<usize> = (0..n).collect();
    let mut right_order: Vec<usize> = (0..n).collect();
    left_order.shuffle(rng);
    right_order.shuffle(rng);

    // right_slot[pair] = position of that pair's right option in the shuffled group
    let mut right_slot = vec![0; n];
    for (slot, &pair) in right_order.iter().enumerate() {
        right_slot[pair] = slot;
    }

    let left = left_order
        .iter()
        .map(|&p| pairs[p].left_option.clone())
        .collect();
    let right = right_order
        .iter()
        .map(|&p| pairs[p].right_option.clone())
        .collect();
    let answer = left_order
        .iter()
        .enumerate()
        .map(|(slot, &p)| format!("{}) -> {})", letter(slot), letter(n + right_slot[p])))
        .collect();

    (vec![Group::new(0, left), Group::new(n, right)], answer)
}

fn single_group(mut groups: Vec<Group>) -> Result<Group, DecodeError> {
    if groups.len() == 1 {
        Ok(groups.remove(0))
    } else {
        Err(DecodeError::GroupCount(groups.len()))
    }
}

fn split_in_half(mut group: Group) -> Result<Vec<Group>, DecodeError> {
    if group.items.len() % 2 != 0 {
        return Err(DecodeError::GroupCount(1));
    }
    let n = group.items.len() / 2;
    let right = group.items.split_off(n);
    let right_start = group.start + n;
    Ok(vec![group, Group::new(right_start, right)])
}

/// Resolve an answer line to an option position, by letter or exact text.
fn option_index(group: &Group, line: &str) -> Result<usize, DecodeError> {
    let line = line.trim();
    if let Some((index, _)) = split_lettered(line) {
        return group
            .position(index)
            .ok_or_else(|| DecodeError::UnknownOption(line.to_string()));
    }
    if let Some(index) = index_of(line).and_then(|i| group.position(i)) {
        return Ok(index);
    }
    group
        .items
        .iter()
        .position(|item| item.trim() == line)
        .ok_or_else(|| DecodeError::UnknownOption(line.to_string()))
}

/// Parse `"a) -> e)"` against the two groups.
fn match_pair(left: &Group, right: &Group, line: &str) -> Result<MatchPair, DecodeError> {
    let malformed = || DecodeError::MalformedPair(line.trim().to_string());
    let (l, r) = line
        .split_once("->")
        .or_else(|| line.split_once('→'))
        .ok_or_else(malformed)?;
    let (l, _) = split_lettered(l).ok_or_else(malformed)?;
    let (r, _) = split_lettered(r).ok_or_else(malformed)?;
    let l = left.position(l).ok_or_else(malformed)?;
    let r = right.position(r).ok_or_else(malformed)?;
    Ok(MatchPair::new(
        left.items[l].clone(),
        right.items[r].clone(),
    ))
}
