//! Prompt assembly for quiz generation.
//!
//! The system prompt describes the `{"questions": [...]}` envelope and, for
//! each requested kind only, the object shape plus one worked example. The
//! user prompt states the requested counts and carries the source material
//! verbatim. Both are pure functions of their inputs.

use std::fmt::Write;

use quizgen_models::providers::QuizPrompt;

use crate::config::GenerationConfig;
use crate::question::QuestionKind;

/// Field layout of one kind, phrased for the model.
fn shape(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::TrueFalse => {
            r#"{"kind": "true_false", "question": string, "answer": boolean}"#
        }
        QuestionKind::MultipleChoice => {
            r#"{"kind": "multiple_choice", "question": string, "options": [string, ...], "answer": index of the correct option (0-based)}"#
        }
        QuestionKind::SelectAllThatApply => {
            r#"{"kind": "select_all_that_apply", "question": string, "options": [string, ...], "answer": [indices of every correct option (0-based)]}"#
        }
        QuestionKind::FillInTheBlank => {
            r#"{"kind": "fill_in_the_blank", "question": string with each blank written as `____`, "answer": [one string per blank, left to right]}"#
        }
        QuestionKind::Matching => {
            r#"{"kind": "matching", "question": string, "answer": [{"leftOption": string, "rightOption": string}, ...]}"#
        }
        QuestionKind::ShortOrLongAnswer => {
            r#"{"kind": "short_or_long_answer", "question": string, "answer": string}"#
        }
    }
}

/// One fully worked example object per kind.
fn example(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::TrueFalse => {
            r#"{"kind": "true_false", "question": "HTML is a programming language.", "answer": false}"#
        }
        QuestionKind::MultipleChoice => {
            r#"{"kind": "multiple_choice", "question": "Which of the following is the correct translation of house in Spanish?", "options": ["Casa", "Maison", "Haus", "Huis"], "answer": 0}"#
        }
        QuestionKind::SelectAllThatApply => {
            r#"{"kind": "select_all_that_apply", "question": "Which of the following are programming languages?", "options": ["Python", "HTML", "JavaScript", "CSS", "C++"], "answer": [0, 2, 4]}"#
        }
        QuestionKind::FillInTheBlank => {
            r#"{"kind": "fill_in_the_blank", "question": "The Treaty of `____` ended the `____` War.", "answer": ["Versailles", "First World"]}"#
        }
        QuestionKind::Matching => {
            r#"{"kind": "matching", "question": "Match the element to its symbol.", "answer": [{"leftOption": "Hydrogen", "rightOption": "H"}, {"leftOption": "Oxygen", "rightOption": "O"}, {"leftOption": "Sodium", "rightOption": "Na"}]}"#
        }
        QuestionKind::ShortOrLongAnswer => {
            r#"{"kind": "short_or_long_answer", "question": "Explain why the sky appears blue.", "answer": "Air molecules scatter shorter blue wavelengths of sunlight more strongly than longer red wavelengths."}"#
        }
    }
}

/// "1 matching question", "2 multiple choice questions".
fn quantity(kind: QuestionKind, count: u32) -> String {
    let noun = if count == 1 { "question" } else { "questions" };
    format!("{count} {} {noun}", kind.label())
}

/// Build the system prompt for `config`.
pub fn build_system_prompt(config: &GenerationConfig) -> String {
    let mut prompt = String::from(
        "You are an assistant that writes quiz questions from the material the user provides.\n\
         Reply with a single JSON object with exactly one property, \"questions\", \
         whose value is an array of question objects. Do not add any text outside the JSON object.\n\
         \nEach question object must have one of the following shapes:\n",
    );

    let requested = config.requested();
    for (kind, _) in &requested {
        let _ = writeln!(prompt, "- {}: {}", kind.label(), shape(*kind));
    }

    prompt.push_str("\nExamples:\n");
    for (kind, _) in &requested {
        let _ = writeln!(prompt, "{}", example(*kind));
    }

    let _ = write!(
        prompt,
        "\nWrite every question, option, and answer in {language}. \
         Keep the property names and \"kind\" values exactly as shown, in English.",
        language = config.language
    );
    prompt
}

/// Build the user prompt for `config` over `sources`, concatenated in order.
///
/// Each source is written as-is and followed by a single newline; no other
/// separator is added between sources.
pub fn build_user_prompt(config: &GenerationConfig, sources: &[impl AsRef<str>]) -> String {
    let quantities: Vec<String> = config
        .requested()
        .into_iter()
        .map(|(kind, count)| quantity(kind, count))
        .collect();

    let mut prompt = format!(
        "Generate exactly {} from the material below.\n\nMaterial:\n",
        join_quantities(&quantities)
    );
    for source in sources {
        prompt.push_str(source.as_ref());
        prompt.push('\n');
    }
    prompt
}

/// Build both prompts.
pub fn build_prompt(config: &GenerationConfig, sources: &[impl AsRef<str>]) -> QuizPrompt {
    QuizPrompt::new(
        build_system_prompt(config),
        build_user_prompt(config, sources),
    )
}

fn join_quantities(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
