//! Structural decode of provider output into questions.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::question::{Question, QuestionKind};

/// How many closing braces to try when salvaging a cut-off response.
const MAX_SALVAGE_ATTEMPTS: usize = 64;

/// Strip a surrounding markdown code fence, if any.
pub(crate) fn unwrap_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Double every backslash that does not start a valid JSON escape.
///
/// Models often emit LaTeX or Windows paths with bare backslashes, which are
/// invalid JSON. Valid escapes are left untouched except `\b` and `\f`
/// followed by a letter, which are read as LaTeX (`\frac`, `\beta`); nobody
/// writes a backspace or form feed into a question.
pub(crate) fn repair_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }
        match chars.get(i + 1).copied() {
            Some('b' | 'f') if chars.get(i + 2).is_some_and(char::is_ascii_alphabetic) => {
                out.push_str("\\\\");
                i += 1;
            }
            Some(next @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => {
                out.push(c);
                out.push(next);
                i += 2;
            }
            Some('u') if is_unicode_escape(&chars[i + 2..]) => {
                out.push_str("\\u");
                i += 2;
            }
            _ => {
                out.push_str("\\\\");
                i += 1;
            }
        }
    }
    Cow::Owned(out)
}

fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(|c| c.is_ascii_hexdigit())
}

/// Whether any string in `value` holds a control character other than a
/// newline. `\theta` or `\rho` left unescaped decode to a tab or carriage
/// return this way.
pub(crate) fn has_control_characters(value: &Value) -> bool {
    match value {
        Value::String(s) => s.chars().any(|c| c.is_control() && c != '\n'),
        Value::Array(items) => items.iter().any(has_control_characters),
        Value::Object(map) => map.values().any(has_control_characters),
        _ => false,
    }
}

/// Parse the `questions` array out of the response text.
///
/// The escape-repaired text is tried first, then the raw text. A bare
/// top-level array is accepted as well as the object envelope.
pub(crate) fn parse_envelope(text: &str) -> Result<Vec<Value>, String> {
    let repaired = repair_escapes(text);
    let value = serde_json::from_str::<Value>(&repaired)
        .or_else(|_| serde_json::from_str::<Value>(text))
        .map_err(|e| format!("response is not valid JSON: {e}"))?;
    questions_array(value)
}

fn questions_array(value: Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err("\"questions\" is not an array".to_string()),
            None => Err("response has no \"questions\" array".to_string()),
        },
        _ => Err("response is not a JSON object".to_string()),
    }
}

/// Recover the complete elements of a response cut off mid-array.
///
/// Closes the array after each of the last few `}` in turn until the result
/// parses.
pub(crate) fn salvage_truncated(text: &str) -> Option<Vec<Value>> {
    let repaired = repair_escapes(text);
    let text = repaired.as_ref();
    let start = text.find('[')?;
    let closers = text[start..]
        .char_indices()
        .filter(|(_, c)| *c == '}')
        .map(|(i, _)| start + i)
        .collect::<Vec<_>>();

    for &end in closers.iter().rev().take(MAX_SALVAGE_ATTEMPTS) {
        let head = &text[..=end];
        for tail in ["]}", "]"] {
            let candidate = format!("{head}{tail}");
            if let Ok(value) = serde_json::from_str::<Value>(&candidate)
                && let Ok(items) = questions_array(value)
            {
                return Some(items);
            }
        }
    }
    None
}

/// Decode and validate one element of the `questions` array.
pub(crate) fn decode_element(value: &Value) -> Result<Question, String> {
    let Value::Object(object) = value else {
        return Err("element is not an object".to_string());
    };
    if !object.get("question").is_some_and(Value::is_string) {
        return Err("missing string field \"question\"".to_string());
    }

    let kind = match object.get("kind") {
        Some(Value::String(tag)) => {
            QuestionKind::from_tag(tag).ok_or_else(|| format!("unknown kind \"{tag}\""))?
        }
        Some(_) => return Err("\"kind\" is not a string".to_string()),
        None => infer_kind(object)?,
    };

    let mut tagged = object.clone();
    tagged.insert("kind".to_string(), Value::String(kind.as_str().to_string()));
    let mut question: Question =
        serde_json::from_value(Value::Object(tagged)).map_err(|e| format!("{kind}: {e}"))?;

    if let Question::SelectAllThatApply(q) = &mut question {
        dedup_in_order(&mut q.answer);
    }
    question.validate().map_err(|e| format!("{kind}: {e}"))?;
    Ok(question)
}

/// Infer the kind of an untagged element from the shape of its answer.
fn infer_kind(object: &Map<String, Value>) -> Result<QuestionKind, String> {
    let answer = object
        .get("answer")
        .ok_or_else(|| "missing field \"answer\"".to_string())?;

    let kind = match answer {
        Value::Bool(_) => QuestionKind::TrueFalse,
        Value::Number(_) => QuestionKind::MultipleChoice,
        Value::String(_) => QuestionKind::ShortOrLongAnswer,
        Value::Array(items) if items.is_empty() => {
            if object.contains_key("options") {
                QuestionKind::SelectAllThatApply
            } else {
                return Err("answer array is empty".to_string());
            }
        }
        Value::Array(items) if items.iter().all(Value::is_number) => {
            QuestionKind::SelectAllThatApply
        }
        Value::Array(items) if items.iter().all(Value::is_string) => QuestionKind::FillInTheBlank,
        Value::Array(items) if items.iter().all(is_pair) => QuestionKind::Matching,
        _ => return Err("answer matches no question shape".to_string()),
    };
    Ok(kind)
}

fn is_pair(value: &Value) -> bool {
    value.get("leftOption").is_some_and(Value::is_string)
        && value.get("rightOption").is_some_and(Value::is_string)
}

fn dedup_in_order(indices: &mut Vec<usize>) {
    let mut seen = std::collections::HashSet::new();
    indices.retain(|i| seen.insert(*i));
}
