//! Dialect grammars.
//!
//! Each dialect is one [`Grammar`] value. [`Grammar::render`] and
//! [`Grammar::parse_block`] both read the same tokens, so a token changed here
//! changes encoding and decoding together.
//!
//! Stem and answer lines that the decoder would otherwise read as structure
//! (an option, a hint, a header, a block-ending blank line) are written with a
//! leading [`ESCAPE`], which the decoder removes.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use super::layout::{Group, Layout};
use super::letters::{letter, split_lettered};
use crate::config::CodecConfig;
use crate::question::{QuestionKind, has_blank};

/// Callout notes: nested `>` quote blocks with titled callouts.
///
/// ```text
/// > [!question] Capital of Australia?
/// > a) Sydney
/// > b) Canberra
/// >> [!success]- Answer
/// >> b) Canberra
/// ```
pub(crate) static CALLOUT: Grammar = Grammar {
    quote: ">",
    question_title: Some("[!question]"),
    group_titles: Some(["[!example] Group A", "[!example] Group B"]),
    answer_title: Some("[!success]- Answer"),
    hints: &[
        (QuestionKind::TrueFalse, "True or false?"),
        (QuestionKind::SelectAllThatApply, "Select all that apply:"),
        (QuestionKind::ShortOrLongAnswer, "Answer in your own words:"),
    ],
    labels: &[],
};

/// Spaced-repetition flashcards: a bold kind label, then `::` for one-line
/// answers or a `?` line before multi-line answers. A card ends at the first
/// blank line.
///
/// ```text
/// **True or False:** The sky is blue. :: True
/// ```
pub(crate) static SPACED_REPETITION: Grammar = Grammar {
    quote: "",
    question_title: None,
    group_titles: None,
    answer_title: None,
    hints: &[],
    labels: &[
        (QuestionKind::TrueFalse, "True or False"),
        (QuestionKind::MultipleChoice, "Multiple Choice"),
        (QuestionKind::SelectAllThatApply, "Select All That Apply"),
        (QuestionKind::FillInTheBlank, "Fill in the Blank"),
        (QuestionKind::Matching, "Matching"),
        (QuestionKind::ShortOrLongAnswer, "Short Answer"),
        (QuestionKind::ShortOrLongAnswer, "Long Answer"),
    ],
};

/// Label used for open questions whose answer spans several lines.
const LONG_ANSWER_LABEL: &str = "Long Answer";

/// Prefix marking a content line as literal text.
const ESCAPE: char = '\\';

/// Deepest quote level any dialect writes.
const MAX_DEPTH: usize = 2;

fn label_regex() -> Option<&'static Regex> {
    static LABEL: OnceLock<Option<Regex>> = OnceLock::new();
    LABEL
        .get_or_init(|| Regex::new(r"^\*\*([^*]+?):\*\*\s?(.*)$").ok())
        .as_ref()
}

/// Tokens of one dialect.
#[derive(Debug)]
pub(crate) struct Grammar {
    /// Quote marker repeated once per nesting level; empty for flat text.
    pub quote: &'static str,
    /// Callout title opening a question.
    pub question_title: Option<&'static str>,
    /// Callout titles for the two matching groups; untitled when `None`.
    pub group_titles: Option<[&'static str; 2]>,
    /// Callout title opening the answer; `None` uses the multiline separator.
    pub answer_title: Option<&'static str>,
    /// Lines that disambiguate kinds sharing a shape.
    pub hints: &'static [(QuestionKind, &'static str)],
    /// Bold kind labels starting each question.
    pub labels: &'static [(QuestionKind, &'static str)],
}

/// Whether `line` starts a question in either dialect.
pub(crate) fn is_header(line: &str) -> bool {
    CALLOUT.header(line).is_some() || SPACED_REPETITION.header(line).is_some()
}

/// The start of a question found by [`Grammar::header`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header<'a> {
    /// Kind named by a label, if the dialect has labels.
    pub kind: Option<QuestionKind>,
    /// Everything after the title or label.
    pub rest: &'a str,
}

impl Grammar {
    fn line(&self, depth: usize, content: &str) -> String {
        if self.quote.is_empty() {
            return content.to_string();
        }
        let prefix = self.quote.repeat(depth);
        if content.is_empty() {
            prefix
        } else {
            format!("{prefix} {content}")
        }
    }

    /// Quote depth and content of a line; `None` if the line is outside the
    /// quote block.
    ///
    /// Only the leading run of quote markers counts toward the depth, capped
    /// at [`MAX_DEPTH`], so content that itself starts with a marker survives.
    fn strip<'a>(&self, line: &'a str) -> Option<(usize, &'a str)> {
        if self.quote.is_empty() {
            return Some((0, line));
        }
        let mut depth = 0;
        let mut rest = line.trim_start();
        while depth < MAX_DEPTH {
            let Some(after) = rest.strip_prefix(self.quote) else {
                break;
            };
            depth += 1;
            rest = after;
        }
        (depth > 0).then_some((depth, rest.strip_prefix(' ').unwrap_or(rest)))
    }

    /// Whether `line` falls outside any block of this dialect.
    fn ends_block(&self, line: &str) -> bool {
        is_header(line)
            || self.strip(line).is_none()
            || (self.quote.is_empty() && line.trim().is_empty())
    }

    fn opens_answer(&self, trimmed: &str, config: &CodecConfig) -> bool {
        match self.answer_title {
            Some(title) => trimmed == title,
            None => trimmed == config.multiline_separator.trim(),
        }
    }

    fn is_group_title(&self, trimmed: &str) -> bool {
        self.group_titles
            .is_some_and(|titles| titles.iter().any(|t| *t == trimmed))
    }

    fn hinted_kind(&self, trimmed: &str) -> Option<QuestionKind> {
        self.hints
            .iter()
            .find(|(_, hint)| *hint == trimmed)
            .map(|(kind, _)| *kind)
    }

    /// A stem continuation line, escaped if the decoder would not read it back
    /// as stem text.
    fn stem_line<'a>(&self, line: &'a str, config: &CodecConfig) -> Cow<'a, str> {
        let trimmed = line.trim();
        let structural = trimmed.is_empty()
            || trimmed.starts_with(ESCAPE)
            || self.opens_answer(trimmed, config)
            || self.is_group_title(trimmed)
            || self.hinted_kind(trimmed).is_some()
            || split_lettered(trimmed).is_some()
            || self.ends_block(&self.line(1, trimmed));
        if structural {
            Cow::Owned(format!("{ESCAPE}{trimmed}"))
        } else {
            Cow::Borrowed(line)
        }
    }

    /// An answer line, escaped if it would end the block or starts with the
    /// escape itself.
    fn answer_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if line.starts_with(ESCAPE) || self.ends_block(&self.line(MAX_DEPTH, line)) {
            Cow::Owned(format!("{ESCAPE}{line}"))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn label(&self, kind: QuestionKind, inline: bool) -> Option<&'static str> {
        if kind == QuestionKind::ShortOrLongAnswer && !inline {
            return self
                .labels
                .iter()
                .find(|(_, label)| *label == LONG_ANSWER_LABEL)
                .map(|(_, label)| *label);
        }
        self.labels
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, label)| *label)
    }

    fn hint(&self, kind: QuestionKind) -> Option<&'static str> {
        self.hints
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, hint)| *hint)
    }

    /// Recognize the first line of a question.
    pub fn header<'a>(&self, line: &'a str) -> Option<Header<'a>> {
        if let Some(title) = self.question_title {
            let (depth, content) = self.strip(line)?;
            let rest = content.strip_prefix(title).filter(|_| depth == 1)?;
            return Some(Header {
                kind: None,
                rest: rest.trim(),
            });
        }

        let captures = label_regex()?.captures(line.trim_start())?;
        let label = captures.get(1)?.as_str().trim();
        let kind = self
            .labels
            .iter()
            .find(|(_, l)| l.eq_ignore_ascii_case(label))
            .map(|(k, _)| *k)?;
        Some(Header {
            kind: Some(kind),
            rest: captures.get(2).map_or("", |m| m.as_str()),
        })
    }

    /// Whether a question laid out like `layout` fits on its header line.
    fn is_inline(&self, layout: &Layout) -> bool {
        self.answer_title.is_none()
            && layout.groups.is_empty()
            && layout.answer.len() == 1
            && !layout.answer[0].is_empty()
            && !layout.stem.contains('\n')
    }

    // ────────────────────────────────────────────────────────────────────────────
    // Encoding
    // ────────────────────────────────────────────────────────────────────────────

    pub fn render(&self, layout: &Layout, config: &CodecConfig) -> String {
        let inline = self.is_inline(layout);
        let mut stem_lines = layout.stem.lines();
        let mut lines = Vec::new();

        let mut header = String::new();
        if let Some(title) = self.question_title {
            header.push_str(title);
            header.push(' ');
        }
        if let Some(label) = self.label(layout.kind, inline) {
            header.push_str(&format!("**{label}:** "));
        }
        header.push_str(stem_lines.next().unwrap_or(""));
        if inline {
            header.push_str(&format!(" {} {}", config.inline_separator, layout.answer[0]));
        }
        lines.push(self.line(1, header.trim_end()));

        for stem_line in stem_lines {
            lines.push(self.line(1, &self.stem_line(stem_line, config)));
        }
        if let Some(hint) = self.hint(layout.kind) {
            lines.push(self.line(1, hint));
        }

        let titles = self.group_titles.filter(|_| layout.groups.len() == 2);
        for (i, group) in layout.groups.iter().enumerate() {
            let depth = match titles {
                Some(titles) => {
                    if i > 0 {
                        lines.push(self.line(1, ""));
                    }
                    lines.push(self.line(2, titles[i]));
                    2
                }
                None => 1,
            };
            for (offset, item) in group.items.iter().enumerate() {
                let label = letter(group.start + offset);
                lines.push(self.line(depth, &format!("{label}) {item}")));
            }
        }

        if !inline {
            match self.answer_title {
                Some(title) => {
                    if titles.is_some() {
                        lines.push(self.line(1, ""));
                    }
                    lines.push(self.line(2, title));
                    for answer in &layout.answer {
                        lines.push(self.line(2, &self.answer_line(answer)));
                    }
                }
                None => {
                    lines.push(config.multiline_separator.clone());
                    for answer in &layout.answer {
                        lines.push(self.answer_line(answer).into_owned());
                    }
                }
            }
        }

        lines.join("\n")
    }

    // ────────────────────────────────────────────────────────────────────────────
    // Decoding
    // ────────────────────────────────────────────────────────────────────────────

    /// Parse the block starting at `lines[0]`, returning its layout and the
    /// number of lines it spans.
    ///
    /// A block ends before the next header of either dialect, before the first
    /// unquoted line (callout), or before the first blank line (flashcards).
    /// An inline flashcard is a single line.
    pub fn parse_block(&self, lines: &[&str], config: &CodecConfig) -> Option<(Layout, usize)> {
        let (first, body) = lines.split_first()?;
        let header = self.header(first)?;

        let inline_separator = format!(" {} ", config.inline_separator);
        if let Some(kind) = header.kind
            && matches!(
                kind,
                QuestionKind::TrueFalse
                    | QuestionKind::FillInTheBlank
                    | QuestionKind::ShortOrLongAnswer
            )
            && let Some((question, answer)) = header.rest.split_once(&inline_separator)
        {
            let layout = Layout {
                kind,
                stem: question.trim().to_string(),
                groups: Vec::new(),
                answer: vec![answer.trim().to_string()],
            };
            return Some((layout, 1));
        }

        let mut stem = header.rest.trim().to_string();
        let mut answer = Vec::new();
        let mut hinted = None;
        let mut titled = false;
        let mut groups: Vec<Vec<(usize, String)>> = Vec::new();
        let mut in_answer = false;
        let mut len = 1;

        for line in body {
            if self.ends_block(line) {
                break;
            }
            let Some((_, content)) = self.strip(line) else {
                break;
            };
            len += 1;

            if in_answer {
                let content = content.trim_end();
                answer.push(content.strip_prefix(ESCAPE).unwrap_or(content).to_string());
                continue;
            }

            let trimmed = content.trim();
            if let Some(literal) = trimmed.strip_prefix(ESCAPE) {
                stem.push('\n');
                stem.push_str(literal);
            } else if self.opens_answer(trimmed, config) {
                in_answer = true;
            } else if self.is_group_title(trimmed) {
                titled = true;
                groups.push(Vec::new());
            } else if let Some(kind) = self.hinted_kind(trimmed) {
                hinted = Some(kind);
            } else if let Some((index, text)) = split_lettered(trimmed) {
                if groups.is_empty() {
                    groups.push(Vec::new());
                }
                if let Some(group) = groups.last_mut() {
                    group.push((index, text.trim().to_string()));
                }
            } else if !trimmed.is_empty() {
                stem.push('\n');
                stem.push_str(trimmed);
            }
        }

        let groups: Vec<Group> = groups
            .into_iter()
            .filter(|items| !items.is_empty())
            .map(|items| Group {
                start: items.first().map_or(0, |(index, _)| *index),
                items: items.into_iter().map(|(_, text)| text).collect(),
            })
            .collect();

        let kind = header.kind.or(hinted).unwrap_or_else(|| {
            if titled {
                QuestionKind::Matching
            } else if !groups.is_empty() {
                QuestionKind::MultipleChoice
            } else if has_blank(&stem) {
                QuestionKind::FillInTheBlank
            } else {
                QuestionKind::ShortOrLongAnswer
            }
        });

        let layout = Layout {
            kind,
            stem: stem.trim().to_string(),
            groups,
            answer,
        };
        Some((layout, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(kind: QuestionKind, groups: Vec<Group>, answer: &[&str]) -> Layout {
        Layout {
            kind,
            stem: "Stem".into(),
            groups,
            answer: answer.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn callout_multiple_choice_matches_documented_layout() {
        let layout = layout(
            QuestionKind::MultipleChoice,
            vec![Group {
                start: 0,
                items: vec!["Paris".into(), "Rome".into()],
            }],
            &["b) Rome"],
        );
        let text = CALLOUT.render(&layout, &CodecConfig::default());
        assert_eq!(
            text,
            "> [!question] Stem\n> a) Paris\n> b) Rome\n>> [!success]- Answer\n>> b) Rome"
        );
    }

    #[test]
    fn spaced_true_false_is_inline() {
        let layout = layout(QuestionKind::TrueFalse, Vec::new(), &["True"]);
        let text = SPACED_REPETITION.render(&layout, &CodecConfig::default());
        assert_eq!(text, "**True or False:** Stem :: True");
    }

    #[test]
    fn spaced_multiline_answer_uses_long_label_and_separator() {
        let layout = layout(
            QuestionKind::ShortOrLongAnswer,
            Vec::new(),
            &["first", "second"],
        );
        let text = SPACED_REPETITION.render(&layout, &CodecConfig::default());
        assert_eq!(text, "**Long Answer:** Stem\n?\nfirst\nsecond");
    }

    #[test]
    fn callout_matching_has_titled_groups() {
        let layout = layout(
            QuestionKind::Matching,
            vec![
                Group {
                    start: 0,
                    items: vec!["H".into()],
                },
                Group {
                    start: 1,
                    items: vec!["Hydrogen".into()],
                },
            ],
            &["a) -> b)"],
        );
        let text = CALLOUT.render(&layout, &CodecConfig::default());
        assert_eq!(
            text,
            "> [!question] Stem\n>> [!example] Group A\n>> a) H\n>\n>> [!example] Group B\n>> b) Hydrogen\n>\n>> [!success]- Answer\n>> a) -> b)"
        );
    }

    #[test]
    fn headers_are_recognized_per_dialect() {
        let header = CALLOUT.header("> [!question] What?").unwrap();
        assert_eq!(header.rest, "What?");
        assert!(CALLOUT.header(">> [!question] nested").is_none());
        assert!(CALLOUT.header("plain").is_none());

        let header = SPACED_REPETITION
            .header("**fill in the blank:** The ___ sat")
            .unwrap();
        assert_eq!(header.kind, Some(QuestionKind::FillInTheBlank));
        assert_eq!(header.rest, "The ___ sat");
        assert!(SPACED_REPETITION.header("**Note:** not a question").is_none());
    }

    #[test]
    fn callout_kind_is_inferred_from_hint_and_shape() {
        let config = CodecConfig::default();
        let cases = [
            (
                vec!["> [!question] Stem", "> True or false?", ">> [!success]- Answer", ">> True"],
                QuestionKind::TrueFalse,
            ),
            (
                vec!["> [!question] Stem", "> a) x", "> b) y", ">> [!success]- Answer", ">> a) x"],
                QuestionKind::MultipleChoice,
            ),
            (
                vec!["> [!question] The ___ sat", ">> [!success]- Answer", ">> cat"],
                QuestionKind::FillInTheBlank,
            ),
            (
                vec![
                    "> [!question] Why use ___ here?",
                    "> Answer in your own words:",
                    ">> [!success]- Answer",
                    ">> Placeholder",
                ],
                QuestionKind::ShortOrLongAnswer,
            ),
            (
                vec!["> [!question] Why?", ">> [!success]- Answer", ">> Because"],
                QuestionKind::ShortOrLongAnswer,
            ),
        ];
        for (lines, kind) in cases {
            let (layout, _) = CALLOUT.parse_block(&lines, &config).unwrap();
            assert_eq!(layout.kind, kind, "{lines:?}");
        }
    }

    #[test]
    fn callout_block_ends_at_first_unquoted_line() {
        let lines = ["> [!question] Q", ">> [!success]- Answer", ">> yes", "", "prose"];
        let (_, len) = CALLOUT.parse_block(&lines, &CodecConfig::default()).unwrap();
        assert_eq!(len, 3);
    }

    #[test]
    fn flashcard_ends_at_blank_line() {
        let lines = [
            "**Select All That Apply:** Which?",
            "a) x",
            "b) y",
            "?",
            "a) x",
            "",
            "## My notes",
            "I wrote this later.",
        ];
        let (layout, len) = SPACED_REPETITION
            .parse_block(&lines, &CodecConfig::default())
            .unwrap();
        assert_eq!(len, 5);
        assert_eq!(layout.answer, vec!["a) x"]);
    }

    #[test]
    fn inline_flashcard_is_one_line() {
        let lines = ["**True or False:** Ice floats. :: True", "Trailing prose."];
        let (layout, len) = SPACED_REPETITION
            .parse_block(&lines, &CodecConfig::default())
            .unwrap();
        assert_eq!(len, 1);
        assert_eq!(layout.answer, vec!["True"]);
    }

    #[test]
    fn quote_depth_is_capped() {
        assert_eq!(CALLOUT.strip(">> > quoted"), Some((2, "> quoted")));
        assert_eq!(CALLOUT.strip("> > quoted"), Some((1, "> quoted")));
        assert_eq!(CALLOUT.strip(">>"), Some((2, "")));
        assert_eq!(CALLOUT.strip("plain"), None);
    }

    #[test]
    fn structural_stem_lines_are_escaped() {
        let config = CodecConfig::default();
        let layout = Layout {
            kind: QuestionKind::ShortOrLongAnswer,
            stem: "Consider the list:\na) apples\n\n?\n**Matching:** no".into(),
            groups: Vec::new(),
            answer: vec!["one".into(), "".into(), "two".into()],
        };

        let text = SPACED_REPETITION.render(&layout, &config);
        assert_eq!(
            text,
            "**Long Answer:** Consider the list:\n\\a) apples\n\\\n\\?\n\\**Matching:** no\n?\none\n\\\ntwo"
        );
        let lines: Vec<&str> = text.lines().collect();
        let (decoded, len) = SPACED_REPETITION.parse_block(&lines, &config).unwrap();
        assert_eq!(len, lines.len());
        assert_eq!(decoded, layout);

        let text = CALLOUT.render(&layout, &config);
        let lines: Vec<&str> = text.lines().collect();
        let (decoded, _) = CALLOUT.parse_block(&lines, &config).unwrap();
        assert_eq!(decoded, layout);
    }
}
