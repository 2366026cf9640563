//! Option letters: bijective base-26 (`a`..`z`, `aa`, `ab`, ...).
//!
//! The label space is unbounded, so the right-hand group of a matching
//! question can always start after the left-hand group without wrapping.

/// Label for a zero-based position.
pub(crate) fn letter(index: usize) -> String {
    let mut chars = Vec::new();
    let mut n = index;
    loop {
        chars.push(char::from(b'a' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    chars.iter().rev().collect()
}

/// Zero-based position for a label, if it is one.
pub(crate) fn index_of(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for c in label.chars() {
        if !c.is_ascii_lowercase() {
            return None;
        }
        let digit = (c as usize) - ('a' as usize) + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// Split `"c) text"` into the label's position and the text after it.
pub(crate) fn split_lettered(line: &str) -> Option<(usize, &str)> {
    let (label, rest) = line.trim_start().split_once(')')?;
    let index = index_of(label)?;
    Some((index, rest.strip_prefix(' ').unwrap_or(rest)))
}
