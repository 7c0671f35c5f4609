//! Line wrapping by terminal display width.
//!
//! Widths come from `unicode-width`: CJK and most emoji take two columns,
//! combining marks take none.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Hard-wrap one line at `width` columns, keeping every character.
/// Returns at least one (possibly empty) row.
pub fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if ch_width == 0 {
            current.push(ch);
            continue;
        }
        if current_width + ch_width > width && !current.is_empty() {
            rows.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Word-wrap one paragraph at `width` columns. Runs of whitespace collapse to
/// one space and words wider than a row are broken by `wrap_chars`.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();

        if !current.is_empty() && current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }

        if !current.is_empty() {
            rows.push(std::mem::take(&mut current));
        }
        if word_width > width {
            let mut broken = wrap_chars(word, width);
            current = broken.pop().unwrap_or_default();
            rows.extend(broken);
        } else {
            current = word.to_string();
        }
        current_width = current.width();
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}
