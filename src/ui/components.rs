//! Small building blocks for the chat view

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use unicode_width::UnicodeWidthStr;

use crate::store::Role;
use crate::theme::Theme;
use crate::wrap::wrap_text;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Shown after text that is still being typed
pub const TYPING_CURSOR: &str = "▌";

pub fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

/// One message: a label line, the body word-wrapped to `width` columns, and a
/// blank separator. `typing` appends the typing cursor to the last body row.
///
/// Rows are wrapped here rather than by the `Paragraph`, so the caller can
/// count them to keep the newest text in view.
pub fn message_lines<'a>(
    theme: &Theme,
    role: Role,
    label: &'a str,
    body: &str,
    typing: bool,
    width: usize,
) -> Vec<Line<'a>> {
    let label_color = match role {
        Role::User => theme.user,
        Role::Assistant => theme.assistant,
    };

    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::default().fg(label_color).add_modifier(Modifier::BOLD),
    ))];

    let body_style = Style::default().fg(theme.text);
    let mut rows: Vec<String> = body
        .split('\n')
        .flat_map(|paragraph| wrap_text(paragraph, width))
        .collect();

    let cursor = if typing {
        let fits = rows
            .last()
            .is_some_and(|last| last.width() + TYPING_CURSOR.width() <= width);
        if !fits {
            rows.push(String::new());
        }
        Some(rows.len() - 1)
    } else {
        None
    };

    for (i, row) in rows.into_iter().enumerate() {
        let mut line = Line::from(Span::styled(row, body_style));
        if cursor == Some(i) {
            line.spans
                .push(Span::styled(TYPING_CURSOR, Style::default().fg(theme.assistant)));
        }
        lines.push(line);
    }

    lines.push(Line::default());
    lines
}
