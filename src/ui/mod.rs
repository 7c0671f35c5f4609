mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::store::Role;
use crate::wrap::{wrap_chars, wrap_text};

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    // Input box grows with the draft, inside its border
    let input_rows = app.input.rows(
        area.width.saturating_sub(2),
        app.config.input.min_rows,
        app.config.input.max_rows,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),                            // Header
            Constraint::Min(3),                               // Transcript
            Constraint::Length(input_rows.saturating_add(2)), // Input box
            Constraint::Length(1),                            // Footer
        ])
        .split(area);

    draw_header(f, app, chunks[0]);
    draw_transcript(f, app, chunks[1]);
    draw_input(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let name = app.config.assistant.name.as_str();

    let state = if app.store.is_awaiting_reply() {
        format!("{} {} is typing", components::spinner(app.spinner_frame), name)
    } else if app.typewriter.is_revealing() {
        format!("{} {} is replying", components::spinner(app.spinner_frame), name)
    } else {
        "Ready".to_string()
    };

    let line = Line::from(vec![
        Span::styled(
            "Cognit Studio",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" │ ", Style::default().fg(theme.text_dim)),
        Span::styled(state, Style::default().fg(theme.text_dim)),
    ]);

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_transcript(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(" Conversation ", Style::default().fg(theme.text_dim)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.text_dim));

    let width = usize::from(area.width.saturating_sub(2));
    let messages = app.store.messages();
    let mut lines: Vec<Line> = Vec::new();

    if messages.is_empty() {
        let hint = format!("Say hello to {}.", app.config.assistant.name);
        lines.extend(
            wrap_text(&hint, width)
                .into_iter()
                .map(|row| Line::from(Span::styled(row, Style::default().fg(theme.text_dim)))),
        );
    }

    for (i, msg) in messages.iter().enumerate() {
        // Only the newest assistant reply is animated
        let live = i + 1 == messages.len() && msg.role == Role::Assistant;
        let (label, body) = match msg.role {
            Role::User => (app.config.user_name.as_str(), msg.content.as_str()),
            Role::Assistant if live => (app.config.assistant.name.as_str(), app.revealed_reply()),
            Role::Assistant => (app.config.assistant.name.as_str(), msg.content.as_str()),
        };
        lines.extend(components::message_lines(
            theme,
            msg.role,
            label,
            body,
            live && app.is_busy(),
            width,
        ));
    }

    // Lines are already wrapped, one per row. Stick to the bottom unless
    // scrolled back.
    let inner_height = usize::from(area.height.saturating_sub(2));
    let scroll = lines
        .len()
        .saturating_sub(inner_height)
        .saturating_sub(usize::from(app.scroll_back));

    let transcript = Paragraph::new(lines)
        .block(block)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));

    f.render_widget(transcript, area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let error = app.input.error();
    let border_color = if error.is_some() { theme.danger } else { theme.accent };

    let mut block = Block::default()
        .title(Span::styled(
            " Message ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    if let Some(err) = error {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} ", err),
            Style::default().fg(theme.danger),
        )));
    }

    let inner_width = area.width.saturating_sub(2).max(1);
    let inner_height = area.height.saturating_sub(2).max(1);

    let (cursor_x, cursor_y) = cursor_position(app.input.text(), app.input.cursor(), inner_width);
    let scroll = cursor_y.saturating_sub(inner_height - 1);

    let lines: Vec<Line> = wrap_draft(app.input.text(), inner_width)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.text))))
        .collect();

    f.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
    f.set_cursor_position((area.x + 1 + cursor_x, area.y + 1 + cursor_y - scroll));
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let line = if let Some(status) = app.store.status() {
        Line::from(Span::styled(status, Style::default().fg(theme.user)))
    } else {
        let hints = [
            ("Enter", "send"),
            ("Alt+Enter", "newline"),
            ("Ctrl+R", "regenerate"),
            ("Ctrl+L", "clear"),
            ("Esc", "skip"),
            ("Ctrl+C", "quit"),
        ];
        let mut spans = Vec::new();
        for (i, (key, action)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" · ", Style::default().fg(theme.text_dim)));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.accent)));
            spans.push(Span::styled(format!(" {}", action), Style::default().fg(theme.text_dim)));
        }
        Line::from(spans)
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

/// Hard-wrap a draft by display columns, one entry per screen row
fn wrap_draft(text: &str, width: u16) -> Vec<String> {
    text.split('\n')
        .flat_map(|line| wrap_chars(line, usize::from(width)))
        .collect()
}

/// Column and row of the char cursor inside the wrapped draft. Follows the
/// same breaks as `wrap_draft`, so a wide char that does not fit at the end
/// of a row puts the cursor at the start of the next one.
fn cursor_position(text: &str, cursor: usize, width: u16) -> (u16, u16) {
    let cols = usize::from(width.max(1));
    let mut row = 0usize;
    let mut col = 0usize;

    for (i, ch) in text.chars().enumerate() {
        if ch == '\n' {
            if i == cursor {
                break;
            }
            row += 1;
            col = 0;
            continue;
        }

        let ch_width = ch.width().unwrap_or(0);
        if ch_width > 0 && col > 0 && col + ch_width > cols {
            row += 1;
            col = 0;
        }
        if i == cursor {
            break;
        }
        col += ch_width;
    }

    // A full row pushes the cursor onto the next one
    if col >= cols {
        row += 1;
        col = 0;
    }

    (
        u16::try_from(col).unwrap_or(u16::MAX),
        u16::try_from(row).unwrap_or(u16::MAX),
    )
}
