//! Message draft: editing, auto-growing height and debounced validation

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::wrap::wrap_chars;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("message is empty")]
    Empty,
    #[error("message too long ({len}/{max} characters)")]
    TooLong { len: usize, max: usize },
}

/// Check a draft before it is sent
pub fn validate(text: &str, max_len: usize) -> Result<(), InputError> {
    if text.trim().is_empty() {
        return Err(InputError::Empty);
    }
    let len = text.chars().count();
    if len > max_len {
        return Err(InputError::TooLong { len, max: max_len });
    }
    Ok(())
}

/// Number of terminal rows `text` needs when hard-wrapped at `width` display
/// columns. Always at least one; a trailing newline opens a new row.
pub fn visual_rows(text: &str, width: u16) -> usize {
    let width = usize::from(width);
    text.split('\n')
        .map(|line| wrap_chars(line, width).len())
        .sum()
}

/// Fires once the input has been quiet for `interval`
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending_since: None,
        }
    }

    /// Record an edit; restarts the quiet period
    pub fn touch(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    /// True exactly once per burst of edits, after the quiet period
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.interval => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.pending_since = None;
    }
}

#[derive(Debug)]
pub struct MessageInput {
    buffer: String,
    /// Cursor position in chars
    cursor: usize,
    max_len: usize,
    debounce: Debouncer,
    /// Result of the last debounced validation, `None` until one ran
    validation: Option<Result<(), InputError>>,
}

impl MessageInput {
    pub fn new(max_len: usize, debounce: Duration) -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            max_len,
            debounce: Debouncer::new(debounce),
            validation: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Last debounced validation error, if any
    pub fn error(&self) -> Option<&InputError> {
        self.validation.as_ref().and_then(|r| r.as_ref().err())
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(idx, _)| idx)
            .unwrap_or(self.buffer.len())
    }

    fn edited(&mut self, now: Instant) {
        // Stale results would flash while typing
        self.validation = None;
        self.debounce.touch(now);
    }

    pub fn insert_char(&mut self, c: char, now: Instant) {
        let idx = self.byte_index(self.cursor);
        self.buffer.insert(idx, c);
        self.cursor += 1;
        self.edited(now);
    }

    pub fn insert_str(&mut self, s: &str, now: Instant) {
        let idx = self.byte_index(self.cursor);
        self.buffer.insert_str(idx, s);
        self.cursor += s.chars().count();
        self.edited(now);
    }

    pub fn insert_newline(&mut self, now: Instant) {
        self.insert_char('\n', now);
    }

    pub fn backspace(&mut self, now: Instant) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index(self.cursor);
        self.buffer.remove(idx);
        self.edited(now);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    /// Run validation if the quiet period has passed. Returns true when it ran.
    pub fn poll_validation(&mut self, now: Instant) -> bool {
        if !self.debounce.ready(now) {
            return false;
        }
        // An empty draft is not worth complaining about until submit
        self.validation = if self.buffer.is_empty() {
            None
        } else {
            Some(validate(&self.buffer, self.max_len))
        };
        true
    }

    /// Validate immediately and hand the draft over, leaving the input empty.
    /// On error the draft stays put.
    pub fn take(&mut self) -> Result<String, InputError> {
        self.debounce.cancel();
        if let Err(e) = validate(&self.buffer, self.max_len) {
            self.validation = Some(Err(e.clone()));
            return Err(e);
        }
        self.validation = None;
        self.cursor = 0;
        Ok(std::mem::take(&mut self.buffer))
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.validation = None;
        self.debounce.cancel();
    }

    /// Height of the input box content, growing with the draft
    pub fn rows(&self, width: u16, min_rows: u16, max_rows: u16) -> u16 {
        let rows = visual_rows(&self.buffer, width);
        let rows = u16::try_from(rows).unwrap_or(u16::MAX);
        rows.clamp(min_rows, max_rows.max(min_rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> MessageInput {
        MessageInput::new(10, Duration::from_millis(300))
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate("", 10), Err(InputError::Empty));
        assert_eq!(validate("  \n ", 10), Err(InputError::Empty));
        assert_eq!(validate("hello", 10), Ok(()));
        assert_eq!(
            validate("hello world!", 10),
            Err(InputError::TooLong { len: 12, max: 10 })
        );
        // Length counts characters, not bytes
        assert_eq!(validate("ééééé", 5), Ok(()));
    }

    #[test]
    fn test_visual_rows() {
        assert_eq!(visual_rows("", 10), 1);
        assert_eq!(visual_rows("short", 10), 1);
        assert_eq!(visual_rows("exactly 10", 10), 1);
        assert_eq!(visual_rows("eleven char", 10), 2);
        assert_eq!(visual_rows("a\nb\nc", 10), 3);
        assert_eq!(visual_rows("a\n", 10), 2);
        assert_eq!(visual_rows("abc", 0), 3);
    }

    #[test]
    fn test_visual_rows_wide_characters() {
        // Six CJK characters are twelve columns wide
        assert_eq!(visual_rows("你好你好你好", 10), 2);
        assert_eq!(visual_rows("你好你好你", 10), 1);
        assert_eq!(visual_rows("👋👋👋", 4), 2);
        // A wide char that would straddle the edge moves to the next row
        assert_eq!(visual_rows("abc你", 4), 2);
    }

    #[test]
    fn test_rows_clamped() {
        let now = Instant::now();
        let mut input = input();
        assert_eq!(input.rows(20, 1, 4), 1);

        input.insert_str("one\ntwo", now);
        assert_eq!(input.rows(20, 1, 4), 2);

        input.insert_str("\n3\n4\n5\n6", now);
        assert_eq!(input.rows(20, 1, 4), 4);
        assert_eq!(input.rows(20, 3, 2), 3);
    }

    #[test]
    fn test_editing_at_cursor() {
        let now = Instant::now();
        let mut input = input();
        input.insert_str("hllo", now);
        input.move_left();
        input.move_left();
        input.move_left();
        input.insert_char('e', now);
        assert_eq!(input.text(), "hello");
        assert_eq!(input.cursor(), 2);

        input.backspace(now);
        assert_eq!(input.text(), "hllo");

        input.move_right();
        input.move_right();
        input.move_right();
        input.move_right();
        assert_eq!(input.cursor(), 4);
        input.insert_char('ö', now);
        input.backspace(now);
        assert_eq!(input.text(), "hllo");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let now = Instant::now();
        let mut input = input();
        input.backspace(now);
        assert!(input.is_empty());
        assert!(input.debounce.pending_since.is_none());
    }

    #[test]
    fn test_validation_waits_for_quiet_period() {
        let start = Instant::now();
        let mut input = input();
        input.insert_str("this is far too long", start);

        assert!(!input.poll_validation(start + Duration::from_millis(100)));
        assert!(input.error().is_none());

        // Another keystroke restarts the wait
        input.insert_char('!', start + Duration::from_millis(200));
        assert!(!input.poll_validation(start + Duration::from_millis(400)));

        assert!(input.poll_validation(start + Duration::from_millis(500)));
        assert!(matches!(input.error(), Some(InputError::TooLong { .. })));

        // Only once per burst
        assert!(!input.poll_validation(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_take_validates_and_clears() {
        let now = Instant::now();
        let mut input = input();
        assert_eq!(input.take(), Err(InputError::Empty));
        assert_eq!(input.error(), Some(&InputError::Empty));

        input.insert_str("hi", now);
        assert!(input.error().is_none());
        assert_eq!(input.take(), Ok("hi".to_string()));
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
        assert!(input.debounce.pending_since.is_none());
    }
}
