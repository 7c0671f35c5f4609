//! Typewriter-style text reveal
//!
//! `Revealer` is the pure state machine: it knows the target text, how much of
//! it is on screen, and what the next prefix is. It never touches a clock.
//! `Typewriter` (in `timer`) owns a revealer plus the single pending timer that
//! drives it.

pub mod timer;

pub use timer::{TickScheduler, TickTicket, TokioScheduler, Typewriter};

use std::time::Duration;

/// Delay used when nothing else is configured
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 20;

/// Smallest delay we will ever schedule
pub const MIN_REVEAL_DELAY_MS: u64 = 1;

/// Per-character reveal delay, always at least `MIN_REVEAL_DELAY_MS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealDelay(Duration);

impl RevealDelay {
    /// Build a delay from a (possibly bogus) millisecond value.
    /// Zero and negative values clamp to the minimum instead of failing.
    pub fn from_millis(ms: i64) -> Self {
        let clamped = u64::try_from(ms).unwrap_or(0).max(MIN_REVEAL_DELAY_MS);
        if clamped as i64 != ms {
            tracing::debug!("Reveal delay {}ms clamped to {}ms", ms, clamped);
        }
        Self(Duration::from_millis(clamped))
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }
}

impl Default for RevealDelay {
    fn default() -> Self {
        Self(Duration::from_millis(DEFAULT_REVEAL_DELAY_MS))
    }
}

/// What the owner of a revealer has to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    /// Nothing left to reveal, don't schedule anything
    Idle,
    /// Schedule exactly one more tick
    Tick,
}

#[derive(Debug, Clone, Default)]
pub struct Revealer {
    target: String,
    displayed: String,
    /// Revealed characters (chars, not bytes)
    cursor: usize,
    /// Cached char count of `target`
    target_len: usize,
    revealing: bool,
}

impl Revealer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_revealing(&self) -> bool {
        self.revealing
    }

    /// True when something is on screen and the new target only appends to the old one
    fn is_extension(&self, target: &str) -> bool {
        !self.displayed.is_empty() && target.starts_with(self.target.as_str())
    }

    /// Point the revealer at a new target.
    ///
    /// Appended text (streaming tokens) keeps the cursor where it is. Anything
    /// else, including a target that got shorter, restarts from empty.
    pub fn set_target(&mut self, target: &str) -> RevealStep {
        if self.is_extension(target) {
            self.cursor = self.displayed.chars().count();
        } else if target.is_empty() {
            self.reset();
            return RevealStep::Idle;
        } else {
            self.cursor = 0;
            self.displayed.clear();
        }

        self.target.clear();
        self.target.push_str(target);
        self.target_len = target.chars().count();

        self.next_step()
    }

    /// Reveal one more character.
    pub fn advance(&mut self) -> RevealStep {
        if self.cursor < self.target_len {
            self.cursor += 1;
            let end = self
                .target
                .char_indices()
                .nth(self.cursor)
                .map(|(idx, _)| idx)
                .unwrap_or(self.target.len());
            self.displayed.clear();
            self.displayed.push_str(&self.target[..end]);
        }

        self.next_step()
    }

    /// Show the whole target at once
    pub fn complete(&mut self) {
        self.cursor = self.target_len;
        self.next_step();
    }

    /// Drop all state, as if the revealer had just been created
    pub fn reset(&mut self) {
        self.target.clear();
        self.displayed.clear();
        self.cursor = 0;
        self.target_len = 0;
        self.revealing = false;
    }

    fn next_step(&mut self) -> RevealStep {
        if self.cursor < self.target_len {
            self.revealing = true;
            RevealStep::Tick
        } else {
            self.revealing = false;
            if self.displayed != self.target {
                self.displayed.clone_from(&self.target);
            }
            RevealStep::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(revealer: &mut Revealer, n: usize) {
        for _ in 0..n {
            revealer.advance();
        }
    }

    #[test]
    fn test_delay_clamps_to_minimum() {
        assert_eq!(RevealDelay::from_millis(-5).as_duration(), Duration::from_millis(1));
        assert_eq!(RevealDelay::from_millis(0).as_duration(), Duration::from_millis(1));
        assert_eq!(RevealDelay::from_millis(7).as_duration(), Duration::from_millis(7));
        assert_eq!(
            RevealDelay::default().as_duration(),
            Duration::from_millis(DEFAULT_REVEAL_DELAY_MS)
        );
    }

    #[test]
    fn test_prefix_grows_one_char_per_tick() {
        let target = "Hello, world";
        let len = target.chars().count();
        for n in 0..len + 3 {
            let mut revealer = Revealer::new();
            revealer.set_target(target);
            run_ticks(&mut revealer, n);
            let expected: String = target.chars().take(n.min(len)).collect();
            assert_eq!(revealer.displayed(), expected, "after {} ticks", n);
            assert_eq!(revealer.cursor(), n.min(len));
        }
    }

    #[test]
    fn test_terminates_after_len_ticks() {
        let mut revealer = Revealer::new();
        assert_eq!(revealer.set_target("abc"), RevealStep::Tick);
        assert_eq!(revealer.advance(), RevealStep::Tick);
        assert_eq!(revealer.advance(), RevealStep::Tick);
        assert_eq!(revealer.advance(), RevealStep::Idle);
        assert!(!revealer.is_revealing());
        assert_eq!(revealer.displayed(), "abc");

        // Extra ticks are harmless
        assert_eq!(revealer.advance(), RevealStep::Idle);
        assert_eq!(revealer.displayed(), "abc");
    }

    #[test]
    fn test_two_char_target() {
        let mut revealer = Revealer::new();
        revealer.set_target("Hi");
        assert!(revealer.is_revealing());

        revealer.advance();
        assert_eq!(revealer.displayed(), "H");
        assert!(revealer.is_revealing());

        revealer.advance();
        assert_eq!(revealer.displayed(), "Hi");
        assert!(!revealer.is_revealing());
    }

    #[test]
    fn test_appended_text_continues_from_cursor() {
        let mut revealer = Revealer::new();
        revealer.set_target("Hel");
        run_ticks(&mut revealer, 2);
        assert_eq!(revealer.displayed(), "He");

        assert_eq!(revealer.set_target("Hello"), RevealStep::Tick);
        assert_eq!(revealer.cursor(), 2);
        assert_eq!(revealer.displayed(), "He");

        let mut seen = Vec::new();
        while revealer.advance() == RevealStep::Tick {
            seen.push(revealer.displayed().to_string());
        }
        seen.push(revealer.displayed().to_string());
        assert_eq!(seen, vec!["Hel", "Hell", "Hello"]);
    }

    #[test]
    fn test_appending_after_completion_resumes() {
        let mut revealer = Revealer::new();
        revealer.set_target("Hi");
        run_ticks(&mut revealer, 2);
        assert!(!revealer.is_revealing());

        assert_eq!(revealer.set_target("Hi there"), RevealStep::Tick);
        assert_eq!(revealer.displayed(), "Hi");
        assert_eq!(revealer.cursor(), 2);
    }

    #[test]
    fn test_diverged_target_restarts_from_empty() {
        let mut revealer = Revealer::new();
        revealer.set_target("Hello");
        run_ticks(&mut revealer, 1);
        assert_eq!(revealer.displayed(), "H");

        // "Hi" starts with the displayed "H", but the old target is not a
        // prefix of it, so this is still a restart.
        assert_eq!(revealer.set_target("Hi"), RevealStep::Tick);
        assert_eq!(revealer.displayed(), "");
        assert_eq!(revealer.cursor(), 0);

        revealer.advance();
        assert_eq!(revealer.displayed(), "H");
        revealer.advance();
        assert_eq!(revealer.displayed(), "Hi");
        assert!(!revealer.is_revealing());
    }

    #[test]
    fn test_shrinking_target_restarts_from_empty() {
        // Truncation flickers back to empty. Kept on purpose; change this test
        // if that ever stops being the desired behaviour.
        let mut revealer = Revealer::new();
        revealer.set_target("Hello");
        run_ticks(&mut revealer, 3);
        assert_eq!(revealer.displayed(), "Hel");

        revealer.set_target("He");
        assert_eq!(revealer.displayed(), "");
        assert_eq!(revealer.cursor(), 0);
        assert!(revealer.is_revealing());
    }

    #[test]
    fn test_empty_target_is_idle() {
        let mut revealer = Revealer::new();
        assert_eq!(revealer.set_target(""), RevealStep::Idle);
        assert_eq!(revealer.displayed(), "");
        assert!(!revealer.is_revealing());

        revealer.set_target("abc");
        revealer.advance();
        assert_eq!(revealer.set_target(""), RevealStep::Idle);
        assert_eq!(revealer.displayed(), "");
        assert_eq!(revealer.cursor(), 0);
        assert!(!revealer.is_revealing());
    }

    #[test]
    fn test_same_target_after_completion_stays_idle() {
        let mut revealer = Revealer::new();
        revealer.set_target("done");
        run_ticks(&mut revealer, 4);

        for _ in 0..3 {
            assert_eq!(revealer.set_target("done"), RevealStep::Idle);
            assert!(!revealer.is_revealing());
            assert_eq!(revealer.displayed(), "done");
        }
    }

    #[test]
    fn test_multibyte_characters() {
        let mut revealer = Revealer::new();
        revealer.set_target("héllo 👋");
        run_ticks(&mut revealer, 2);
        assert_eq!(revealer.displayed(), "hé");
        run_ticks(&mut revealer, 5);
        assert_eq!(revealer.displayed(), "héllo 👋");
        assert!(!revealer.is_revealing());
    }

    #[test]
    fn test_complete_then_extend() {
        let mut revealer = Revealer::new();
        revealer.set_target("abc");
        revealer.complete();
        assert_eq!(revealer.displayed(), "abc");
        assert!(!revealer.is_revealing());

        assert_eq!(revealer.set_target("abcd"), RevealStep::Tick);
        assert_eq!(revealer.cursor(), 3);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut revealer = Revealer::new();
        revealer.set_target("abc");
        revealer.advance();
        revealer.reset();
        assert_eq!(revealer.target(), "");
        assert_eq!(revealer.displayed(), "");
        assert_eq!(revealer.cursor(), 0);
        assert!(!revealer.is_revealing());
    }
}
