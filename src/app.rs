use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::assistant::{self, AssistantEvent, ReplyId};
use crate::config::AppConfig;
use crate::input::MessageInput;
use crate::reveal::{TickTicket, TokioScheduler, Typewriter};
use crate::store::{Action, Effect, Store};
use crate::theme::Theme;

/// Status messages clear themselves after this long
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Everything the main loop reacts to
#[derive(Debug)]
pub enum AppEvent {
    Terminal(Event),
    RevealTick(TickTicket),
    Assistant(AssistantEvent),
    /// Periodic housekeeping (spinner, debounced validation, status timeout)
    Tick,
}

pub struct App {
    pub config: AppConfig,
    pub theme: Theme,

    pub store: Store,
    pub input: MessageInput,

    /// Animates the newest assistant reply
    pub typewriter: Typewriter<TokioScheduler<AppEvent>>,

    /// Transcript rows scrolled up from the bottom
    pub scroll_back: u16,
    pub spinner_frame: usize,
    pub should_quit: bool,

    tx: mpsc::UnboundedSender<AppEvent>,
    /// The one reply task whose events are accepted
    reply: Option<(ReplyId, JoinHandle<()>)>,
    status_since: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        let scheduler = TokioScheduler::new(tx.clone(), AppEvent::RevealTick);
        let typewriter = Typewriter::new(scheduler, config.reveal.delay());
        let input = MessageInput::new(
            config.input.max_length,
            Duration::from_millis(config.input.validation_debounce_ms),
        );

        Self {
            theme: Theme::from_config(&config.theme),
            store: Store::new(),
            input,
            typewriter,
            scroll_back: 0,
            spinner_frame: 0,
            should_quit: false,
            tx,
            reply: None,
            status_since: None,
            config,
        }
    }

    /// Text to show for the newest assistant reply
    pub fn revealed_reply(&self) -> &str {
        self.typewriter.displayed()
    }

    /// True while a reply is still streaming in or still being typed out
    pub fn is_busy(&self) -> bool {
        self.store.is_awaiting_reply() || self.typewriter.is_revealing()
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key)?;
            }
            AppEvent::Terminal(Event::Paste(text)) => {
                self.input.insert_str(&text, Instant::now());
            }
            AppEvent::Terminal(_) => {}
            AppEvent::RevealTick(ticket) => {
                self.typewriter.on_tick(ticket);
            }
            AppEvent::Assistant(event) => self.on_assistant_event(event),
            AppEvent::Tick => self.tick(Instant::now()),
        }
        Ok(())
    }

    fn on_assistant_event(&mut self, event: AssistantEvent) {
        let live = self.reply.as_ref().map(|(id, _)| *id);
        if live != Some(event.reply()) {
            tracing::debug!("Dropping event from stale reply {:?}", event.reply());
            return;
        }

        match event {
            AssistantEvent::Chunk(_, chunk) => self.dispatch(Action::AssistantChunk(chunk)),
            AssistantEvent::Done(_) => {
                self.reply = None;
                self.dispatch(Action::AssistantFinished);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let now = Instant::now();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('r') if ctrl => self.dispatch(Action::RegenerateReply),
            KeyCode::Char('l') if ctrl => self.dispatch(Action::ClearConversation),

            // Esc skips the typing animation, or clears the draft when idle
            KeyCode::Esc => {
                if self.typewriter.is_revealing() {
                    self.typewriter.complete();
                } else {
                    self.input.clear();
                }
            }

            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
            {
                self.input.insert_newline(now);
            }
            KeyCode::Enter => self.submit(),

            KeyCode::Backspace => self.input.backspace(now),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),

            KeyCode::Up => self.scroll_back = self.scroll_back.saturating_add(1),
            KeyCode::Down => self.scroll_back = self.scroll_back.saturating_sub(1),
            KeyCode::PageUp => self.scroll_back = self.scroll_back.saturating_add(10),
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(10),

            KeyCode::Char(c) if !ctrl => self.input.insert_char(c, now),
            _ => {}
        }
        Ok(())
    }

    fn submit(&mut self) {
        if self.store.is_awaiting_reply() {
            self.dispatch(Action::SubmitPrompt(self.input.text().to_string()));
            return;
        }
        match self.input.take() {
            Ok(prompt) => {
                self.scroll_back = 0;
                self.dispatch(Action::SubmitPrompt(prompt));
            }
            Err(e) => tracing::debug!("Draft rejected: {}", e),
        }
    }

    /// Run an action through the store, carry out its effects and keep the
    /// typewriter pointed at the newest reply
    pub fn dispatch(&mut self, action: Action) {
        let status_before = self.store.status().map(str::to_string);
        let effects = self.store.dispatch(action);

        for effect in effects {
            self.run_effect(effect);
        }

        if self.store.status() != status_before.as_deref() {
            self.status_since = self.store.status().map(|_| Instant::now());
        }

        self.sync_reveal();
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestReply { prompt } => {
                self.abort_reply();
                let id = ReplyId::next();
                tracing::info!("Requesting reply {:?} ({} chars)", id, prompt.chars().count());
                let task = assistant::spawn_reply(
                    id,
                    prompt,
                    &self.config.assistant,
                    self.tx.clone(),
                    AppEvent::Assistant,
                );
                self.reply = Some((id, task));
            }
            Effect::CancelReply => self.abort_reply(),
        }
    }

    fn abort_reply(&mut self) {
        if let Some((id, task)) = self.reply.take() {
            tracing::debug!("Cancelling in-flight reply {:?}", id);
            task.abort();
        }
    }

    fn sync_reveal(&mut self) {
        match self.store.last_assistant() {
            Some(reply) => {
                self.typewriter.set_target(&reply.content);
                if !self.config.reveal.enabled {
                    self.typewriter.complete();
                }
            }
            None => self.typewriter.reset(),
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        self.input.poll_validation(now);

        if let Some(since) = self.status_since {
            if now.duration_since(since) >= STATUS_TIMEOUT {
                self.status_since = None;
                self.store.dispatch(Action::DismissStatus);
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.abort_reply();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Role;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Terminal(Event::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::CONTROL,
        )))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.reveal.delay_ms = 5;
        config.assistant.chunk_delay_ms = 10;
        config
    }

    /// Pump events until the reply has streamed in and been fully typed out
    async fn settle(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<String> {
        let mut frames = Vec::new();
        while app.is_busy() {
            let event = rx.recv().await.unwrap();
            app.handle_event(event).unwrap();
            frames.push(app.revealed_reply().to_string());
        }
        frames
    }

    #[tokio::test(start_paused = true)]
    async fn test_submitted_prompt_is_typed_out() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);

        type_text(&mut app, "hello");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert!(app.input.is_empty());
        assert!(app.store.is_awaiting_reply());
        assert_eq!(app.store.messages()[0].role, Role::User);

        let frames = settle(&mut app, &mut rx).await;
        let expected = assistant::compose_reply("hello", "Cognit");
        assert_eq!(app.revealed_reply(), expected);
        assert_eq!(app.store.last_assistant().unwrap().content, expected);

        // Streaming only ever appends: the reveal never jumps back
        for pair in frames.windows(2) {
            assert!(pair[1].starts_with(pair[0].as_str()));
        }
        assert!(!app.typewriter.has_pending_tick());
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_skips_animation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);

        type_text(&mut app, "hi");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        while app.revealed_reply().is_empty() {
            let event = rx.recv().await.unwrap();
            app.handle_event(event).unwrap();
        }

        app.handle_event(key(KeyCode::Esc)).unwrap();
        assert!(!app.typewriter.is_revealing());
        assert_eq!(
            app.revealed_reply(),
            app.store.last_assistant().unwrap().content
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_disabled_shows_chunks_at_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut cfg = config();
        cfg.reveal.enabled = false;
        let mut app = App::new(cfg, tx);

        type_text(&mut app, "hi");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        while app.store.is_awaiting_reply() {
            let event = rx.recv().await.unwrap();
            app.handle_event(event).unwrap();
            assert_eq!(
                app.revealed_reply(),
                app.store.last_assistant().unwrap().content
            );
            assert!(!app.typewriter.is_revealing());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_restarts_reveal() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);

        type_text(&mut app, "hello");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        settle(&mut app, &mut rx).await;

        app.handle_event(ctrl('r')).unwrap();
        assert!(app.store.is_awaiting_reply());
        assert_eq!(app.revealed_reply(), "");

        settle(&mut app, &mut rx).await;
        assert_eq!(app.store.messages().len(), 2);
        assert_eq!(
            app.revealed_reply(),
            assistant::compose_reply("hello", "Cognit")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_stops_everything() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);

        type_text(&mut app, "hello");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        let event = rx.recv().await.unwrap();
        app.handle_event(event).unwrap();

        app.handle_event(ctrl('l')).unwrap();
        assert!(app.store.messages().is_empty());
        assert!(!app.is_busy());
        assert!(!app.typewriter.has_pending_tick());
        assert_eq!(app.store.status(), Some("Conversation cleared"));

        // Anything still in the channel is stale and changes nothing
        while let Ok(event) = rx.try_recv() {
            app.handle_event(event).unwrap();
        }
        assert!(app.store.messages().is_empty());
        assert_eq!(app.revealed_reply(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_from_cancelled_reply_are_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);

        type_text(&mut app, "hello");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        // Still queued when the user clears and asks again
        let stale = match rx.recv().await.unwrap() {
            AppEvent::Assistant(event) => event,
            other => panic!("expected an assistant event, got {:?}", other),
        };

        app.handle_event(ctrl('l')).unwrap();
        type_text(&mut app, "again");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        let live = app.reply.as_ref().map(|(id, _)| *id);
        assert!(live.is_some());
        assert_ne!(live, Some(stale.reply()));

        app.handle_event(AppEvent::Assistant(stale.clone())).unwrap();
        assert_eq!(app.store.last_assistant().unwrap().content, "");

        app.handle_event(AppEvent::Assistant(AssistantEvent::Done(stale.reply())))
            .unwrap();
        assert!(app.store.is_awaiting_reply());
        assert_eq!(app.reply.as_ref().map(|(id, _)| *id), live);

        settle(&mut app, &mut rx).await;
        assert_eq!(
            app.store.last_assistant().unwrap().content,
            assistant::compose_reply("again", "Cognit")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_submit_keeps_draft_state() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);

        type_text(&mut app, "   ");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert!(app.store.messages().is_empty());
        assert!(app.input.error().is_some());
        assert_eq!(app.input.text(), "   ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_times_out() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);

        app.handle_event(ctrl('l')).unwrap();
        assert!(app.store.status().is_some());

        let start = Instant::now();
        app.tick(start);
        assert!(app.store.status().is_some());
        app.tick(start + STATUS_TIMEOUT + Duration::from_millis(1));
        assert!(app.store.status().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ctrl_c_quits() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(config(), tx);
        app.handle_event(ctrl('c')).unwrap();
        assert!(app.should_quit);
    }
}
