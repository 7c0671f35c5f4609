//! Offline stand-in for an assistant backend.
//!
//! Replies are canned but streamed word by word, so the UI sees text arriving
//! the way it would from a real model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::AssistantConfig;

static NEXT_REPLY: AtomicU64 = AtomicU64::new(1);

/// Identifies one requested reply. Unique for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyId(u64);

impl ReplyId {
    pub fn next() -> Self {
        Self(NEXT_REPLY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Events streamed by a reply task, stamped with the reply they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantEvent {
    Chunk(ReplyId, String),
    Done(ReplyId),
}

impl AssistantEvent {
    pub fn reply(&self) -> ReplyId {
        match self {
            AssistantEvent::Chunk(id, _) | AssistantEvent::Done(id) => *id,
        }
    }
}

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hola", "yo"];

/// Build the full reply for a prompt
pub fn compose_reply(prompt: &str, assistant_name: &str) -> String {
    let prompt = prompt.trim();
    let first_word = prompt
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("")
        .to_lowercase();

    if GREETINGS.contains(&first_word.as_str()) {
        return format!(
            "Hello! I'm {}. Ask me anything, or type \"help\" to see what I can do.",
            assistant_name
        );
    }

    if prompt.eq_ignore_ascii_case("help") || prompt.eq_ignore_ascii_case("/help") {
        return "Enter sends your message, Alt+Enter adds a new line. \
                Ctrl+R regenerates the last reply, Ctrl+L clears the conversation \
                and Esc skips the typing animation. Ctrl+C quits."
            .to_string();
    }

    let words = prompt.split_whitespace().count();
    if prompt.ends_with('?') {
        format!(
            "Good question. I'm running offline, so I can't look that up, but I read all {} \
             words of it and I'm answering one character at a time anyway.",
            words
        )
    } else {
        format!(
            "You said: \"{}\". {} is a demo assistant, so this reply is canned. \
             It streams in word by word and the typewriter catches up as it arrives.",
            prompt, assistant_name
        )
    }
}

/// Split a reply into streamable chunks. Joining them yields the input.
pub fn chunk_reply(reply: &str) -> Vec<String> {
    reply
        .split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

/// Stream a reply for `prompt` into the app event channel, every event
/// stamped with `id`.
///
/// Abort the returned handle to cancel the reply.
pub fn spawn_reply<E: Send + 'static>(
    id: ReplyId,
    prompt: String,
    settings: &AssistantConfig,
    tx: mpsc::UnboundedSender<E>,
    wrap: fn(AssistantEvent) -> E,
) -> JoinHandle<()> {
    let name = settings.name.clone();
    let chunk_delay = Duration::from_millis(settings.chunk_delay_ms);

    tokio::spawn(async move {
        let reply = compose_reply(&prompt, &name);
        tracing::debug!("Streaming {} byte reply {:?}", reply.len(), id);

        for chunk in chunk_reply(&reply) {
            tokio::time::sleep(chunk_delay).await;
            if tx.send(wrap(AssistantEvent::Chunk(id, chunk))).is_err() {
                return;
            }
        }
        let _ = tx.send(wrap(AssistantEvent::Done(id)));
    })
}
