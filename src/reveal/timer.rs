//! Timer plumbing for the typewriter effect
//!
//! Reveal is driven by a chain of single-shot timers, never an interval. Each
//! timer carries a `TickTicket`; only the ticket of the one pending timer is
//! accepted, so a tick that was already in flight when its timer got cancelled
//! can't advance the cursor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{RevealDelay, RevealStep, Revealer};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Token posted by a timer when it fires.
/// Generations are unique for the whole process, not per typewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickTicket {
    generation: u64,
}

impl TickTicket {
    fn next() -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Handle to one scheduled tick
pub trait TimerHandle {
    /// Make sure the tick never fires
    fn cancel(self);
}

/// Something that can fire a ticket once after a delay
pub trait TickScheduler {
    type Handle: TimerHandle;

    fn schedule(&mut self, delay: Duration, ticket: TickTicket) -> Self::Handle;
}

/// Schedules ticks as tokio tasks that post into the app event channel.
///
/// The task only sends a message; it never touches reveal state itself.
pub struct TokioScheduler<E> {
    tx: mpsc::UnboundedSender<E>,
    wrap: fn(TickTicket) -> E,
}

impl<E> TokioScheduler<E> {
    pub fn new(tx: mpsc::UnboundedSender<E>, wrap: fn(TickTicket) -> E) -> Self {
        Self { tx, wrap }
    }
}

pub struct TokioTimer {
    handle: JoinHandle<()>,
}

impl TimerHandle for TokioTimer {
    fn cancel(self) {
        self.handle.abort();
    }
}

impl<E: Send + 'static> TickScheduler for TokioScheduler<E> {
    type Handle = TokioTimer;

    fn schedule(&mut self, delay: Duration, ticket: TickTicket) -> TokioTimer {
        let tx = self.tx.clone();
        let event = (self.wrap)(ticket);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(event).is_err() {
                tracing::debug!("Reveal tick {} dropped, receiver gone", ticket.generation);
            }
        });

        TokioTimer { handle }
    }
}

/// A revealer together with the timer chain that animates it.
///
/// At most one tick is pending at any time. Dropping the typewriter cancels it.
pub struct Typewriter<S: TickScheduler> {
    revealer: Revealer,
    delay: RevealDelay,
    scheduler: S,
    pending: Option<(TickTicket, S::Handle)>,
}

impl<S: TickScheduler> Typewriter<S> {
    pub fn new(scheduler: S, delay: RevealDelay) -> Self {
        Self {
            revealer: Revealer::new(),
            delay,
            scheduler,
            pending: None,
        }
    }

    pub fn displayed(&self) -> &str {
        self.revealer.displayed()
    }

    pub fn is_revealing(&self) -> bool {
        self.revealer.is_revealing()
    }

    pub fn cursor(&self) -> usize {
        self.revealer.cursor()
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed the latest target text.
    pub fn set_target(&mut self, target: &str) {
        // Same target with a tick already on the way: the chain is running
        if self.pending.is_some() && self.revealer.target() == target {
            return;
        }

        self.cancel_pending();
        if self.revealer.set_target(target) == RevealStep::Tick {
            self.schedule_next();
        }
    }

    /// Apply a fired tick. Returns false for stale tickets, which are ignored.
    pub fn on_tick(&mut self, ticket: TickTicket) -> bool {
        match &self.pending {
            Some((pending, _)) if *pending == ticket => {}
            _ => {
                tracing::debug!("Ignoring stale reveal tick {}", ticket.generation);
                return false;
            }
        }

        // The timer has fired, nothing left to cancel
        self.pending = None;

        if self.revealer.advance() == RevealStep::Tick {
            self.schedule_next();
        }
        true
    }

    /// Jump straight to the full target and stop the timer chain
    pub fn complete(&mut self) {
        self.cancel_pending();
        self.revealer.complete();
    }

    pub fn reset(&mut self) {
        self.cancel_pending();
        self.revealer.reset();
    }

    fn schedule_next(&mut self) {
        let ticket = TickTicket::next();
        let handle = self.scheduler.schedule(self.delay.as_duration(), ticket);
        self.pending = Some((ticket, handle));
    }

    fn cancel_pending(&mut self) {
        if let Some((ticket, handle)) = self.pending.take() {
            tracing::debug!("Cancelling reveal tick {}", ticket.generation);
            handle.cancel();
        }
    }
}

impl<S: TickScheduler> Drop for Typewriter<S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
