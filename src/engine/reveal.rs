use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::engine::response_parser::locations_banner;
use crate::model::message::{Message, MessageId, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Pending,
    Revealing { shown: usize },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealSignal {
    Step { id: MessageId, shown: usize },
    Finished { id: MessageId },
}

#[derive(Debug, Clone, Copy)]
pub struct RevealTiming {
    pub step: Duration,
    /// Extra wait before a locations reply completes.
    pub locations_grace: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(20),
            locations_grace: Duration::from_millis(500),
        }
    }
}

struct Tracked {
    state: RevealState,
    total: usize,
    task: JoinHandle<()>,
}

pub struct RevealScheduler {
    timing: RevealTiming,
    tx: UnboundedSender<RevealSignal>,
    active: HashMap<MessageId, Tracked>,
}

/// The text disclosed character by character for a bot payload.
pub fn reveal_text(payload: &Payload) -> String {
    match payload {
        Payload::Text(text) => text.clone(),
        Payload::Locations(places) => locations_banner(places.len()),
    }
}

fn grace_for(payload: &Payload, timing: &RevealTiming) -> Duration {
    match payload {
        Payload::Text(_) => Duration::ZERO,
        Payload::Locations(_) => timing.locations_grace,
    }
}

impl RevealScheduler {
    pub fn new(timing: RevealTiming, tx: UnboundedSender<RevealSignal>) -> Self {
        Self {
            timing,
            tx,
            active: HashMap::new(),
        }
    }

    /// Start revealing `message`. Returns false when it is already revealed
    /// or already being revealed.
    pub fn schedule(&mut self, message: &Message) -> bool {
        if message.revealed || self.active.contains_key(&message.id) {
            return false;
        }

        let total = reveal_text(&message.payload).chars().count();
        let grace = grace_for(&message.payload, &self.timing);
        let task = tokio::spawn(run_reveal(
            message.id,
            total,
            self.timing.step,
            grace,
            self.tx.clone(),
        ));

        tracing::trace!(id = message.id.0, total, "reveal scheduled");
        self.active.insert(
            message.id,
            Tracked {
                state: RevealState::Pending,
                total,
                task,
            },
        );
        true
    }

    /// `None` for a message that is neither revealed nor tracked.
    pub fn state(&self, message: &Message) -> Option<RevealState> {
        if message.revealed {
            return Some(RevealState::Done);
        }
        self.active.get(&message.id).map(|t| t.state)
    }

    /// Length of the script being disclosed for a tracked message.
    pub fn total(&self, id: MessageId) -> Option<usize> {
        self.active.get(&id).map(|t| t.total)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Validate a signal from a timer task. Returns it back only when it
    /// belongs to a message that is still being revealed; a `Finished` is
    /// returned at most once per message.
    pub fn accept(&mut self, signal: RevealSignal) -> Option<RevealSignal> {
        match signal {
            RevealSignal::Step { id, shown } => {
                let tracked = self.active.get_mut(&id)?;
                tracked.state = RevealState::Revealing { shown };
                Some(signal)
            }
            RevealSignal::Finished { id } => {
                self.active.remove(&id)?;
                Some(signal)
            }
        }
    }

    pub fn cancel(&mut self, id: MessageId) {
        if let Some(tracked) = self.active.remove(&id) {
            tracked.task.abort();
        }
    }

    /// Abort every timer and forget every message.
    pub fn cancel_all(&mut self) {
        for (_, tracked) in self.active.drain() {
            tracked.task.abort();
        }
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        for tracked in self.active.values() {
            tracked.task.abort();
        }
    }
}

async fn run_reveal(
    id: MessageId,
    total: usize,
    step: Duration,
    grace: Duration,
    tx: UnboundedSender<RevealSignal>,
) {
    for shown in 1..=total {
        tokio::time::sleep(step).await;
        if tx.send(RevealSignal::Step { id, shown }).is_err() {
            return;
        }
    }
    if !grace.is_zero() {
        tokio::time::sleep(grace).await;
    }
    let _ = tx.send(RevealSignal::Finished { id });
}
