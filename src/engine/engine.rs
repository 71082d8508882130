use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::ClientSettings;
use crate::engine::protocol::{EngineCommand, EngineEvent};
use crate::engine::response_parser::{is_locations_reply, parse_places};
use crate::engine::reveal::{RevealScheduler, RevealSignal};
use crate::engine::transport::{ChatRequest, Transport};
use crate::error::TransportError;
use crate::model::history::HistoryCache;
use crate::model::message::{Message, MessageId, Payload};
use crate::model::session::SessionStore;

const TRUNCATION_MARKER: &str = "...";

/// Flatten control whitespace, trim, and cap the length in characters.
pub fn normalize_message(raw: &str, max_chars: usize) -> String {
    let flat: String = raw
        .chars()
        .map(|c| if matches!(c, '\n' | '\t' | '\r') { ' ' } else { c })
        .collect();
    let trimmed = flat.trim();

    if trimmed.chars().count() > max_chars {
        let head: String = trimmed.chars().take(max_chars).collect();
        format!("{head}{TRUNCATION_MARKER}")
    } else {
        trimmed.to_string()
    }
}

/// Send `request`, retrying immediately on any failure until `attempts` run out.
pub async fn dispatch_with_retry(
    transport: &dyn Transport,
    request: &ChatRequest,
    attempts: u32,
    timeout: Duration,
) -> Result<String, TransportError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match tokio::time::timeout(timeout, transport.send(request)).await {
            Ok(Ok(reply)) => return Ok(reply),
            Ok(Err(e)) => e,
            Err(_) => TransportError::Timeout,
        };

        if attempt >= attempts {
            tracing::error!(attempts, "chat request failed: {}", err);
            return Err(err);
        }

        tracing::warn!(attempt, attempts, "chat request failed, retrying: {}", err);
        attempt += 1;
    }
}

struct DispatchOutcome {
    epoch: u64,
    result: Result<String, TransportError>,
}

/// Cloneable sender of intents into a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    /// Returns false once the engine has stopped.
    pub fn send(&self, cmd: EngineCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn submit(&self, text: impl Into<String>) -> bool {
        self.send(EngineCommand::Submit(text.into()))
    }

    pub fn select_suggestion(&self, text: impl Into<String>) -> bool {
        self.send(EngineCommand::SelectSuggestion(text.into()))
    }

    pub fn select_place(&self, name: impl Into<String>) -> bool {
        self.send(EngineCommand::SelectPlace(name.into()))
    }

    pub fn delete_history_entry(&self, label: impl Into<String>) -> bool {
        self.send(EngineCommand::DeleteHistoryEntry(label.into()))
    }

    pub fn reset_conversation(&self) -> bool {
        self.send(EngineCommand::ResetConversation)
    }

    pub fn toggle_visibility(&self) -> bool {
        self.send(EngineCommand::ToggleVisibility)
    }

    pub fn shutdown(&self) -> bool {
        self.send(EngineCommand::Shutdown)
    }
}

pub struct ConversationEngine {
    settings: ClientSettings,
    transport: Arc<dyn Transport>,

    session: SessionStore,
    history: HistoryCache,
    messages: Vec<Message>,
    next_id: u64,

    busy: bool,
    visible: bool,
    unread: usize,

    /// Bumped on every reset; replies from an older epoch are discarded.
    epoch: u64,

    pending: Option<String>,
    deadline: Option<Instant>,
    dispatch: Option<JoinHandle<()>>,
    dispatch_tx: UnboundedSender<DispatchOutcome>,

    reveals: RevealScheduler,
    events: UnboundedSender<EngineEvent>,
}

impl ConversationEngine {
    /// Start an engine on the current tokio runtime.
    pub fn spawn(
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
    ) -> (EngineHandle, UnboundedReceiver<EngineEvent>, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(Self::run(settings, transport, cmd_rx, event_tx));

        (EngineHandle { tx: cmd_tx }, event_rx, task)
    }

    /// Engine loop. Returns on `Shutdown` or when every handle is dropped.
    pub async fn run(
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
        mut commands: UnboundedReceiver<EngineCommand>,
        events: UnboundedSender<EngineEvent>,
    ) {
        let (reveal_tx, mut reveal_rx) = mpsc::unbounded_channel();
        let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();

        let session = if settings.lazy_session {
            SessionStore::deferred()
        } else {
            SessionStore::new()
        };

        let mut engine = Self {
            reveals: RevealScheduler::new(settings.reveal_timing(), reveal_tx),
            history: HistoryCache::new(settings.history_capacity),
            settings,
            transport,
            session,
            messages: Vec::new(),
            next_id: 0,
            busy: false,
            visible: true,
            unread: 0,
            epoch: 0,
            pending: None,
            deadline: None,
            dispatch: None,
            dispatch_tx,
            events,
        };

        tracing::info!(endpoint = %engine.settings.endpoint, "conversation engine started");
        engine.publish_all();

        loop {
            let deadline = engine.deadline;
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    None | Some(EngineCommand::Shutdown) => break,
                    Some(cmd) => engine.handle(cmd),
                },
                _ = sleep_until(deadline), if deadline.is_some() => engine.fire_debounced(),
                Some(outcome) = dispatch_rx.recv() => engine.complete_dispatch(outcome),
                Some(signal) = reveal_rx.recv() => engine.on_reveal(signal),
            }
        }

        engine.teardown();
        tracing::info!("conversation engine stopped");
    }

    fn handle(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Submit(text)
            | EngineCommand::SelectSuggestion(text)
            | EngineCommand::SelectPlace(text) => self.submit(text),
            EngineCommand::DeleteHistoryEntry(label) => {
                if self.history.remove(&label) {
                    tracing::debug!(label = %label, "forgot remembered question");
                }
                self.publish_labels();
            }
            EngineCommand::ResetConversation => self.reset(),
            EngineCommand::ToggleVisibility => self.set_visible(!self.visible),
            EngineCommand::SetVisible(visible) => self.set_visible(visible),
            EngineCommand::Shutdown => {}
        }
    }

    /* =========================
       Submission
       ========================= */

    fn submit(&mut self, raw: String) {
        if raw.trim().is_empty() {
            return;
        }
        if self.busy {
            tracing::debug!("submission ignored, request in flight");
            return;
        }
        if self.session.current().is_none() {
            let id = self.session.create();
            tracing::debug!(session = %id, "session created, submission dropped");
            self.emit(EngineEvent::SessionChanged(id));
            return;
        }

        // Later calls in the quiet window replace the text and re-arm it.
        self.pending = Some(raw);
        self.deadline = Some(Instant::now() + self.settings.debounce());
    }

    fn fire_debounced(&mut self) {
        self.deadline = None;
        let Some(raw) = self.pending.take() else {
            return;
        };
        let Some(session_id) = self.session.current().cloned() else {
            return;
        };

        let text = normalize_message(&raw, self.settings.max_message_chars);
        self.history.record(text.clone());

        let id = self.next_message_id();
        self.messages.push(Message::user(id, text.clone()));
        self.publish_log();
        self.emit(EngineEvent::ComposerCleared);
        self.publish_labels();

        self.busy = true;
        self.emit(EngineEvent::Busy(true));

        let request = ChatRequest {
            message: text,
            user_id: self.settings.user_id.clone(),
            session_id: session_id.as_str().to_string(),
        };
        let transport = Arc::clone(&self.transport);
        let attempts = self.settings.max_attempts;
        let timeout = self.settings.request_timeout();
        let epoch = self.epoch;
        let tx = self.dispatch_tx.clone();

        tracing::debug!(session = %session_id, "dispatching chat request");
        self.dispatch = Some(tokio::spawn(async move {
            let result = dispatch_with_retry(transport.as_ref(), &request, attempts, timeout).await;
            let _ = tx.send(DispatchOutcome { epoch, result });
        }));
    }

    fn complete_dispatch(&mut self, outcome: DispatchOutcome) {
        if outcome.epoch != self.epoch {
            tracing::debug!("discarding reply from a reset conversation");
            return;
        }
        self.dispatch = None;

        let id = self.next_message_id();
        let message = match outcome.result {
            Ok(raw) => {
                let payload = if is_locations_reply(&raw) {
                    let places = parse_places(&raw);
                    tracing::debug!(count = places.len(), "reply parsed as places");
                    Payload::Locations(places)
                } else {
                    Payload::Text(raw)
                };
                Message::bot(id, payload)
            }
            Err(e) => Message::bot_error(id, e.user_message()),
        };

        self.reveals.schedule(&message);
        self.messages.push(message);
        if !self.visible {
            self.unread += 1;
            self.emit(EngineEvent::Unread(self.unread));
        }
        self.publish_log();

        self.busy = false;
        self.emit(EngineEvent::Busy(false));
    }

    /* =========================
       Reveal
       ========================= */

    fn on_reveal(&mut self, signal: RevealSignal) {
        match self.reveals.accept(signal) {
            Some(RevealSignal::Step { id, shown }) => {
                self.emit(EngineEvent::RevealProgress { id, shown });
            }
            Some(RevealSignal::Finished { id }) => {
                if let Some(msg) = self.messages.iter_mut().find(|m| m.id == id && !m.revealed) {
                    msg.revealed = true;
                    self.publish_log();
                }
            }
            None => {}
        }
    }

    /* =========================
       Reset / visibility / teardown
       ========================= */

    fn reset(&mut self) {
        self.epoch += 1;
        self.pending = None;
        self.deadline = None;
        if let Some(task) = self.dispatch.take() {
            task.abort();
        }
        self.reveals.cancel_all();

        self.messages.clear();
        self.busy = false;
        self.unread = 0;
        self.history.reset();

        let id = self.session.reset();
        tracing::info!(session = %id, "conversation reset");
        self.publish_all();
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.unread = 0;
        }
        self.emit(EngineEvent::Unread(self.unread));
    }

    fn teardown(&mut self) {
        self.pending = None;
        self.deadline = None;
        if let Some(task) = self.dispatch.take() {
            task.abort();
        }
        self.reveals.cancel_all();
    }

    /* =========================
       Publishing
       ========================= */

    fn next_message_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn publish_log(&self) {
        self.emit(EngineEvent::MessageLog(self.messages.clone()));
    }

    fn publish_labels(&self) {
        self.emit(EngineEvent::HistoryLabels(self.history.recent_labels(
            self.settings.label_limit,
            self.settings.label_display_cap,
        )));
    }

    fn publish_all(&self) {
        if let Some(id) = self.session.current() {
            self.emit(EngineEvent::SessionChanged(id.clone()));
        }
        self.publish_log();
        self.emit(EngineEvent::Busy(self.busy));
        self.emit(EngineEvent::Unread(self.unread));
        self.publish_labels();
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
