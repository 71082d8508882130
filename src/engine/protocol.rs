use crate::model::message::{Message, MessageId};
use crate::model::session::SessionId;

/// Intents raised by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Submit(String),
    SelectSuggestion(String),
    SelectPlace(String),
    DeleteHistoryEntry(String),
    ResetConversation,
    ToggleVisibility,
    SetVisible(bool),
    Shutdown,
}

/// State published by the engine. Renderers keep the latest of each kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MessageLog(Vec<Message>),
    Busy(bool),
    Unread(usize),
    HistoryLabels(Vec<String>),
    ComposerCleared,
    RevealProgress { id: MessageId, shown: usize },
    SessionChanged(SessionId),
}
