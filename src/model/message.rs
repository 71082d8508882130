use serde::{Deserialize, Serialize};

use crate::model::place::Place;

/// Stable identifier of a message, unique for the lifetime of an engine.
/// Ids are never reused, not even across a conversation reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    Locations(Vec<Place>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub payload: Payload,

    /// False only for bot replies still waiting on their reveal.
    pub revealed: bool,
}

impl Message {
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            payload: Payload::Text(text.into()),
            revealed: true,
        }
    }

    /// A bot reply that still has to go through the reveal scheduler.
    pub fn bot(id: MessageId, payload: Payload) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            payload,
            revealed: false,
        }
    }

    /// Error replies are shown at full length straight away.
    pub fn bot_error(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            payload: Payload::Text(text.into()),
            revealed: true,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(t) => Some(t),
            Payload::Locations(_) => None,
        }
    }

    pub fn locations(&self) -> Option<&[Place]> {
        match &self.payload {
            Payload::Locations(places) => Some(places),
            Payload::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_start_revealed() {
        let msg = Message::user(MessageId(1), "xin chào");
        assert!(msg.revealed);
        assert!(!msg.is_bot());
        assert_eq!(msg.text(), Some("xin chào"));
    }

    #[test]
    fn test_bot_replies_start_unrevealed() {
        let msg = Message::bot(MessageId(2), Payload::Locations(vec![]));
        assert!(!msg.revealed);
        assert!(msg.is_bot());
        assert!(msg.text().is_none());
        assert_eq!(msg.locations().map(|p| p.len()), Some(0));
    }

    #[test]
    fn test_bot_errors_skip_reveal() {
        let msg = Message::bot_error(MessageId(3), "lỗi");
        assert!(msg.revealed);
        assert!(msg.is_bot());
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_string(&Sender::Bot).unwrap();
        assert_eq!(json, "\"bot\"");
    }
}
