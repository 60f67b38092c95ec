//! Conversation transcript types and state management

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One chat session: a stable id plus the ordered transcript.
///
/// The transcript is append-only, with one exception: while a reply is
/// streaming, the text of the most recent entry is replaced wholesale with
/// each new snapshot via [`Conversation::replace_last_text`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Session id, generated once at startup and sent with every chat
    /// request. Nil means the session was never started.
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    pub fn is_started(&self) -> bool {
        !self.id.is_nil()
    }

    pub fn push_user(&mut self, text: &str) {
        self.messages.push(Message {
            sender: Sender::User,
            text: text.to_string(),
        });
    }

    pub fn push_assistant(&mut self, text: &str) {
        self.messages.push(Message {
            sender: Sender::Assistant,
            text: text.to_string(),
        });
    }

    /// Append the empty placeholder a streaming reply will fill in.
    pub fn begin_assistant(&mut self) {
        self.push_assistant("");
    }

    /// Overwrite the last entry's text with a full snapshot. No-op on an
    /// empty transcript.
    pub fn replace_last_text(&mut self, snapshot: &str) {
        if let Some(last) = self.messages.last_mut() {
            last.text.clear();
            last.text.push_str(snapshot);
        }
    }

    pub fn last_text(&self) -> Option<&str> {
        self.messages.last().map(|m| m.text.as_str())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_order() {
        let mut conv = Conversation::new();
        conv.push_user("show me pending claims");
        conv.begin_assistant();

        assert!(conv.is_started());
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].sender, Sender::User);
        assert_eq!(conv.messages[1].sender, Sender::Assistant);
        assert_eq!(conv.last_text(), Some(""));
    }

    #[test]
    fn test_replace_last_text_is_a_snapshot_write() {
        let mut conv = Conversation::new();
        conv.push_user("hi");
        conv.begin_assistant();

        conv.replace_last_text("Hel");
        conv.replace_last_text("Hello");

        assert_eq!(conv.last_text(), Some("Hello"));
        // earlier entries are untouched
        assert_eq!(conv.messages[0].text, "hi");
    }

    #[test]
    fn test_replace_on_empty_transcript_is_noop() {
        let mut conv = Conversation::new();
        conv.replace_last_text("ignored");
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let msg = Message {
            sender: Sender::Assistant,
            text: "ok".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"assistant\""));
    }

    #[test]
    fn test_deserialized_without_id_is_not_started() {
        let conv: Conversation = serde_json::from_str("{}").unwrap();
        assert!(!conv.is_started());
    }
}
