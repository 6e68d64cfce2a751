//! Conversation records as loaded from an export archive.
//!
//! A [`ConversationRecord`] is constructed once per archive load and is
//! read-only afterward. Message order is causal: insertion order equals
//! conversation order, and every consumer (prompt building, transcript
//! export, heatmap bucketing) relies on that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author role of a single message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    /// Roles the export schema may add (tool, function, ...). Kept so that
    /// unknown roles never break causal ordering by being dropped.
    #[serde(other)]
    Other,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Other => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One exported chat session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Stable identifier assigned by the source archive.
    pub id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Ordered messages, oldest first.
    pub messages: Vec<Message>,
}

impl ConversationRecord {
    /// Render the conversation as a plain `role: text` transcript, one line
    /// per message, in causal order.
    #[must_use]
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for msg in &self.messages {
            out.push_str(msg.role.as_str());
            out.push_str(": ");
            out.push_str(&msg.text);
            out.push('\n');
        }
        out
    }

    /// Rough token estimate for the full transcript (chars / 4 heuristic).
    #[must_use]
    pub fn estimated_tokens(&self) -> usize {
        self.messages
            .iter()
            .map(|m| (m.text.len() + m.role.as_str().len() + 3) / 4)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(messages: Vec<Message>) -> ConversationRecord {
        ConversationRecord {
            id: "conv-1".to_string(),
            title: Some("demo".to_string()),
            created_at: Utc::now(),
            messages,
        }
    }

    fn msg(role: Role, text: &str) -> Message {
        Message {
            role,
            text: text.to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn transcript_preserves_order_and_roles() {
        let conv = record(vec![
            msg(Role::System, "be brief"),
            msg(Role::User, "hello"),
            msg(Role::Assistant, "hi"),
        ]);
        assert_eq!(conv.transcript(), "system: be brief\nuser: hello\nassistant: hi\n");
    }

    #[test]
    fn unknown_role_deserializes_to_other() {
        let m: Message =
            serde_json::from_str(r#"{"role":"tool","text":"x","timestamp":null}"#).unwrap();
        assert_eq!(m.role, Role::Other);
    }

    #[test]
    fn estimated_tokens_scales_with_length() {
        let short = record(vec![msg(Role::User, "hi")]);
        let long = record(vec![msg(Role::User, &"word ".repeat(400))]);
        assert!(long.estimated_tokens() > short.estimated_tokens());
        assert!(long.estimated_tokens() >= 400);
    }
}
