//! Chat and conversation history models.

use chrono::{DateTime, Local, TimeZone, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Length of locally generated message identifiers
const MESSAGE_ID_LEN: usize = 21;

/// Title shown for history entries the backend left untitled
pub const UNTITLED_CONVERSATION: &str = "Conversa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Assistant,
}

impl From<String> for Role {
    /// Anything other than "user" is treated as the assistant.
    fn from(value: String) -> Self {
        if value == "user" {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

/// A message in the on-screen transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub ts: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            ts: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// The `{role, content}` shape exchanged with `/ai/chat` and `/ai/history/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    /// Lenient conversion: missing or non-string content becomes text, unknown roles
    /// become the assistant.
    pub fn from_value(value: &Value) -> Self {
        let role = match value.get("role") {
            Some(Value::String(r)) => Role::from(r.clone()),
            _ => Role::Assistant,
        };
        let content = match value.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self { role, content }
    }
}

/// An entry of `GET /ai/history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConversationSummary {
    /// Parse one history entry. Entries without an id are skipped by the caller.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = match value.get("id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNTITLED_CONVERSATION)
            .to_string();
        let updated_at = value.get("updatedAt").and_then(parse_timestamp);
        Some(Self { id, title, updated_at })
    }

    /// Local date/time for the history list, empty when unknown.
    pub fn updated_display(&self) -> String {
        self.updated_at
            .map(|ts| ts.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_default()
    }
}

/// Accept epoch milliseconds or an RFC 3339 string.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

pub fn new_message_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(MESSAGE_ID_LEN)
        .map(char::from)
        .collect()
}
