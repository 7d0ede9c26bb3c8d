use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::persona::Persona;
use crate::sheets::{SheetsError, SpreadsheetGateway, Table, Worksheet};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Accepts the stored spellings in any case, plus `ai`/`assistant`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "bot" | "ai" | "assistant" => Some(Role::Bot),
            _ => None,
        }
    }

    /// Spelling written to the Role column.
    pub fn as_stored(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Bot => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self { role: Role::Bot, content: content.into() }
    }
}

/// Rebuild a user's history from their worksheet, in row order. The header
/// row and rows belonging to other usernames are skipped. Any role other
/// than `user` is shown as the bot.
pub fn history_from_table(table: &Table, username: &str) -> Vec<ChatMessage> {
    let mut history = Vec::new();
    for row in table.body() {
        let [name, role, message, ..] = row.as_slice() else {
            continue;
        };
        if name != username {
            continue;
        }
        let role = Role::parse(role).unwrap_or_else(|| {
            debug!("Showing chat row for '{}' with role '{}' as a bot message", username, role);
            Role::Bot
        });
        history.push(ChatMessage { role, content: message.clone() });
    }
    history
}

/// Placeholder reply: the persona prompt followed by the echoed input.
pub fn generate_reply(persona: Persona, user_input: &str) -> String {
    format!("{}\n\n(This is a placeholder reply for: '{}')", persona.prompt(), user_input)
}

pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn message_row(username: &str, message: &ChatMessage, timestamp: &str) -> Vec<Value> {
    vec![
        Value::from(username),
        Value::from(message.role.as_stored()),
        Value::from(message.content.as_str()),
        Value::from(timestamp),
    ]
}

/// Append each message as its own row, in order, all sharing `timestamp`.
pub async fn persist_messages(
    gateway: &SpreadsheetGateway,
    sheet: &Worksheet,
    username: &str,
    messages: &[ChatMessage],
    timestamp: &str,
) -> Result<(), SheetsError> {
    for message in messages {
        gateway
            .append_row(sheet, message_row(username, message, timestamp))
            .await?;
    }
    Ok(())
}
