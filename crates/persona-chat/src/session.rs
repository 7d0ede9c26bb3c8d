//! Per-session context and the registry that hands it out.

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::chat::ChatMessage;
use crate::persona::Persona;
use crate::sheets::{Worksheet, PROFILE_SHEET};
use crate::survey::TraitScores;

/// Google Sheets caps worksheet titles at 100 characters.
pub const MAX_USERNAME_CHARS: usize = 100;

const MAX_SESSIONS: u64 = 100_000;

/// Everything remembered between requests of one browser session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub username: Option<String>,
    /// Chosen on first chat-page entry, then kept for the session.
    pub persona: Option<Persona>,
    /// `None` until the history has been loaded from the user's worksheet.
    pub chat_history: Option<Vec<ChatMessage>>,
    /// The user's chat worksheet, once opened.
    pub chat_sheet: Option<Worksheet>,
    pub completed_test: bool,
    pub survey_result: Option<TraitScores>,
}

impl SessionContext {
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    PersonalityTest,
    Chat,
}

impl Page {
    /// Users with a profile chat; everyone else takes the test.
    pub fn route(has_profile: bool) -> Self {
        if has_profile {
            Page::Chat
        } else {
            Page::PersonalityTest
        }
    }
}

/// Trimmed username, or the warning to show instead.
pub fn validate_username(raw: &str) -> Result<String, &'static str> {
    let username = raw.trim();
    if username.is_empty() {
        return Err("Please enter your username.");
    }
    if username.eq_ignore_ascii_case(PROFILE_SHEET) {
        return Err("That username is reserved. Please choose another.");
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err("Usernames can be at most 100 characters.");
    }
    Ok(username.to_string())
}

pub type SessionHandle = Arc<Mutex<SessionContext>>;

/// Live sessions, dropped after a period without requests.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Cache<Uuid, SessionHandle>,
}

impl SessionRegistry {
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(idle)
                .build(),
        }
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .insert(id, Arc::new(Mutex::new(SessionContext::default())));
        info!("Created session {}", id);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  ana "), Ok("ana".to_string()));
        assert_eq!(validate_username("   "), Err("Please enter your username."));
        assert!(validate_username("personality").is_err());
        assert!(validate_username(&"x".repeat(101)).is_err());
        assert!(validate_username(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_route() {
        assert_eq!(Page::route(true), Page::Chat);
        assert_eq!(Page::route(false), Page::PersonalityTest);
    }

    #[tokio::test]
    async fn test_registry_create_and_get() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let id = registry.create();

        let handle = registry.get(&id).unwrap();
        handle.lock().await.username = Some("ana".into());

        let again = registry.get(&id).unwrap();
        assert_eq!(again.lock().await.username.as_deref(), Some("ana"));
        assert!(registry.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = SessionContext::default();
        assert!(!session.is_authenticated());
        assert!(session.chat_history.is_none());
        assert!(!session.completed_test);
    }
}
