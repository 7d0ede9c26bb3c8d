//! Event handlers for every user action. Each one locks the session,
//! does its spreadsheet work and returns the view to show next.

use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::{generate_reply, history_from_table, persist_messages, timestamp_now, ChatMessage};
use crate::error::AppError;
use crate::persona::Persona;
use crate::profile_store::{Profile, ProfileStore};
use crate::session::{validate_username, Page, SessionContext, SessionHandle, SessionRegistry};
use crate::sheets::{SheetsError, SpreadsheetGateway, Worksheet};
use crate::survey::{score, Ratings};
use crate::view::View;

const LOGIN_PROMPT: &str = "Please enter your username.";

pub struct App {
    gateway: SpreadsheetGateway,
    profiles: ProfileStore,
    sessions: SessionRegistry,
}

impl App {
    /// Opens the profile worksheet, creating it if needed.
    pub async fn open(
        gateway: SpreadsheetGateway,
        profile_cache_ttl: Duration,
        session_idle: Duration,
    ) -> Result<Self, SheetsError> {
        let profiles = ProfileStore::open(gateway.clone(), profile_cache_ttl).await?;
        Ok(Self {
            gateway,
            profiles,
            sessions: SessionRegistry::new(session_idle),
        })
    }

    pub fn create_session(&self) -> Uuid {
        self.sessions.create()
    }

    pub fn has_session(&self, id: &Uuid) -> bool {
        self.sessions.get(id).is_some()
    }

    fn session(&self, id: &Uuid) -> Result<SessionHandle, AppError> {
        self.sessions.get(id).ok_or(AppError::UnknownSession)
    }

    /// Current page for the session.
    pub async fn show(&self, id: &Uuid) -> Result<View, AppError> {
        let handle = self.session(id)?;
        let mut ctx = handle.lock().await;
        self.current_view(&mut ctx).await
    }

    /// Capture the username. Ignored once a username is set.
    pub async fn login(&self, id: &Uuid, raw_username: &str) -> Result<View, AppError> {
        let handle = self.session(id)?;
        let mut ctx = handle.lock().await;

        if !ctx.is_authenticated() {
            match validate_username(raw_username) {
                Ok(username) => {
                    info!("Session {} logged in as '{}'", id, username);
                    ctx.username = Some(username);
                }
                Err(warning) => {
                    return Ok(View::Login { warning: Some(warning.to_string()) });
                }
            }
        }

        self.current_view(&mut ctx).await
    }

    /// Score the answers and write the profile row. The results stay on
    /// screen until the user moves on to the chat.
    pub async fn submit_survey(&self, id: &Uuid, ratings: Ratings) -> Result<View, AppError> {
        let handle = self.session(id)?;
        let mut ctx = handle.lock().await;

        let Some(username) = ctx.username.clone() else {
            return Ok(login_view());
        };

        if self.profiles.exists(&username).await? {
            warn!("Ignoring survey resubmission for '{}': profile already exists", username);
            return self.current_view(&mut ctx).await;
        }

        let scores = score(&ratings);
        self.profiles.create(&Profile::new(username.as_str(), scores)).await?;

        ctx.completed_test = true;
        ctx.survey_result = Some(scores);

        Ok(View::Survey {
            username,
            result: Some(scores),
            completed: true,
        })
    }

    /// Leave the survey results page.
    pub async fn continue_to_chat(&self, id: &Uuid) -> Result<View, AppError> {
        let handle = self.session(id)?;
        let mut ctx = handle.lock().await;
        ctx.survey_result = None;
        self.current_view(&mut ctx).await
    }

    /// Record the user's message and the placeholder reply.
    pub async fn send_message(&self, id: &Uuid, input: &str) -> Result<View, AppError> {
        let handle = self.session(id)?;
        let mut ctx = handle.lock().await;

        let Some(username) = ctx.username.clone() else {
            return Ok(login_view());
        };
        let Some(profile) = self.profiles.find(&username).await? else {
            return Ok(View::MissingProfile { username });
        };

        ctx.survey_result = None;
        self.prepare_chat(&mut ctx, &username, &profile).await?;

        let input = input.trim();
        if !input.is_empty() {
            let persona = *ctx.persona.get_or_insert_with(|| Persona::select(&profile.scores));
            let messages = [
                ChatMessage::user(input),
                ChatMessage::bot(generate_reply(persona, input)),
            ];
            let timestamp = timestamp_now();
            let sheet = self.chat_sheet(&mut ctx, &username).await?;

            persist_messages(&self.gateway, &sheet, &username, &messages, &timestamp).await?;
            ctx.chat_history
                .get_or_insert_with(Vec::new)
                .extend(messages);
        }

        Ok(chat_view(&ctx, username))
    }

    /// Empty the on-screen history. Stored rows are left alone.
    pub async fn clear_chat(&self, id: &Uuid) -> Result<View, AppError> {
        let handle = self.session(id)?;
        let mut ctx = handle.lock().await;

        let Some(username) = ctx.username.clone() else {
            return Ok(login_view());
        };
        if self.profiles.find(&username).await?.is_none() {
            return Ok(View::MissingProfile { username });
        }

        ctx.survey_result = None;
        ctx.chat_history = Some(Vec::new());
        info!("Cleared displayed chat history for '{}'", username);
        Ok(chat_view(&ctx, username))
    }

    async fn current_view(&self, ctx: &mut SessionContext) -> Result<View, AppError> {
        let Some(username) = ctx.username.clone() else {
            return Ok(login_view());
        };

        if let Some(scores) = ctx.survey_result {
            return Ok(View::Survey {
                username,
                result: Some(scores),
                completed: ctx.completed_test,
            });
        }

        let profile = self.profiles.find(&username).await?;
        match (Page::route(profile.is_some()), profile) {
            (Page::Chat, Some(profile)) => {
                self.prepare_chat(ctx, &username, &profile).await?;
                Ok(chat_view(ctx, username))
            }
            _ => Ok(View::Survey {
                username,
                result: None,
                completed: ctx.completed_test,
            }),
        }
    }

    /// Persona and history are set up once per session.
    async fn prepare_chat(
        &self,
        ctx: &mut SessionContext,
        username: &str,
        profile: &Profile,
    ) -> Result<(), AppError> {
        if ctx.persona.is_none() {
            ctx.persona = Some(Persona::select(&profile.scores));
        }

        if ctx.chat_history.is_none() {
            let sheet = self.chat_sheet(ctx, username).await?;
            let table = self.gateway.read_all(&sheet).await?;
            let history = history_from_table(&table, username);
            info!("Loaded {} chat messages for '{}'", history.len(), username);
            ctx.chat_history = Some(history);
        }
        Ok(())
    }

    async fn chat_sheet(&self, ctx: &mut SessionContext, username: &str) -> Result<Worksheet, AppError> {
        if let Some(ref sheet) = ctx.chat_sheet {
            return Ok(sheet.clone());
        }
        let sheet = self.gateway.open_or_create_user_sheet(username).await?;
        ctx.chat_sheet = Some(sheet.clone());
        Ok(sheet)
    }
}

fn login_view() -> View {
    View::Login { warning: Some(LOGIN_PROMPT.to_string()) }
}

fn chat_view(ctx: &SessionContext, username: String) -> View {
    View::Chat {
        username,
        history: ctx.chat_history.clone().unwrap_or_default(),
    }
}
