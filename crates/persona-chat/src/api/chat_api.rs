use axum::{
    extract::{Form, Path, State},
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use super::redirect_after;
use crate::error::AppError;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub message: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    redirect_after("send_message", id, state.app.send_message(&id, &form.message).await)
}

/// Clears the displayed history only; stored rows stay.
pub async fn clear_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    redirect_after("clear_chat", id, state.app.clear_chat(&id).await)
}
