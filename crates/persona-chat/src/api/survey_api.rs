use axum::{
    extract::{Form, Path, State},
    response::Response,
};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::redirect_after;
use crate::error::AppError;
use crate::shared_state::AppState;
use crate::survey::Ratings;

/// Form fields `q0`..`q9`, each 1–5.
pub async fn submit_survey(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let ratings = match Ratings::from_form(&fields) {
        Ok(ratings) => ratings,
        Err(e) => return redirect_after("submit_survey", id, Err(e.into())),
    };
    info!("Survey submitted for session {}", id);
    redirect_after("submit_survey", id, state.app.submit_survey(&id, ratings).await)
}

/// "Go to Chat" on the results page.
pub async fn continue_to_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    redirect_after("continue_to_chat", id, state.app.continue_to_chat(&id).await)
}
