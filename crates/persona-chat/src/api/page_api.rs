//! Session entry points and page display.

use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{redirect_after, respond, session_path};
use crate::shared_state::AppState;

/// Start a fresh session and send the browser to its page.
pub async fn new_session(State(state): State<AppState>) -> Redirect {
    let id = state.app.create_session();
    crate::metrics::inc_request("new_session", "303");
    Redirect::to(&session_path(id))
}

/// Render whatever page the session is on. Unknown or expired sessions
/// start over.
pub async fn show_page(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if !state.app.has_session(&id) {
        info!("Session {} not found, starting a new one", id);
        crate::metrics::inc_request("show_page", "303");
        return Redirect::to("/").into_response();
    }
    respond("show_page", id, state.app.show(&id).await).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
}

pub async fn login(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<LoginForm>,
) -> Result<Response, crate::error::AppError> {
    redirect_after("login", id, state.app.login(&id, &form.username).await)
}
