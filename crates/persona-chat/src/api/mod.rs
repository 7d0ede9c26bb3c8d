//! HTTP handlers. Each one maps to a single `App` event and answers with the
//! rendered view.

pub mod page_api;
pub mod survey_api;
pub mod chat_api;

use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;
use crate::view::{render_error_page, View};

pub use page_api::{new_session, show_page, login};
pub use survey_api::{submit_survey, continue_to_chat};
pub use chat_api::{send_message, clear_chat};

/// Count the request and render the view for the session.
pub(crate) fn respond(
    route: &str,
    session_id: Uuid,
    result: Result<View, AppError>,
) -> Result<Html<String>, AppError> {
    match result {
        Ok(view) => {
            crate::metrics::inc_request(route, "200");
            Ok(Html(view.render(session_id)))
        }
        Err(e) => {
            crate::metrics::inc_request(route, e.status_code().as_str());
            Err(e)
        }
    }
}

/// Answer a form post. Accepted actions redirect back to the session page
/// so a reload repeats the GET and not the post. Rejections that wrote
/// nothing (missing username, missing profile) render in place.
pub(crate) fn redirect_after(
    route: &str,
    session_id: Uuid,
    result: Result<View, AppError>,
) -> Result<Response, AppError> {
    match result {
        Ok(view @ (View::Login { .. } | View::MissingProfile { .. })) => {
            respond(route, session_id, Ok(view)).map(IntoResponse::into_response)
        }
        Ok(_) => {
            crate::metrics::inc_request(route, "303");
            Ok(Redirect::to(&session_path(session_id)).into_response())
        }
        Err(e) => respond(route, session_id, Err(e)).map(IntoResponse::into_response),
    }
}

pub(crate) fn session_path(session_id: Uuid) -> String {
    format!("/s/{}", session_id)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (title, back) = match &self {
            AppError::UnknownSession => ("Session expired", "/"),
            AppError::InvalidInput(_) => ("Invalid input", "javascript:history.back()"),
            AppError::Sheets(_) => ("Something went wrong", "javascript:history.back()"),
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Html(render_error_page(title, &self.to_string(), back))).into_response()
    }
}
