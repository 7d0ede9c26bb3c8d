use axum::http::StatusCode;
use thiserror::Error;

use crate::sheets::SheetsError;
use crate::survey::RatingError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Spreadsheet error: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Unknown or expired session")]
    UnknownSession,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Sheets(_) => StatusCode::BAD_GATEWAY,
            Self::UnknownSession => StatusCode::GONE,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<RatingError> for AppError {
    fn from(err: RatingError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
