use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;
use std::io;
use thiserror::Error;

/// Message sent to clients for every internal failure.
pub const SERVER_ERROR: &str = "Server Error";

/// Message sent when an item or collection does not exist.
pub const ITEMS_NOT_FOUND: &str = "Items Not Found";

/// Failures that are never shown to the client in detail.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("store io: {0}")]
    Io(#[from] io::Error),
    #[error("invalid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("request body: {0}")]
    Body(axum::Error),
    #[error("store task failed: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// A user-facing failure carrying its own status and message.
    #[error("{status}: {message}")]
    Domain { status: StatusCode, message: String },
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    pub fn not_found() -> Self {
        Error::Domain {
            status: StatusCode::NOT_FOUND,
            message: ITEMS_NOT_FOUND.to_owned(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Domain { status, .. } => *status,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Internal(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Domain { status, message } => {
                (status, Json(json!({ "message": message }))).into_response()
            }
            Error::Internal(err) => {
                error!("request failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": SERVER_ERROR })),
                )
                    .into_response()
            }
        }
    }
}
