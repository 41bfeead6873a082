//! API error taxonomy and its JSON rendering.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::db::DbLockError;

/// Errors surfaced to HTTP callers as `{"ok": false, "error": <code>}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("username is missing")]
    MissingUsername,

    #[error("unsupported subject '{0}'")]
    UnsupportedSubject(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("user not found")]
    UserNotFound,

    #[error("username already taken")]
    UsernameTaken,

    #[error("no route for {0}")]
    UnknownRoute(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("server error: {0}")]
    Server(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUsername | Self::UnsupportedSubject(_) | Self::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UserNotFound | Self::UnknownRoute(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingUsername => "NO_USERNAME",
            Self::UnsupportedSubject(_) => "BAD_SUBJECT",
            Self::InvalidInput(_) => "BAD_INPUT",
            Self::UserNotFound => "NO_USER",
            Self::UsernameTaken => "USER_EXISTS",
            Self::UnknownRoute(_) => "NO_ROUTE",
            Self::MethodNotAllowed => "BAD_METHOD",
            Self::Server(_) => "SERVER_ERROR",
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        tracing::error!("Database error: {}", e);
        Self::Server(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<DbLockError> for ApiError {
    fn from(e: DbLockError) -> Self {
        Self::Server(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "ok": false, "error": self.code() });
        // Server details stay in the logs
        if let Self::InvalidInput(message) = &self {
            body["message"] = serde_json::Value::String(message.clone());
        }
        (self.status(), Json(body)).into_response()
    }
}
