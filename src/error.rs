use axum::{
    Json,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::db::models::ExchangeStatus;
use crate::security::token::TokenError;

#[derive(Debug, ThisError)]
pub enum BookswapError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ExchangeStatus,
        to: ExchangeStatus,
    },

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("Could not validate credentials: {0}")]
    Token(#[from] TokenError),

    #[error("Failed to issue access token: {0}")]
    TokenIssue(TokenError),

    #[error("Inactive user")]
    InactiveUser,

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl BookswapError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookswapError::Validation(_)
            | BookswapError::InvalidReference(_)
            | BookswapError::Conflict(_)
            | BookswapError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            BookswapError::InvalidCredentials
            | BookswapError::Unauthorized
            | BookswapError::Token(_) => StatusCode::UNAUTHORIZED,
            BookswapError::InactiveUser => StatusCode::FORBIDDEN,
            BookswapError::NotFound(_) => StatusCode::NOT_FOUND,
            BookswapError::DatabaseError(e) if is_constraint_violation(e) => {
                StatusCode::BAD_REQUEST
            }
            BookswapError::DatabaseError(_)
            | BookswapError::PasswordHash(_)
            | BookswapError::Join(_)
            | BookswapError::TokenIssue(_)
            | BookswapError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ApiErrorBody {
        let (code, message) = match self {
            BookswapError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            BookswapError::InvalidReference(_) => ("INVALID_REFERENCE", self.to_string()),
            BookswapError::Conflict(_) => ("CONFLICT", self.to_string()),
            BookswapError::InvalidTransition { .. } => ("INVALID_TRANSITION", self.to_string()),
            BookswapError::InvalidCredentials => ("UNAUTHORIZED", self.to_string()),
            // Token failure reasons stay in the logs.
            BookswapError::Unauthorized | BookswapError::Token(_) => (
                "UNAUTHORIZED",
                BookswapError::Unauthorized.to_string(),
            ),
            BookswapError::InactiveUser => ("INACTIVE_USER", self.to_string()),
            BookswapError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            BookswapError::DatabaseError(SqlxError::Database(db_err))
                if db_err.is_unique_violation() =>
            {
                ("CONFLICT", unique_violation_message(db_err.message()))
            }
            BookswapError::DatabaseError(SqlxError::Database(db_err))
                if db_err.is_foreign_key_violation() =>
            {
                (
                    "INVALID_REFERENCE",
                    "Referenced record does not exist or is still in use".to_string(),
                )
            }
            BookswapError::DatabaseError(_)
            | BookswapError::PasswordHash(_)
            | BookswapError::Join(_)
            | BookswapError::TokenIssue(_)
            | BookswapError::Config(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };
        ApiErrorBody {
            code: code.to_string(),
            message,
        }
    }
}

fn is_constraint_violation(e: &SqlxError) -> bool {
    match e {
        SqlxError::Database(db_err) => {
            db_err.is_unique_violation() || db_err.is_foreign_key_violation()
        }
        _ => false,
    }
}

/// SQLite reports `UNIQUE constraint failed: users.email`.
fn unique_violation_message(raw: &str) -> String {
    match raw.rsplit_once(": ") {
        Some((_, columns)) => {
            let field = columns
                .split(',')
                .next()
                .and_then(|c| c.trim().rsplit('.').next())
                .unwrap_or("value");
            format!("{field} already registered")
        }
        None => "Duplicate value".to_string(),
    }
}

impl IntoResponse for BookswapError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(ApiErrorResponse { error: self.body() });
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
