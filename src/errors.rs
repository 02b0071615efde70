use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

use crate::models::workflow::WorkflowError;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
    Io(std::io::Error),
    Hash(String),
    Session(String),
    Validation(String),
    DuplicateUser(String),
    InvalidCredentials,
    Unauthenticated,
    PermissionDenied(String),
    InvalidTransition(String),
    TooManyAttempts,
    NotFound,
}

/// JSON body for every error response.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    /// Machine-readable error kind returned to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::DuplicateUser(_) => "DuplicateUser",
            AppError::InvalidCredentials => "InvalidCredentials",
            AppError::Unauthenticated => "Unauthenticated",
            AppError::PermissionDenied(_) => "Unauthorized",
            AppError::InvalidTransition(_) => "InvalidTransition",
            AppError::TooManyAttempts => "TooManyAttempts",
            AppError::NotFound => "NotFound",
            AppError::Db(_)
            | AppError::Migrate(_)
            | AppError::Io(_)
            | AppError::Hash(_)
            | AppError::Session(_) => "InternalError",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Migrate(e) => write!(f, "Migration error: {e}"),
            AppError::Io(e) => write!(f, "I/O error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Validation(msg) => write!(f, "{msg}"),
            AppError::DuplicateUser(username) => write!(f, "Username '{username}' is already taken"),
            AppError::InvalidCredentials => write!(f, "Invalid username or password"),
            AppError::Unauthenticated => write!(f, "Authentication credentials were not provided or are invalid"),
            AppError::PermissionDenied(msg) => write!(f, "{msg}"),
            AppError::InvalidTransition(msg) => write!(f, "{msg}"),
            AppError::TooManyAttempts => write!(f, "Too many failed login attempts. Please try again later."),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateUser(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{self}");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ApiErrorResponse {
            error: self.kind(),
            message,
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::Db(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Migrate(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::Unauthorized(msg) => AppError::PermissionDenied(msg),
            WorkflowError::Validation(msg) => AppError::Validation(msg),
            invalid @ WorkflowError::InvalidTransition { .. } => {
                AppError::InvalidTransition(invalid.to_string())
            }
        }
    }
}

/// Convert a validator error list into a single `Validation` error, if any.
pub fn check(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors.join("; ")))
    }
}
