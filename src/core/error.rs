use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;
use crate::shared::validation::{FieldError, ValidationErrorData};

/// Coarse classification clients can rely on through the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid request data")]
    Validation(Vec<FieldError>),

    #[error("Authorization header with Bearer token is required")]
    AccessTokenRequired,

    /// Carries the underlying reason: expired, malformed, verification failure or missing user
    #[error("{0}")]
    InvalidToken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists with this email")]
    UserAlreadyExists,

    #[error("Category already exists")]
    CategoryAlreadyExists,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Cannot delete category with associated movies")]
    CategoryHasMovies,

    #[error("Movie not found")]
    MovieNotFound,

    #[error("{0}")]
    NotFound(String),

    #[error("Route {method} {path} not found")]
    RouteNotFound { method: String, path: String },

    #[error("Internal server error: {0}")]
    Internal(String),

    /// Domain conflict labelled with the operation that hit it
    #[error("{source}")]
    Failed {
        operation: &'static str,
        source: Box<AppError>,
    },
}

/// Internal detail attached to 500 responses. The error-detail middleware decides
/// whether it reaches the client.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

pub const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong";

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::AccessTokenRequired
            | AppError::InvalidToken(_)
            | AppError::InvalidCredentials => ErrorKind::Auth,
            AppError::NotFound(_) | AppError::RouteNotFound { .. } => ErrorKind::NotFound,
            AppError::UserAlreadyExists
            | AppError::CategoryAlreadyExists
            | AppError::CategoryNotFound
            | AppError::CategoryHasMovies
            | AppError::MovieNotFound => ErrorKind::Conflict,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Internal,
            AppError::Failed { source, .. } => source.kind(),
        }
    }

    /// Short label placed in the envelope's `error` field
    pub fn label(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation error",
            AppError::AccessTokenRequired => "Access token required",
            AppError::InvalidToken(_) => "Invalid token",
            AppError::InvalidCredentials => "Login failed",
            AppError::UserAlreadyExists => "Registration failed",
            AppError::CategoryAlreadyExists
            | AppError::CategoryNotFound
            | AppError::CategoryHasMovies
            | AppError::MovieNotFound => "Request failed",
            AppError::NotFound(_) => "Not found",
            AppError::RouteNotFound { .. } => "Route not found",
            AppError::Database(_) | AppError::Internal(_) => "Internal server error",
            AppError::Failed { operation, .. } => *operation,
        }
    }

    /// Puts the failed operation in the envelope label of a domain conflict.
    /// Every other kind keeps its own label.
    pub fn during(self, operation: &'static str) -> Self {
        match self.kind() {
            ErrorKind::Conflict => AppError::Failed {
                operation,
                source: Box::new(self),
            },
            _ => self,
        }
    }

    pub fn validation(field: &str, message: impl Into<String>, code: &str) -> Self {
        AppError::Validation(vec![FieldError::new(field, message, code)])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = kind.status();
        let label = self.label();

        match self {
            AppError::Validation(errors) => {
                let body = ApiResponse::failure(
                    label,
                    "Invalid request data",
                    Some(ValidationErrorData { errors }),
                );
                (status, Json(body)).into_response()
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                internal_response(status, label, e.to_string())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_response(status, label, msg.clone())
            }
            other => {
                let body = ApiResponse::<()>::failure(label, other.to_string(), None);
                (status, Json(body)).into_response()
            }
        }
    }
}

fn internal_response(status: StatusCode, label: &str, detail: String) -> Response {
    let body = ApiResponse::<()>::failure(label, GENERIC_INTERNAL_MESSAGE, None);
    let mut response = (status, Json(body)).into_response();
    response
        .extensions_mut()
        .insert(InternalErrorDetail(detail));
    response
}

pub type Result<T> = std::result::Result<T, AppError>;
