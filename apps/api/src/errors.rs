use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error category surfaced by the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Authentication,
    RateLimit,
    ContentFiltered,
    EmptyResponse,
    Unknown,
}

/// Failures of a single generation request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Profile too short")]
    ProfileTooShort,

    #[error("Job description too short")]
    JobTooShort,

    #[error("Server configuration error")]
    Configuration,

    #[error("Authentication failed")]
    Authentication,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Empty response from AI")]
    EmptyResponse,

    #[error("Internal server error")]
    Unknown,
}

impl GenerationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GenerationError::MissingFields
            | GenerationError::ProfileTooShort
            | GenerationError::JobTooShort => ErrorCategory::Validation,
            GenerationError::Configuration => ErrorCategory::Configuration,
            GenerationError::Authentication => ErrorCategory::Authentication,
            GenerationError::RateLimited => ErrorCategory::RateLimit,
            GenerationError::ContentFiltered => ErrorCategory::ContentFiltered,
            GenerationError::EmptyResponse => ErrorCategory::EmptyResponse,
            GenerationError::Unknown => ErrorCategory::Unknown,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::ContentFiltered => StatusCode::BAD_REQUEST,
            ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
            ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::Configuration
            | ErrorCategory::EmptyResponse
            | ErrorCategory::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing elaboration. `Unknown` exposes nothing beyond its message.
    pub fn details(&self) -> Option<&'static str> {
        match self {
            GenerationError::MissingFields => {
                Some("Both 'profile' and 'job' fields are required")
            }
            GenerationError::ProfileTooShort => {
                Some("Profile must be at least 10 characters long")
            }
            GenerationError::JobTooShort => {
                Some("Job description must be at least 20 characters long")
            }
            GenerationError::Configuration => Some("API key is not configured"),
            GenerationError::Authentication => Some("Invalid or expired API key"),
            GenerationError::RateLimited => {
                Some("API quota limit reached. Please try again later.")
            }
            GenerationError::ContentFiltered => {
                Some("Content was filtered by safety systems. Please try different input.")
            }
            GenerationError::EmptyResponse => Some("The AI service returned an empty response"),
            GenerationError::Unknown => None,
        }
    }
}

/// JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method {0} Not Allowed")]
    MethodNotAllowed(Method),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MethodNotAllowed(method) => {
                let body = Json(ErrorBody {
                    error: format!("Method {method} Not Allowed"),
                    details: None,
                });
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(header::ALLOW, HeaderValue::from_static("POST"))],
                    body,
                )
                    .into_response()
            }
            AppError::Generation(err) => {
                let body = Json(ErrorBody {
                    error: err.to_string(),
                    details: err.details().map(str::to_string),
                });
                (err.status(), body).into_response()
            }
        }
    }
}
