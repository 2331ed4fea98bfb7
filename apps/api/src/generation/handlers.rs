//! Axum route handlers for the Generation API.

use axum::{body::Bytes, extract::State, http::Method, Json};
use tracing::warn;

use crate::errors::AppError;
use crate::generation::generator::{generate_snippet, GenerationRequest, GenerationResult};
use crate::state::AppState;

/// POST /api/generate
///
/// Validates the body, builds the resume prompt and returns the provider's trimmed text.
/// A body that is not a JSON object is treated as having no fields.
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerationResult>, AppError> {
    let request = serde_json::from_slice::<GenerationRequest>(&body).unwrap_or_else(|e| {
        warn!(
            "Undecodable generation request body: {}",
            decode_error_summary(&e)
        );
        GenerationRequest::default()
    });

    let result = generate_snippet(state.provider.as_ref(), &state.credentials, &request).await?;

    Ok(Json(result))
}

/// Category and position of a body decode failure.
/// Never includes the serde message, which can quote request content.
fn decode_error_summary(e: &serde_json::Error) -> String {
    format!(
        "{:?} error at line {} column {}",
        e.classify(),
        e.line(),
        e.column()
    )
}

/// Any non-POST method on /api/generate.
pub async fn handle_method_not_allowed(method: Method) -> AppError {
    warn!("Rejected {method} request to generation endpoint");
    AppError::MethodNotAllowed(method)
}
