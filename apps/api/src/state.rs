use std::sync::Arc;

use crate::config::CredentialSource;
use crate::llm_client::TextProvider;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup; nothing here is written per request.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn TextProvider>,
    /// Resolved on every generation request, never cached.
    pub credentials: CredentialSource,
}
