//! Resume snippet generation — validate → resolve credential → prompt → provider → post-process.
//!
//! Every call is independent: no state survives past the returned result.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::CredentialSource;
use crate::errors::GenerationError;
use crate::generation::prompts::build_resume_prompt;
use crate::generation::validation::validate_request;
use crate::llm_client::{GenerationParams, ProviderError, TextProvider};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const TOP_K: u32 = 40;
pub const TOP_P: f32 = 0.95;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for snippet generation.
///
/// Every field decodes leniently: a value of the wrong JSON type counts as unset.
/// A missing or mistyped `profile`/`job` is then reported by validation, and a
/// mistyped parameter falls back to its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub profile: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job: Option<String>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub temperature: Option<f32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub max_tokens: Option<u32>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        _ => None,
    })
}

/// Accepts only non-negative integers that fit in `u32`.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        _ => None,
    })
}

impl GenerationRequest {
    /// Decoding parameters for this request. A zero value counts as unset.
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self
                .temperature
                .filter(|t| *t != 0.0)
                .unwrap_or(DEFAULT_TEMPERATURE),
            top_k: TOP_K,
            top_p: TOP_P,
            max_output_tokens: self
                .max_tokens
                .filter(|n| *n != 0)
                .unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

/// Successful generation output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub provider: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs one generation request end to end.
///
/// Validation and the credential check both happen before the provider is
/// contacted. Provider failures are mapped onto `GenerationError`; nothing is retried.
pub async fn generate_snippet(
    provider: &dyn TextProvider,
    credentials: &CredentialSource,
    request: &GenerationRequest,
) -> Result<GenerationResult, GenerationError> {
    let input = validate_request(request).inspect_err(|e| {
        warn!(reason = %e, "Rejected generation request");
    })?;

    let Some(api_key) = credentials.resolve() else {
        error!("{} is not configured", credentials.name());
        return Err(GenerationError::Configuration);
    };

    let prompt = build_resume_prompt(input.profile, input.job);
    let params = request.params();

    info!(
        provider = provider.id(),
        profile_chars = input.profile.chars().count(),
        job_chars = input.job.chars().count(),
        "Calling generation provider"
    );

    let raw = provider
        .generate(&api_key, &prompt, &params)
        .await
        .map_err(|e| {
            error!(provider = provider.id(), error = %e, "Generation provider call failed");
            map_provider_error(&e)
        })?;

    let text = raw.trim();
    if text.is_empty() {
        error!(provider = provider.id(), "Generation provider returned empty text");
        return Err(GenerationError::EmptyResponse);
    }

    info!(
        provider = provider.id(),
        output_chars = text.chars().count(),
        "Successfully generated resume content"
    );

    Ok(GenerationResult {
        text: text.to_string(),
        provider: provider.id().to_string(),
    })
}

fn map_provider_error(err: &ProviderError) -> GenerationError {
    match err {
        ProviderError::InvalidApiKey(_) => GenerationError::Authentication,
        ProviderError::RateLimited(_) => GenerationError::RateLimited,
        ProviderError::Blocked(_) => GenerationError::ContentFiltered,
        ProviderError::Api { .. } | ProviderError::Http(_) | ProviderError::Parse(_) => {
            GenerationError::Unknown
        }
    }
}
