/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All generation requests MUST go through a `TextProvider`.
///
/// Model: gemini-1.5-flash-latest (hardcoded, one model for every call)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default base URL of the Gemini REST API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for all generation calls.
pub const MODEL: &str = "gemini-1.5-flash-latest";
/// Identifier reported to callers alongside generated text.
pub const PROVIDER_ID: &str = "gemini";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Finish reasons the Gemini API uses when it withholds output.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Provider failures, classified once at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid or expired API key: {0}")]
    InvalidApiKey(String),

    #[error("Quota or rate limit reached: {0}")]
    RateLimited(String),

    #[error("Content blocked: {0}")]
    Blocked(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ProviderError {
    /// Classifies a non-success Gemini response.
    ///
    /// The HTTP status and the API's status string are checked first; the error
    /// message is only inspected when neither is decisive. First match wins:
    /// authentication, then rate limit, then safety blocking.
    pub fn from_api_failure(status: u16, body: &str) -> Self {
        let (message, api_status) = match serde_json::from_str::<GeminiError>(body) {
            Ok(e) => (e.error.message, e.error.status.unwrap_or_default()),
            Err(_) => (body.to_string(), String::new()),
        };

        if status == 401
            || status == 403
            || api_status == "UNAUTHENTICATED"
            || api_status == "PERMISSION_DENIED"
            || message.contains("API key")
        {
            ProviderError::InvalidApiKey(message)
        } else if status == 429
            || api_status == "RESOURCE_EXHAUSTED"
            || message.contains("quota")
            || message.contains("limit")
        {
            ProviderError::RateLimited(message)
        } else if message.contains("blocked") || message.contains("safety") {
            ProviderError::Blocked(message)
        } else {
            ProviderError::Api { status, message }
        }
    }
}

/// Decoding controls passed to the provider on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// A text-generation backend.
///
/// The credential is passed per call; implementations must not store it.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Stable identifier returned to callers, e.g. `"gemini"`.
    fn id(&self) -> &'static str;

    /// Generates a single-turn completion for `prompt`.
    /// Returns the raw (untrimmed) text; an empty string means the provider produced nothing.
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GenerationParams> for GenerationConfig {
    fn from(params: &GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            top_k: params.top_k,
            top_p: params.top_p,
            max_output_tokens: params.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    /// Returns `Blocked` when the prompt or the candidate was withheld.
    fn into_text(self) -> Result<String, ProviderError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Blocked(format!(
                "Prompt was blocked due to {reason}"
            )));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(String::new());
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                return Err(ProviderError::Blocked(format!(
                    "Response was blocked due to {reason}"
                )));
            }
        }

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini `generateContent` client.
/// One HTTP request per call; no retries.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            MODEL
        )
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: params.into(),
        };

        debug!(
            model = MODEL,
            prompt_len = prompt.len(),
            temperature = params.temperature,
            max_output_tokens = params.max_output_tokens,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_api_failure(status.as_u16(), &body));
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        parsed.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/models/gemini-1.5-flash-latest:generateContent";

    fn params() -> GenerationParams {
        GenerationParams {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }

    #[test]
    fn test_classify_invalid_api_key() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err = ProviderError::from_api_failure(400, body);
        assert!(matches!(err, ProviderError::InvalidApiKey(_)));
    }

    #[test]
    fn test_classify_bare_forbidden_as_auth() {
        let body = r#"{"error":{"code":403,"message":"Method doesn't allow unregistered callers.","status":"FORBIDDEN"}}"#;
        let err = ProviderError::from_api_failure(403, body);
        assert!(matches!(err, ProviderError::InvalidApiKey(_)));
    }

    #[test]
    fn test_into_text_every_blocking_finish_reason() {
        for reason in BLOCKING_FINISH_REASONS {
            let response: GenerateContentResponse = serde_json::from_value(json!({
                "candidates": [{"finishReason": reason}]
            }))
            .unwrap();
            assert!(
                matches!(response.into_text(), Err(ProviderError::Blocked(_))),
                "{reason} should block"
            );
        }
    }

    #[test]
    fn test_classify_resource_exhausted() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = ProviderError::from_api_failure(429, body);
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }

    #[test]
    fn test_classify_limit_in_plain_body() {
        let err = ProviderError::from_api_failure(500, "daily limit exceeded");
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }

    #[test]
    fn test_classify_safety_message() {
        let err = ProviderError::from_api_failure(400, "request blocked by safety filters");
        assert!(matches!(err, ProviderError::Blocked(_)));
    }

    #[test]
    fn test_classify_api_key_wins_over_quota() {
        let err = ProviderError::from_api_failure(400, "API key quota exceeded");
        assert!(matches!(err, ProviderError::InvalidApiKey(_)));
    }

    #[test]
    fn test_classify_unrecognized_error() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        match ProviderError::from_api_failure(503, body) {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "The model is overloaded.");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_into_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "world"}]}, "finishReason": "STOP"},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "Hello world");
    }

    #[test]
    fn test_into_text_without_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.into_text().unwrap(), "");
    }

    #[test]
    fn test_into_text_safety_finish_is_blocked() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(matches!(
            response.into_text(),
            Err(ProviderError::Blocked(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_sends_key_header_and_config() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Write something"}]}],
                "generationConfig": {"topK": 40, "maxOutputTokens": 1024}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "  generated  "}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri()).unwrap();
        let text = client
            .generate("test-key", "Write something", &params())
            .await
            .unwrap();

        assert_eq!(text, "  generated  ");
    }

    #[tokio::test]
    async fn test_generate_maps_invalid_key_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri()).unwrap();
        let err = client
            .generate("bad-key", "Write something", &params())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidApiKey(_)));
    }

    #[tokio::test]
    async fn test_generate_maps_blocked_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(format!("{}/", server.uri())).unwrap();
        let err = client
            .generate("test-key", "Write something", &params())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Blocked(_)));
    }
}
