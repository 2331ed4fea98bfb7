use anyhow::{Context, Result};

use crate::llm_client::GEMINI_API_BASE;

/// Environment variable holding the Gemini credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Application configuration loaded from environment variables.
///
/// The provider credential is not part of this struct. It is resolved per
/// request through [`CredentialSource`]; a missing key fails only that request.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_base: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| GEMINI_API_BASE.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Where the provider credential comes from.
///
/// `Env` reads the process environment on every call and never caches the value.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Env(&'static str),
    /// In-memory credential for tests; `None` simulates an unset key.
    #[cfg(test)]
    Fixed(Option<String>),
}

impl CredentialSource {
    pub fn from_env() -> Self {
        CredentialSource::Env(API_KEY_VAR)
    }

    /// Name reported in logs when the credential is missing.
    pub fn name(&self) -> &str {
        match self {
            CredentialSource::Env(var) => var,
            #[cfg(test)]
            CredentialSource::Fixed(_) => "fixed credential",
        }
    }

    /// Returns the credential, treating an empty or blank value as absent.
    pub fn resolve(&self) -> Option<String> {
        let value = match self {
            CredentialSource::Env(var) => std::env::var(var).ok(),
            #[cfg(test)]
            CredentialSource::Fixed(value) => value.clone(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_credential_resolves() {
        let source = CredentialSource::Fixed(Some("abc123".to_string()));
        assert_eq!(source.resolve().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_blank_credential_is_absent() {
        assert!(CredentialSource::Fixed(Some("   ".to_string())).resolve().is_none());
        assert!(CredentialSource::Fixed(None).resolve().is_none());
    }

    #[test]
    fn test_unset_env_credential_is_absent() {
        let source = CredentialSource::Env("SNIPPET_API_TEST_UNSET_KEY_VAR");
        assert!(source.resolve().is_none());
        assert_eq!(source.name(), "SNIPPET_API_TEST_UNSET_KEY_VAR");
    }
}
