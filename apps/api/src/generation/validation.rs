//! Input validation for generation requests. Runs before any provider call.

use crate::errors::GenerationError;
use crate::generation::generator::GenerationRequest;

pub const MIN_PROFILE_CHARS: usize = 10;
pub const MIN_JOB_CHARS: usize = 20;

/// Trimmed, length-checked request text.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput<'a> {
    pub profile: &'a str,
    pub job: &'a str,
}

/// Validates a request in a fixed order, stopping at the first failure:
/// presence of both fields, then profile length, then job length.
///
/// Lengths are counted in UTF-16 code units after trimming surrounding whitespace,
/// so characters outside the Basic Multilingual Plane count twice.
pub fn validate_request(
    request: &GenerationRequest,
) -> Result<ValidatedInput<'_>, GenerationError> {
    let (Some(profile), Some(job)) = (
        non_empty(request.profile.as_deref()),
        non_empty(request.job.as_deref()),
    ) else {
        return Err(GenerationError::MissingFields);
    };

    let profile = profile.trim();
    if utf16_len(profile) < MIN_PROFILE_CHARS {
        return Err(GenerationError::ProfileTooShort);
    }

    let job = job.trim();
    if utf16_len(job) < MIN_JOB_CHARS {
        return Err(GenerationError::JobTooShort);
    }

    Ok(ValidatedInput { profile, job })
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
