// Prompt template for resume snippet generation.

/// Resume snippet prompt template. Replace `{profile}` and `{job}` before sending.
pub const RESUME_SNIPPET_PROMPT_TEMPLATE: &str = r#"You are an expert resume writer and career coach. Generate a professional resume snippet based on the following information.

USER PROFILE:
{profile}

JOB DESCRIPTION:
{job}

Please provide a well-structured resume snippet with:

1. PROFESSIONAL SUMMARY (2-3 sentences that highlight key strengths and align with the job)
2. KEY ACHIEVEMENTS (3-4 bullet points with quantifiable results when possible)
3. RELEVANT SKILLS (extracted from both profile and job requirements)
4. ATS OPTIMIZATION NOTES (brief suggestions for keyword alignment)

Format your response in clear sections. Focus on:
- Quantifiable achievements and impact
- Keywords that match the job description
- Professional tone and compelling narrative
- ATS-friendly formatting suggestions

Make it specific, impactful, and tailored to this exact role."#;

/// Builds the generation prompt from already-trimmed inputs.
///
/// Placeholders are substituted in one pass, so a profile containing the
/// literal text `{job}` is not expanded a second time.
pub fn build_resume_prompt(profile: &str, job: &str) -> String {
    let (head, rest) = RESUME_SNIPPET_PROMPT_TEMPLATE
        .split_once("{profile}")
        .unwrap_or((RESUME_SNIPPET_PROMPT_TEMPLATE, ""));
    let (middle, tail) = rest.split_once("{job}").unwrap_or((rest, ""));

    let mut prompt = String::with_capacity(
        RESUME_SNIPPET_PROMPT_TEMPLATE.len() + profile.len() + job.len(),
    );
    prompt.push_str(head);
    prompt.push_str(profile);
    prompt.push_str(middle);
    prompt.push_str(job);
    prompt.push_str(tail);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_interpolates_both_fields() {
        let prompt = build_resume_prompt("Rust engineer", "Build distributed storage");
        assert!(prompt.contains("USER PROFILE:\nRust engineer\n"));
        assert!(prompt.contains("JOB DESCRIPTION:\nBuild distributed storage\n"));
        assert!(!prompt.contains("{profile}"));
        assert!(!prompt.contains("{job}"));
    }

    #[test]
    fn test_prompt_requests_all_four_sections() {
        let prompt = build_resume_prompt("p", "j");
        for section in [
            "PROFESSIONAL SUMMARY",
            "KEY ACHIEVEMENTS",
            "RELEVANT SKILLS",
            "ATS OPTIMIZATION NOTES",
        ] {
            assert!(prompt.contains(section), "missing section {section}");
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_resume_prompt("same profile", "same job"),
            build_resume_prompt("same profile", "same job")
        );
    }

    #[test]
    fn test_placeholder_in_profile_is_not_expanded() {
        let prompt = build_resume_prompt("I write {job} templates", "Template engineer role");
        assert!(prompt.contains("I write {job} templates"));
    }
}
