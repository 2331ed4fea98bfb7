// Resume snippet generation: request validation, prompt templating and provider delegation.
// All provider calls go through llm_client — no direct Gemini HTTP calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod validation;
