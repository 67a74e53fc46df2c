// Roadmap generation: prompt building, model call, fence stripping,
// shape validation and the HTTP handler that ties them together.
// All model calls go through llm_client, never to Gemini directly.

pub mod generator;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod sanitize;
pub mod validation;
