//! Roadmap Generation: orchestrates one generation request.
//!
//! Flow: build prompt → model call → strip fences → parse + shape check.
//! Short-circuits on the first failure; never returns a partial roadmap.

use tracing::{debug, info, warn};

use crate::errors::GenerationError;
use crate::llm_client::{LlmError, TextGenerator};
use crate::roadmap::models::{GenerationRequest, RoadmapDocument};
use crate::roadmap::prompts::build_roadmap_prompt;
use crate::roadmap::sanitize::strip_code_fences;
use crate::roadmap::validation::{parse_roadmap, ValidationError};

/// Runs the generation pipeline for an already-validated request.
pub async fn generate_roadmap(
    llm: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<RoadmapDocument, GenerationError> {
    info!(
        career_len = request.career().len(),
        experience_len = request.experience().len(),
        goals_len = request.goals().len(),
        "Generating roadmap"
    );

    let prompt = build_roadmap_prompt(request);
    debug!(prompt_len = prompt.len(), "Roadmap prompt built");

    let raw = llm.generate(&prompt).await.map_err(map_llm_error)?;
    debug!(raw_output = %raw, "Raw model response");

    let cleaned = strip_code_fences(&raw);
    if cleaned.len() != raw.trim().len() {
        debug!("Stripped markdown fences from model response");
    }

    let roadmap = parse_roadmap(cleaned).map_err(|e| match e {
        ValidationError::Malformed(reason) => {
            warn!(raw_output = %raw, "Model response is not valid JSON: {reason}");
            GenerationError::MalformedResponse {
                raw: raw.clone(),
                reason,
            }
        }
        ValidationError::Schema(reason) => {
            warn!(raw_output = %raw, "Model response violates roadmap shape: {reason}");
            GenerationError::SchemaViolation(reason)
        }
    })?;

    info!(steps = roadmap.steps.len(), "Roadmap generated");
    Ok(roadmap)
}

fn map_llm_error(err: LlmError) -> GenerationError {
    match err {
        LlmError::EmptyContent => GenerationError::UpstreamEmpty,
        other => GenerationError::UpstreamUnavailable(other.to_string()),
    }
}
