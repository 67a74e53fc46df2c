// Prompt text for roadmap generation.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::roadmap::models::GenerationRequest;

/// The exact output shape the model is asked to produce.
pub const ROADMAP_SHAPE: &str = r#"{
  "title": "Career Roadmap for [Career]",
  "description": "A brief overview of the career path",
  "steps": [
    {
      "title": "Step title",
      "description": "Detailed description of the step",
      "duration": "Estimated time to complete this step",
      "resources": ["Resource 1", "Resource 2"]
    }
  ]
}"#;

/// Builds the generation prompt. User text is embedded verbatim.
pub fn build_roadmap_prompt(request: &GenerationRequest) -> String {
    format!(
        "Generate a career roadmap in JSON format. {json_only}\n\n\
         For someone who wants to become a {career}, with {experience} experience level \
         and the following goals: {goals}\n\n\
         Required JSON structure:\n{shape}",
        json_only = JSON_ONLY_INSTRUCTION,
        career = request.career(),
        experience = request.experience(),
        goals = request.goals(),
        shape = ROADMAP_SHAPE,
    )
}
