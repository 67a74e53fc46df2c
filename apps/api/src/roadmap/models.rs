use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// Inbound body of `POST /api/generate-roadmap`.
///
/// Fields are optional here so a missing field reaches validation instead of
/// failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct RoadmapRequestBody {
    pub career: Option<String>,
    pub experience: Option<String>,
    pub goals: Option<String>,
}

/// A complete generation request. All three fields are non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    career: String,
    experience: String,
    goals: String,
}

impl GenerationRequest {
    pub fn new(
        career: impl Into<String>,
        experience: impl Into<String>,
        goals: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let (career, experience, goals) = (career.into(), experience.into(), goals.into());

        let missing: Vec<&str> = [
            ("career", &career),
            ("experience", &experience),
            ("goals", &goals),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(GenerationError::InvalidRequest(missing.join(", ")));
        }

        Ok(Self {
            career,
            experience,
            goals,
        })
    }

    pub fn career(&self) -> &str {
        &self.career
    }

    pub fn experience(&self) -> &str {
        &self.experience
    }

    pub fn goals(&self) -> &str {
        &self.goals
    }
}

impl TryFrom<RoadmapRequestBody> for GenerationRequest {
    type Error = GenerationError;

    fn try_from(body: RoadmapRequestBody) -> Result<Self, Self::Error> {
        GenerationRequest::new(
            body.career.unwrap_or_default(),
            body.experience.unwrap_or_default(),
            body.goals.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub title: String,
    pub description: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

/// Validated roadmap returned to the caller. Only `validation::parse_roadmap`
/// builds these from model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapDocument {
    pub title: String,
    pub description: String,
    pub steps: Vec<RoadmapStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_request_is_accepted() {
        let req = GenerationRequest::new("Data Scientist", "beginner", "learn ML").unwrap();
        assert_eq!(req.career(), "Data Scientist");
        assert_eq!(req.experience(), "beginner");
        assert_eq!(req.goals(), "learn ML");
    }

    #[test]
    fn test_missing_goals_is_invalid() {
        let body = RoadmapRequestBody {
            career: Some("Data Scientist".into()),
            experience: Some("beginner".into()),
            goals: None,
        };
        match GenerationRequest::try_from(body) {
            Err(GenerationError::InvalidRequest(fields)) => assert_eq!(fields, "goals"),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_fields_are_invalid() {
        match GenerationRequest::new("", "  ", "\n") {
            Err(GenerationError::InvalidRequest(fields)) => {
                assert_eq!(fields, "career, experience, goals")
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_step_without_resources_omits_field() {
        let step = RoadmapStep {
            title: "Learn Python".into(),
            description: "Basics".into(),
            duration: "1 month".into(),
            resources: None,
        };
        let json = serde_json::to_value(&step).unwrap();
        assert!(json.get("resources").is_none());
    }
}
