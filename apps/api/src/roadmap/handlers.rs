//! Axum route handler for roadmap generation.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::warn;

use crate::errors::{AppError, GenerationError};
use crate::roadmap::generator::generate_roadmap;
use crate::roadmap::models::{GenerationRequest, RoadmapDocument, RoadmapRequestBody};
use crate::state::AppState;

/// POST /api/generate-roadmap
///
/// Validates the body, runs the generation pipeline and returns the roadmap.
/// An unreadable body is reported the same way as a missing field.
pub async fn handle_generate_roadmap(
    State(state): State<AppState>,
    payload: Result<Json<RoadmapRequestBody>, JsonRejection>,
) -> Result<Json<RoadmapDocument>, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected roadmap request body: {rejection}");
        GenerationError::InvalidRequest(rejection.body_text())
    })?;

    let request = GenerationRequest::try_from(body)?;
    let roadmap = generate_roadmap(state.llm.as_ref(), &request).await?;

    Ok(Json(roadmap))
}
