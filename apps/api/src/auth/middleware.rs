use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::token::verify_token;
use crate::errors::AppError;
use crate::state::AppState;

/// Requires `Authorization: Bearer <token>`.
///
/// Missing or non-bearer header → 401; a token that fails verification → 403.
/// Verified `Claims` are inserted into request extensions.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_token(&state.config.jwt_secret, token)?;
    tracing::debug!(user_id = %claims.sub, "Authenticated request");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extracts the token from a `Bearer <token>` header value. The scheme is
/// matched case-insensitively; an empty token yields `None`.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
