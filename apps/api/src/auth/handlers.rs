//! Axum route handlers for signup and login.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::issue_token;
use crate::errors::AppError;
use crate::models::user::{NewUser, PublicUser};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// POST /api/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(req) = payload.map_err(reject_body)?;
    let email = normalize_email(&req.email);
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }

    let password_hash = hash_password(req.password).await?;
    let user = state
        .users
        .create(NewUser {
            email,
            name,
            password_hash,
        })
        .await?;
    info!(user_id = %user.id, "User signed up");

    let user = PublicUser::from(&user);
    let token = issue_token(&state.config.jwt_secret, state.config.token_ttl_hours, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/login
///
/// Unknown email and wrong password produce the same error.
pub async fn handle_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload.map_err(reject_body)?;
    let email = normalize_email(&req.email);
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }
    info!(user_id = %user.id, "User logged in");

    let user = PublicUser::from(&user);
    let token = issue_token(&state.config.jwt_secret, state.config.token_ttl_hours, &user)?;
    Ok(Json(AuthResponse { token, user }))
}

fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
