pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{handlers as auth_handlers, middleware::require_bearer};
use crate::roadmap::handlers as roadmap_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let mut generation = Router::new().route(
        "/api/generate-roadmap",
        post(roadmap_handlers::handle_generate_roadmap),
    );
    if state.config.require_auth {
        generation = generation.route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));
    }

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/signup", post(auth_handlers::handle_signup))
        .route("/api/login", post(auth_handlers::handle_login))
        .merge(generation)
        .with_state(state)
}
