use std::sync::Arc;

use crate::auth::store::UserStore;
use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model client. Default: `GeminiClient`.
    pub llm: Arc<dyn TextGenerator>,
    /// Account storage. Default: `PgUserStore`.
    pub users: Arc<dyn UserStore>,
}
