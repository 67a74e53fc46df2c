use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_BASE;

/// Application configuration loaded from environment variables.
/// Startup aborts if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Upper bound for one generation call, retries included.
    pub generation_timeout_secs: u64,
    pub require_auth: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            jwt_secret: require_env("JWT_SECRET")?,
            token_ttl_hours: parse_env("TOKEN_TTL_HOURS", 24)?,
            generation_timeout_secs: parse_env("GENERATION_TIMEOUT_SECS", 30)?,
            require_auth: parse_env("REQUIRE_AUTH", true)?,
            port: parse_env("PORT", 3000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/roadmap_test".to_string(),
            gemini_api_key: "test-key".to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
            generation_timeout_secs: 5,
            require_auth: false,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let port: u16 = parse_env("ROADMAP_TEST_UNSET_PORT", 3000).unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("ROADMAP_TEST_BAD_BOOL", "maybe");
        let result: Result<bool> = parse_env("ROADMAP_TEST_BAD_BOOL", true);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_env_reads_value() {
        std::env::set_var("ROADMAP_TEST_TIMEOUT", " 45 ");
        let secs: u64 = parse_env("ROADMAP_TEST_TIMEOUT", 30).unwrap();
        assert_eq!(secs, 45);
    }

    #[test]
    fn test_require_env_missing_is_error() {
        let err = require_env("ROADMAP_TEST_MISSING_KEY").unwrap_err();
        assert!(err.to_string().contains("ROADMAP_TEST_MISSING_KEY"));
    }

    #[test]
    fn test_require_env_blank_is_error() {
        std::env::set_var("ROADMAP_TEST_BLANK_KEY", "   ");
        assert!(require_env("ROADMAP_TEST_BLANK_KEY").is_err());
    }
}
