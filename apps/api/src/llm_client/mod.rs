/// LLM Client: the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All model interactions go through `TextGenerator`.
///
/// Model: gemini-2.0-flash (hardcoded, not configurable)
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for all generation calls.
pub const MODEL: &str = "gemini-2.0-flash";

const TEMPERATURE: f32 = 1.0;
const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Anything that turns a prompt into raw completion text.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Joins the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Bounded retry with jittered exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Covers every attempt and every backoff sleep.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            deadline: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline,
            ..Self::default()
        }
    }

    /// Delay before `attempt` (1-based retry number): base * 2^(attempt-1) plus
    /// up to half of that again as jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let delay = self.base_delay * (1u32 << (attempt - 1).min(16));
        let half_ms = (delay.as_millis() as u64 / 2).max(1);
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..half_ms))
    }
}

/// Gemini `generateContent` client with retry and an overall deadline.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: String, api_base: String, retry: RetryPolicy) -> Result<Self, LlmError> {
        // The overall deadline is enforced in `call`; this only stops a stuck socket
        // from outliving it.
        let client = Client::builder()
            .timeout(retry.deadline + Duration::from_secs(1))
            .build()?;
        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, MODEL)
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    /// Retries on transport failures, 429 and 5xx, within the policy deadline.
    pub async fn call(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        let deadline = self.retry.deadline;
        tokio::time::timeout(deadline, self.call_with_retry(prompt))
            .await
            .map_err(|_| LlmError::Timeout(deadline))?
    }

    async fn call_with_retry(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig::default(),
        };
        let url = self.endpoint();

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let delay = self.retry.backoff(attempt);
                warn!(
                    "Gemini call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    warn!("Gemini transport error: {e}");
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Gemini API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let parsed: GenerateContentResponse = response.json().await?;

            if let Some(usage) = &parsed.usage_metadata {
                debug!(
                    "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::Api {
            status: 0,
            message: "no attempts were made".to_string(),
        }))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        match response.text() {
            Some(text) => Ok(text),
            None => {
                let reason = response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .unwrap_or("no candidates");
                warn!("Gemini returned no text (finish reason: {reason})");
                Err(LlmError::EmptyContent)
            }
        }
    }
}

fn error_message(body: String) -> String {
    serde_json::from_str::<GeminiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode, Uri},
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;

    /// Canned provider behaviour: each call pops the next (status, body) pair;
    /// the last one repeats.
    #[derive(Clone)]
    struct Script {
        replies: Arc<Vec<(StatusCode, Value)>>,
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    async fn fake_generate(
        State(script): State<Script>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        assert_eq!(uri.path(), format!("/v1beta/models/{MODEL}:generateContent"));
        assert_eq!(headers["x-goog-api-key"], "k");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        let n = script.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(script.delay).await;
        let idx = n.min(script.replies.len() - 1);
        let (status, reply) = script.replies[idx].clone();
        (status, Json(reply))
    }

    async fn spawn_provider(script: Script) -> String {
        let app = Router::new().fallback(fake_generate).with_state(script);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1beta")
    }

    fn script(replies: Vec<(StatusCode, Value)>) -> Script {
        Script {
            replies: Arc::new(replies),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            deadline: Duration::from_secs(5),
        }
    }

    fn text_reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 20}
        })
    }

    #[tokio::test]
    async fn test_generate_returns_first_candidate_text() {
        let s = script(vec![(StatusCode::OK, text_reply("{\"title\":\"X\"}"))]);
        let base = spawn_provider(s.clone()).await;
        let client = GeminiClient::new("k".into(), base, fast_policy()).unwrap();

        let text = client.generate("prompt").await.unwrap();
        assert_eq!(text, "{\"title\":\"X\"}");
        assert_eq!(s.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let s = script(vec![
            (StatusCode::SERVICE_UNAVAILABLE, json!({"error": {"message": "overloaded"}})),
            (StatusCode::TOO_MANY_REQUESTS, json!({"error": {"message": "slow down"}})),
            (StatusCode::OK, text_reply("ok")),
        ]);
        let base = spawn_provider(s.clone()).await;
        let client = GeminiClient::new("k".into(), base, fast_policy()).unwrap();

        assert_eq!(client.generate("prompt").await.unwrap(), "ok");
        assert_eq!(s.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let s = script(vec![(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"message": "boom"}}),
        )]);
        let base = spawn_provider(s.clone()).await;
        let client = GeminiClient::new("k".into(), base, fast_policy()).unwrap();

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, ref message } if message == "boom"));
        assert_eq!(s.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let s = script(vec![(
            StatusCode::BAD_REQUEST,
            json!({"error": {"message": "API key not valid"}}),
        )]);
        let base = spawn_provider(s.clone()).await;
        let client = GeminiClient::new("k".into(), base, fast_policy()).unwrap();

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 400, .. }));
        assert_eq!(s.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_content() {
        let s = script(vec![(
            StatusCode::OK,
            json!({"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}),
        )]);
        let base = spawn_provider(s).await;
        let client = GeminiClient::new("k".into(), base, fast_policy()).unwrap();

        assert!(matches!(
            client.generate("prompt").await,
            Err(LlmError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn test_whitespace_text_is_empty_content() {
        let s = script(vec![(StatusCode::OK, text_reply("  \n "))]);
        let base = spawn_provider(s).await;
        let client = GeminiClient::new("k".into(), base, fast_policy()).unwrap();

        assert!(matches!(
            client.generate("prompt").await,
            Err(LlmError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let mut s = script(vec![(StatusCode::OK, text_reply("late"))]);
        s.delay = Duration::from_secs(2);
        let base = spawn_provider(s).await;
        let policy = RetryPolicy {
            deadline: Duration::from_millis(200),
            ..fast_policy()
        };
        let client = GeminiClient::new("k".into(), base, policy).unwrap();

        assert!(matches!(
            client.generate("prompt").await,
            Err(LlmError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client =
            GeminiClient::new("k".into(), format!("http://{addr}/v1beta"), fast_policy()).unwrap();

        assert!(matches!(
            client.generate("prompt").await,
            Err(LlmError::Http(_))
        ));
    }

    #[test]
    fn test_backoff_grows_and_stays_bounded() {
        let policy = RetryPolicy::default();
        let first = policy.backoff(1);
        let second = policy.backoff(2);
        assert!(first >= Duration::from_millis(500) && first < Duration::from_millis(750));
        assert!(second >= Duration::from_millis(1000) && second < Duration::from_millis(1500));
    }

    #[test]
    fn test_backoff_jitter_varies_between_calls() {
        let policy = RetryPolicy::default();
        let delays: std::collections::HashSet<Duration> =
            (0..32).map(|_| policy.backoff(1)).collect();
        assert!(delays.len() > 1);
        assert!(delays.iter().all(|d| *d >= Duration::from_millis(500)
            && *d < Duration::from_millis(750)));
    }

    #[test]
    fn test_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
    }
}
