use super::AnalysisError;
use crate::cache::{CacheKey, CacheStore};
use crate::diagnostics::FailureLog;
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use crate::repair::{repair_json, strip_code_fence};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_MAX_TOKENS: u32 = 8192;

/// A decoded service answer and whether it came from the cache
#[derive(Debug, Clone)]
pub struct GatewayResponse<T> {
    pub value: T,
    pub cache_hit: bool,
}

/// Strict decode of a raw response, with one repair pass on failure
pub fn decode_response<T: DeserializeOwned>(raw: &str) -> Result<T, AnalysisError> {
    match serde_json::from_str(strip_code_fence(raw)) {
        Ok(value) => Ok(value),
        Err(strict) => {
            debug!(error = %strict, "Strict decode failed, repairing response");
            serde_json::from_str(&repair_json(raw)).map_err(|repaired| {
                AnalysisError::DecodeFailed {
                    message: format!("{}; after repair: {}", strict, repaired),
                }
            })
        }
    }
}

/// Cache-then-call access to the analysis service
pub struct ServiceGateway {
    client: Arc<dyn LLMClient>,
    cache: Arc<dyn CacheStore>,
    failure_log: FailureLog,
    max_tokens: u32,
}

impl ServiceGateway {
    pub fn new(client: Arc<dyn LLMClient>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            client,
            cache,
            failure_log: FailureLog::disabled(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_failure_log(mut self, failure_log: FailureLog) -> Self {
        self.failure_log = failure_log;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Model identifier folded into cache keys so switching models never reuses answers
    pub fn model(&self) -> Option<String> {
        self.client.model_info()
    }

    /// Runs one task: cache lookup, service call on a miss, decode with repair
    ///
    /// The raw response is cached as soon as the call succeeds; failed calls are
    /// never cached. `task` and `subject` label the failure log entry.
    pub async fn request<T: DeserializeOwned>(
        &self,
        task: &str,
        subject: &str,
        key_payload: &Value,
        system_prompt: String,
        user_content: String,
        temperature: f32,
    ) -> Result<GatewayResponse<T>, AnalysisError> {
        let key = CacheKey::for_payload(key_payload);

        let (raw, cache_hit) = match self.cached_content(&key).await {
            Some(content) => {
                debug!(task, subject, key = %key, "Cache hit");
                (content, true)
            }
            None => {
                let request = LLMRequest::new(vec![
                    ChatMessage::system(system_prompt),
                    ChatMessage::user(user_content),
                ])
                .with_temperature(temperature)
                .with_max_tokens(self.max_tokens)
                .with_json_mode();

                let response = match self.client.chat(request).await {
                    Ok(response) => response,
                    Err(e) => {
                        self.failure_log.record(task, subject, &e.to_string(), None);
                        return Err(AnalysisError::Service(e));
                    }
                };

                debug!(
                    task,
                    subject,
                    response_time_ms = response.response_time.as_millis(),
                    "Service call complete"
                );

                self.cache
                    .put(
                        &key,
                        &json!({
                            "content": response.content,
                            "model": self.model(),
                            "cached_at": Utc::now().to_rfc3339(),
                        }),
                    )
                    .await;
                (response.content, false)
            }
        };

        match decode_response(&raw) {
            Ok(value) => Ok(GatewayResponse { value, cache_hit }),
            Err(e) => {
                self.failure_log
                    .record(task, subject, &e.to_string(), Some(&raw));
                Err(e)
            }
        }
    }

    async fn cached_content(&self, key: &CacheKey) -> Option<String> {
        let record = self.cache.get(key).await?;
        match record.get("content").and_then(Value::as_str) {
            Some(content) => Some(content.to_string()),
            None => {
                warn!(key = %key, "Cache record without content treated as miss");
                None
            }
        }
    }
}

impl std::fmt::Debug for ServiceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceGateway")
            .field("client", &self.client.name())
            .field("cache", &self.cache.name())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::BackendError;
    use crate::llm::{MockLLMClient, MockResponse};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        answer: String,
    }

    async fn ask(
        gateway: &ServiceGateway,
        payload: &Value,
    ) -> Result<GatewayResponse<Answer>, AnalysisError> {
        gateway
            .request("test", "subject", payload, "sys".into(), "user".into(), 0.0)
            .await
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let client = Arc::new(MockLLMClient::new());
        client.add_response(MockResponse::text(r#"{"answer": "42"}"#));
        let gateway = ServiceGateway::new(client.clone(), Arc::new(MemoryCache::new()));
        let payload = json!({"version": "v1", "q": "life"});

        let first = ask(&gateway, &payload).await.unwrap();
        let second = ask(&gateway, &payload).await.unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(second.value.answer, "42");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cached_record_shape() {
        let client = Arc::new(MockLLMClient::new());
        client.add_response(MockResponse::text(r#"{"answer": "x"}"#));
        let cache = Arc::new(MemoryCache::new());
        let gateway = ServiceGateway::new(client, cache.clone());
        let payload = json!({"q": 1});

        ask(&gateway, &payload).await.unwrap();

        let record = cache.get(&CacheKey::for_payload(&payload)).await.unwrap();
        assert_eq!(record["content"], r#"{"answer": "x"}"#);
        assert_eq!(record["model"], "mock-model");
        assert!(record["cached_at"].is_string());
    }

    #[tokio::test]
    async fn test_service_failure_is_not_cached() {
        let client = Arc::new(MockLLMClient::new());
        client.add_responses(vec![
            MockResponse::error(BackendError::TimeoutError { seconds: 300 }),
            MockResponse::text(r#"{"answer": "retry"}"#),
        ]);
        let gateway = ServiceGateway::new(client.clone(), Arc::new(MemoryCache::new()));
        let payload = json!({"q": 2});

        let first = ask(&gateway, &payload).await;
        assert!(matches!(
            first,
            Err(AnalysisError::Service(BackendError::TimeoutError { .. }))
        ));

        let second = ask(&gateway, &payload).await.unwrap();
        assert!(!second.cache_hit);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_repair_pass_rescues_malformed_json() {
        let client = Arc::new(MockLLMClient::new());
        client.add_response(MockResponse::text("```json\n{\"answer\": \"see \\cite{a}\",}\n```"));
        let gateway = ServiceGateway::new(client, Arc::new(MemoryCache::new()));

        let response = ask(&gateway, &json!({"q": 3})).await.unwrap();
        assert_eq!(response.value.answer, "see \\cite{a}");
    }

    #[tokio::test]
    async fn test_unrepairable_response_fails() {
        let client = Arc::new(MockLLMClient::new());
        client.add_response(MockResponse::text("I cannot help with that."));
        let gateway = ServiceGateway::new(client, Arc::new(MemoryCache::new()));

        let result = ask(&gateway, &json!({"q": 4})).await;
        assert!(matches!(result, Err(AnalysisError::DecodeFailed { .. })));
    }

    #[test]
    fn test_decode_response_wrong_shape() {
        let result: Result<Answer, _> = decode_response(r#"{"other": 1}"#);
        assert!(result.is_err());
    }
}
