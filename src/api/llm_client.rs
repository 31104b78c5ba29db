use crate::api::completion_api::CompletionApi;
use crate::config::LlmConfig;
use crate::error::CampusError;
use crate::types::chat::ChatMessage;
use crate::types::completion::{CompletionChunk, CompletionRequest};

use backon::ExponentialBuilder;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, future};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Text deltas of one streamed completion, in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, CampusError>> + Send>>;

fn retry_policy(max_times: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(max_times)
        .with_jitter()
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    url: Url,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry_policy: ExponentialBuilder,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl LlmClient {
    pub fn new(cfg: &LlmConfig) -> Result<Self, CampusError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("rollcall/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.timeout());
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let client = builder.build()?;

        let per_minute = NonZeroU32::new(cfg.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            client,
            url: cfg.completions_url()?,
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            retry_policy: retry_policy(cfg.retry_max_times),
            limiter,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a streamed completion. Fails before any text arrives when no key is configured,
    /// the per-minute quota is spent, the transport fails or upstream answers non-2xx.
    pub async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TextStream, CampusError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CampusError::MissingApiKey);
        };
        if self.limiter.check().is_err() {
            warn!(model = %self.model, "completion quota exhausted");
            return Err(CampusError::RateLimited);
        }

        let body = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };
        let resp = CompletionApi::try_post(
            self.client.clone(),
            self.url.clone(),
            api_key,
            self.retry_policy.clone(),
            &body,
        )
        .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, model = %self.model, "completion request rejected");
            return Err(CampusError::UpstreamStatus(status));
        }
        debug!(%status, model = %self.model, "completion stream opened");

        Ok(text_deltas(resp.bytes_stream()))
    }
}

/// Decode an SSE byte stream into text deltas; `[DONE]` ends it and empty deltas are skipped.
pub fn text_deltas<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let stream = bytes
        .eventsource()
        .take_while(|event| {
            future::ready(!matches!(event, Ok(ev) if ev.data.trim() == "[DONE]"))
        })
        .filter_map(|event| {
            future::ready(match event {
                Ok(ev) if ev.data.trim().is_empty() => None,
                Ok(ev) => match serde_json::from_str::<CompletionChunk>(&ev.data) {
                    Ok(chunk) => chunk.text().map(Ok),
                    Err(e) => Some(Err(CampusError::Json(e))),
                },
                Err(e) => Some(Err(CampusError::UpstreamStream(e.to_string()))),
            })
        });
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sse(frames: &[&str]) -> Vec<Result<Vec<u8>, std::io::Error>> {
        frames
            .iter()
            .map(|f| Ok(format!("data: {f}\n\n").into_bytes()))
            .collect()
    }

    #[tokio::test]
    async fn deltas_stop_at_done() {
        let frames = sse(&[
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"delta":{"content":"Log "}}]}"#,
            r#"{"choices":[{"delta":{"content":"in first."}}]}"#,
            "[DONE]",
            r#"{"choices":[{"delta":{"content":"ignored"}}]}"#,
        ]);
        let texts: Vec<String> = text_deltas(futures::stream::iter(frames))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(texts, ["Log ", "in first."]);
    }

    #[tokio::test]
    async fn malformed_event_is_an_error() {
        let frames = sse(&["not json"]);
        let items: Vec<_> = text_deltas(futures::stream::iter(frames)).collect().await;
        assert!(matches!(items.as_slice(), [Err(CampusError::Json(_))]));
    }

    #[tokio::test]
    async fn missing_key_fails_fast() {
        let client = LlmClient::new(&LlmConfig::default()).unwrap();
        let err = client.stream_chat(Vec::new()).await.err().unwrap();
        assert!(matches!(err, CampusError::MissingApiKey));
    }

    #[tokio::test]
    async fn quota_is_enforced() {
        let cfg = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: Url::parse("http://127.0.0.1:9/v1/").unwrap(),
            requests_per_minute: 1,
            retry_max_times: 0,
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&cfg).unwrap();
        // first call spends the quota (and fails to connect)
        assert!(client.stream_chat(Vec::new()).await.is_err());
        assert!(matches!(
            client.stream_chat(Vec::new()).await.err().unwrap(),
            CampusError::RateLimited
        ));
    }
}
