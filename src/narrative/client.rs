//! Narrative service client (Gemini `generateContent`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::NarrativeError;
use crate::config::NarrativeConfig;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Header carrying the API key; the key is never put in the URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Something that turns a request document into a free-text reply.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn generate(&self, request: &str) -> Result<String, NarrativeError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Single-shot Gemini client. Failures are returned, never retried.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// Build a client from configuration, reading the key from the
    /// configured environment variable.
    pub fn from_config(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NarrativeError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(
            config.base_url.as_str(),
            config.model.as_str(),
            api_key,
            Duration::from_millis(config.timeout_ms),
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl NarrativeService for GeminiClient {
    async fn generate(&self, request: &str) -> Result<String, NarrativeError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: request }],
            }],
        };

        tracing::debug!(model = %self.model, chars = request.len(), "sending narrative request");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(NarrativeError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(classify)?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or(NarrativeError::EmptyResponse)
    }
}

fn classify(err: reqwest::Error) -> NarrativeError {
    if err.is_timeout() {
        NarrativeError::Timeout
    } else {
        NarrativeError::Network(err.without_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            server.uri(),
            "test-model",
            "secret",
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_returns_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-model:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "review this"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {"content": {"parts": [{"text": "SUMMARY: "}, {"text": "fine"}]}},
                    {"content": {"parts": [{"text": "ignored"}]}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).generate("review this").await.unwrap();
        assert_eq!(text, "SUMMARY: fine");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, NarrativeError::RateLimited));
    }

    #[tokio::test]
    async fn test_bad_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).generate("x").await.unwrap_err();
        match err {
            NarrativeError::BadStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let err = client(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, NarrativeError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let err = client(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, NarrativeError::Timeout));
    }

    #[tokio::test]
    async fn test_api_key_not_in_url_or_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        client(&server).generate("x").await.unwrap_err();
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].url.as_str().contains("secret"));

        // Nothing listens on port 9, so the connection is refused.
        let unreachable = GeminiClient::new(
            "http://127.0.0.1:9",
            "m",
            "SUPERSECRETKEY",
            Duration::from_secs(2),
        );
        let err = unreachable.generate("x").await.unwrap_err();
        assert!(matches!(err, NarrativeError::Network(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{:?}", err).contains("SUPERSECRETKEY"));
    }

    #[test]
    fn test_missing_api_key() {
        let config = NarrativeConfig {
            api_key_env: "REVIEWLENS_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        let err = GeminiClient::from_config(&config).err().unwrap();
        assert!(matches!(err, NarrativeError::MissingApiKey(ref var) if var == "REVIEWLENS_TEST_UNSET_KEY"));
    }
}
