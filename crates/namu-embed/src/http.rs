//! HTTP embedding provider.
//!
//! Talks to a remote embedding service that accepts `{"texts": [...]}` and
//! answers `{"embeddings": [[...], ...]}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::provider::{EmbeddingProvider, ensure_arity, normalize};
use namu_core::{Error, Result};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding provider backed by a remote HTTP service.
pub struct HttpEmbeddingProvider {
    endpoint: String,
    api_key: Option<String>,
    max_text_length: usize,
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    /// Create a provider from configuration.
    ///
    /// Fails with a configuration error when the endpoint is blank.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let endpoint = config.endpoint_url.trim();
        if endpoint.is_empty() {
            return Err(Error::config("embedding endpoint_url is not configured"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            max_text_length: config.max_text_length,
            client,
        })
    }

    fn truncate<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.max_text_length) {
            Some((byte_idx, _)) => &text[..byte_idx],
            None => text,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedRequest {
            texts: texts.iter().map(|t| self.truncate(t)).collect(),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::remote(0, format!("request to {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(Error::remote(status.as_u16(), body));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::response_shape("{\"embeddings\": [[...]]}", e.to_string()))?;

        ensure_arity(texts.len(), parsed.embeddings.len())?;

        let mut embeddings = parsed.embeddings;
        for vector in &mut embeddings {
            normalize(vector)?;
        }
        tracing::debug!(count = embeddings.len(), "embedded batch");
        Ok(embeddings)
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/embed")
    }

    /// Answers one `[chars, 0]` vector per text.
    async fn echo(Json(body): Json<Value>) -> Json<Value> {
        let texts = body["texts"].as_array().cloned().unwrap_or_default();
        let embeddings: Vec<Value> = texts
            .iter()
            .map(|t| json!([t.as_str().unwrap_or("").chars().count() as f32, 0.0]))
            .collect();
        Json(json!({ "embeddings": embeddings }))
    }

    fn config(url: &str) -> EmbeddingConfig {
        EmbeddingConfig::default().with_endpoint(url)
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    #[test]
    fn test_blank_endpoint_is_config_error() {
        let result = HttpEmbeddingProvider::new(&config("   "));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_blank_api_key_ignored() {
        let provider =
            HttpEmbeddingProvider::new(&config("http://localhost/embed").with_api_key(" ")).unwrap();
        assert!(provider.api_key.is_none());
        assert_eq!(provider.endpoint, "http://localhost/embed");
        assert_eq!(provider.name(), "http");
    }

    #[test]
    fn test_truncate_by_chars() {
        let mut cfg = config("http://localhost/embed");
        cfg.max_text_length = 2;
        let provider = HttpEmbeddingProvider::new(&cfg).unwrap();
        assert_eq!(provider.truncate("나무위키"), "나무");
        assert_eq!(provider.truncate("a"), "a");
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_embed_batch_normalizes() {
        let url = spawn(Router::new().route("/embed", post(echo))).await;
        let provider = HttpEmbeddingProvider::new(&config(&url)).unwrap();

        let vectors = provider.embed_batch(&texts(&["abc", "de"])).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embed_batch_empty_input_skips_request() {
        let provider = HttpEmbeddingProvider::new(&config("http://127.0.0.1:1/embed")).unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_error() {
        let app = Router::new().route(
            "/embed",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model loading") }),
        );
        let url = spawn(app).await;
        let provider = HttpEmbeddingProvider::new(&config(&url)).unwrap();

        let err = provider.embed_batch(&texts(&["x"])).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteService { status: 503, ref message } if message == "model loading"
        ));
    }

    #[tokio::test]
    async fn test_count_mismatch_is_shape_error() {
        let app = Router::new().route(
            "/embed",
            post(|| async { Json(json!({ "embeddings": [[1.0, 0.0]] })) }),
        );
        let url = spawn(app).await;
        let provider = HttpEmbeddingProvider::new(&config(&url)).unwrap();

        let err = provider.embed_batch(&texts(&["a", "b"])).await.unwrap_err();
        assert!(matches!(err, Error::ResponseShape { .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_shape_error() {
        let app = Router::new().route("/embed", post(|| async { Json(json!({ "vectors": [] })) }));
        let url = spawn(app).await;
        let provider = HttpEmbeddingProvider::new(&config(&url)).unwrap();

        let err = provider.embed_batch(&texts(&["a"])).await.unwrap_err();
        assert!(matches!(err, Error::ResponseShape { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_is_remote_error_with_zero_status() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = HttpEmbeddingProvider::new(&config(&format!("http://{addr}/embed"))).unwrap();
        let err = provider.embed_batch(&texts(&["a"])).await.unwrap_err();
        assert!(matches!(err, Error::RemoteService { status: 0, .. }));
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let app = Router::new().route(
            "/embed",
            post(|headers: HeaderMap| async move {
                let ok = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer secret");
                if ok {
                    (StatusCode::OK, Json(json!({ "embeddings": [[0.0, 2.0]] })))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({})))
                }
            }),
        );
        let url = spawn(app).await;
        let provider =
            HttpEmbeddingProvider::new(&config(&url).with_api_key("secret")).unwrap();

        let vectors = provider.embed_batch(&texts(&["a"])).await.unwrap();
        assert_eq!(vectors[0], vec![0.0, 1.0]);
    }
}
