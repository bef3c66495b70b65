//! Remote caption provider adapter
//!
//! Treats the provider as a black-box text transform: the item goes out,
//! a caption comes back. Transient failures are retried with backoff; the
//! caption use case upstream absorbs whatever still fails.

use async_trait::async_trait;
use feed_courier_domain::{EnrichError, Enricher, FeedItem};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EnrichHttpConfig;

/// HTTP-backed enricher
pub struct RemoteEnricher {
    client: Client,
    base_url: String,
    api_key: SecretString,
    config: EnrichHttpConfig,
}

impl RemoteEnricher {
    pub fn new(base_url: String, api_key: SecretString, config: EnrichHttpConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            api_key,
            config,
        }
    }

    async fn call_provider(&self, item: &FeedItem) -> Result<String, EnrichError> {
        let url = format!("{}/v1/captions", self.base_url);

        let request = CaptionRequest {
            title: &item.title,
            body_html: &item.body_html,
            url: &item.url,
        };

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichError::Timeout
                } else {
                    EnrichError::Provider(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::Provider(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        let payload: CaptionResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::InvalidResponse(e.to_string()))?;

        if payload.caption.trim().is_empty() {
            return Err(EnrichError::InvalidResponse("Empty caption".to_string()));
        }

        Ok(payload.caption)
    }
}

#[derive(Serialize)]
struct CaptionRequest<'a> {
    title: &'a str,
    body_html: &'a str,
    url: &'a str,
}

#[derive(Deserialize)]
struct CaptionResponse {
    caption: String,
}

#[async_trait]
impl Enricher for RemoteEnricher {
    async fn enrich(&self, item: &FeedItem) -> Result<String, EnrichError> {
        let mut last_error = None;

        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                tracing::warn!(attempt, item_id = %item.id, "Retrying enrichment");
                tokio::time::sleep(Duration::from_millis(500 * 2_u64.pow(attempt))).await;
            }

            match self.call_provider(item).await {
                Ok(caption) => return Ok(caption),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| EnrichError::Provider("No attempts made".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_item() -> FeedItem {
        FeedItem {
            id: "p1".to_string(),
            title: "Title".to_string(),
            body_html: "<p>Body</p>".to_string(),
            url: "https://blog.example.com/p1".to_string(),
            image_url: None,
        }
    }

    fn enricher(base_url: String, retries: u32) -> RemoteEnricher {
        RemoteEnricher::new(
            base_url,
            SecretString::from("test-key".to_string()),
            EnrichHttpConfig {
                timeout_secs: 5,
                retries,
            },
        )
    }

    #[tokio::test]
    async fn test_enrich_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/captions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "title": "Title",
                "body_html": "<p>Body</p>",
                "url": "https://blog.example.com/p1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "caption": "A generated caption"
            })))
            .mount(&mock_server)
            .await;

        let caption = enricher(mock_server.uri(), 0)
            .enrich(&sample_item())
            .await
            .unwrap();

        assert_eq!(caption, "A generated caption");
    }

    #[tokio::test]
    async fn test_enrich_retries_transient_failure() {
        let mock_server = MockServer::start().await;

        // First attempt fails, second succeeds
        Mock::given(method("POST"))
            .and(path("/v1/captions"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/captions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "caption": "Recovered caption"
            })))
            .mount(&mock_server)
            .await;

        let caption = enricher(mock_server.uri(), 2)
            .enrich(&sample_item())
            .await
            .unwrap();

        assert_eq!(caption, "Recovered caption");
    }

    #[tokio::test]
    async fn test_enrich_surfaces_error_after_retries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/captions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = enricher(mock_server.uri(), 0).enrich(&sample_item()).await;

        assert!(matches!(result, Err(EnrichError::Provider(_))));
    }

    #[tokio::test]
    async fn test_enrich_rejects_empty_caption() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/captions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "caption": "  "
            })))
            .mount(&mock_server)
            .await;

        let result = enricher(mock_server.uri(), 0).enrich(&sample_item()).await;

        assert!(matches!(result, Err(EnrichError::InvalidResponse(_))));
    }
}
