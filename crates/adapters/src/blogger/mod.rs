//! Blogger-style feed source adapter

use async_trait::async_trait;
use feed_courier_domain::{FeedCredentials, FeedError, FeedItem, FeedSource};
use regex::Regex;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

/// Feed source backed by the Blogger v3 posts API
pub struct BloggerFeedSource {
    client: Client,
    base_url: String,
    img_pattern: Regex,
}

impl BloggerFeedSource {
    pub fn new() -> Self {
        Self::with_base_url("https://www.googleapis.com/blogger/v3".to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        let img_pattern = Regex::new(r#"<img[^>]*\bsrc\s*=\s*["']([^"']+)["']"#)
            .expect("Failed to compile image pattern");

        Self {
            client,
            base_url,
            img_pattern,
        }
    }

    /// Prefer the structured image field; fall back to the first embedded
    /// image reference in the body. Finding none is not an error.
    fn extract_image_url(&self, post: &PostPayload) -> Option<String> {
        if let Some(image) = post.images.as_ref().and_then(|images| images.first()) {
            if !image.url.is_empty() {
                return Some(image.url.clone());
            }
        }

        self.img_pattern
            .captures(&post.content)
            .map(|captures| captures[1].to_string())
    }
}

impl Default for BloggerFeedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct PostsResponse {
    items: Option<Vec<PostPayload>>,
}

#[derive(Deserialize)]
struct PostPayload {
    id: String,
    title: String,
    #[serde(default)]
    content: String,
    url: String,
    images: Option<Vec<ImagePayload>>,
}

#[derive(Deserialize)]
struct ImagePayload {
    url: String,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl FeedSource for BloggerFeedSource {
    async fn fetch_recent(
        &self,
        credentials: &FeedCredentials,
        max_results: u32,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let url = format!("{}/blogs/{}/posts", self.base_url, credentials.feed_id);

        tracing::debug!(feed_id = %credentials.feed_id, max_results, "Fetching feed page");

        let max_results_param = max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", credentials.api_key.expose_secret()),
                ("maxResults", max_results_param.as_str()),
                ("fetchImages", "true"),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // The service reports structured errors as {"error": {"message"}}
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) => format!("HTTP {}: {}", status, body),
            };

            return Err(FeedError::Upstream(message));
        }

        let posts: PostsResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        let items = posts
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|post| {
                let image_url = self.extract_image_url(&post);
                FeedItem {
                    id: post.id,
                    title: post.title,
                    body_html: post.content,
                    url: post.url,
                    image_url,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = items.len(), "Fetched feed items");

        Ok(items)
    }
}
