//! Telegram delivery adapter
//!
//! Sends the composed message to a channel. Messages with an image go
//! through `sendPhoto`; if the provider rejects that attempt, the adapter
//! makes exactly one degraded retry through `sendMessage` with the full
//! text and no image.

use async_trait::async_trait;
use feed_courier_domain::{ChannelTarget, DeliveryError, DeliverySink, OutboundMessage};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API delivery sink
pub struct TelegramDelivery {
    client: Client,
    base_url: String,
}

/// Outcome of the photo attempt
enum PhotoAttempt {
    Delivered,
    /// Provider rejected the attempt; eligible for the text-only retry
    Rejected(String),
}

impl TelegramDelivery {
    pub fn new() -> Self {
        Self::with_base_url("https://api.telegram.org".to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base_url }
    }

    async fn send_photo(
        &self,
        target: &ChannelTarget,
        photo_url: &str,
        caption: &str,
    ) -> Result<PhotoAttempt, DeliveryError> {
        let url = format!(
            "{}/bot{}/sendPhoto",
            self.base_url,
            target.bot_token.expose_secret()
        );

        let request = SendPhotoRequest {
            chat_id: &target.chat_id,
            photo: photo_url,
            caption,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        if response.status() == 401 || response.status() == 403 {
            return Err(DeliveryError::Auth("Invalid bot token".to_string()));
        }

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .unwrap_or_else(|_| ApiResponse::failed("unreadable response"));

        if status.is_success() && body.ok {
            return Ok(PhotoAttempt::Delivered);
        }

        Ok(PhotoAttempt::Rejected(body.describe(status.as_u16())))
    }

    async fn send_text(&self, target: &ChannelTarget, text: &str) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url,
            target.bot_token.expose_secret()
        );

        let request = SendMessageRequest {
            chat_id: &target.chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        if response.status() == 401 || response.status() == 403 {
            return Err(DeliveryError::Auth("Invalid bot token".to_string()));
        }

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .unwrap_or_else(|_| ApiResponse::failed("unreadable response"));

        if status.is_success() && body.ok {
            return Ok(());
        }

        Err(DeliveryError::Api(body.describe(status.as_u16())))
    }
}

impl Default for TelegramDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl ApiResponse {
    fn failed(description: &str) -> Self {
        Self {
            ok: false,
            description: Some(description.to_string()),
        }
    }

    fn describe(&self, status: u16) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => format!("HTTP {}", status),
        }
    }
}

#[async_trait]
impl DeliverySink for TelegramDelivery {
    async fn deliver(
        &self,
        target: &ChannelTarget,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        if let Some(image_url) = &message.image_url {
            match self.send_photo(target, image_url, &message.text).await? {
                PhotoAttempt::Delivered => return Ok(()),
                PhotoAttempt::Rejected(reason) => {
                    // One-shot degrade: drop the image, keep the full text
                    tracing::warn!(
                        reason = %reason,
                        "Photo delivery rejected, retrying as text-only"
                    );
                }
            }
        }

        self.send_text(target, &message.text).await
    }
}
