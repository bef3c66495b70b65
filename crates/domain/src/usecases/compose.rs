//! Compose use case - turns a caption into the final outbound message
//!
//! The final text is the caption followed by a fixed call-to-action line
//! containing the canonical post URL. Truncation keeps the CTA intact.

use crate::model::{FeedItem, OutboundMessage};

/// Configuration for message composition
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Call-to-action prefix placed before the post URL
    pub call_to_action: String,
    /// Maximum characters for the full message (provider caption limit)
    pub max_chars: usize,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            call_to_action: "Read the full post:".to_string(),
            // Telegram photo captions are capped at 1024 characters
            max_chars: 1024,
        }
    }
}

/// Composer for outbound messages
pub struct Composer {
    config: ComposeConfig,
}

impl Composer {
    pub fn new(config: ComposeConfig) -> Self {
        Self { config }
    }

    /// Compose the deliverable: caption + CTA line, image passed through
    pub fn compose(&self, caption: &str, item: &FeedItem) -> OutboundMessage {
        let cta_line = format!("{} {}", self.config.call_to_action, item.url);

        // Reserve space for the CTA and the blank line before it
        let reserved = cta_line.chars().count() + 2;
        let available = self.config.max_chars.saturating_sub(reserved);
        let caption = truncate_chars(caption.trim(), available);

        let text = if caption.is_empty() {
            cta_line
        } else {
            format!("{}\n\n{}", caption, cta_line)
        };

        OutboundMessage {
            text,
            image_url: item.image_url.clone(),
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
