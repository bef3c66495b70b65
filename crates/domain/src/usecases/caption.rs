//! Caption use case - enrichment with guaranteed fallback
//!
//! Wraps the [`Enricher`] port so that enrichment failures never escape:
//! any error degrades to a best-effort caption built from the item title
//! and a tag-stripped excerpt of the body. The engine always receives a
//! non-empty caption.

use crate::{
    model::FeedItem,
    ports::{EnrichError, Enricher},
};

/// Configuration for the caption use case
#[derive(Debug, Clone)]
pub struct CaptionConfig {
    /// Maximum characters of body excerpt in the fallback caption
    pub excerpt_max_chars: usize,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            excerpt_max_chars: 200,
        }
    }
}

/// Use case for producing a delivery caption for a feed item
pub struct CaptionUseCase<E> {
    enricher: E,
    config: CaptionConfig,
}

impl<E: Enricher> CaptionUseCase<E> {
    pub fn new(enricher: E, config: CaptionConfig) -> Self {
        Self { enricher, config }
    }

    /// Produce a caption for the item. Never fails: enrichment errors and
    /// empty provider output degrade to the fallback caption.
    pub async fn caption(&self, item: &FeedItem) -> String {
        match self.enricher.enrich(item).await {
            Ok(caption) if !caption.trim().is_empty() => caption,
            Ok(_) => {
                tracing::warn!(item_id = %item.id, "Enricher returned empty caption, using fallback");
                self.fallback_caption(item)
            }
            Err(e) => {
                tracing::warn!(item_id = %item.id, error = %e, "Enrichment failed, using fallback caption");
                self.fallback_caption(item)
            }
        }
    }

    /// Title plus a tag-stripped, truncated excerpt of the body
    fn fallback_caption(&self, item: &FeedItem) -> String {
        let excerpt = truncate_excerpt(&strip_html(&item.body_html), self.config.excerpt_max_chars);

        if excerpt.is_empty() {
            item.title.clone()
        } else {
            format!("{}\n\n{}", item.title, excerpt)
        }
    }
}

// Blanket impl so the engine can pass `Arc<E>.as_ref()`
use async_trait::async_trait;

#[async_trait]
impl<E: Enricher + ?Sized> Enricher for &E {
    async fn enrich(&self, item: &FeedItem) -> Result<String, EnrichError> {
        (*self).enrich(item).await
    }
}

/// Remove markup tags and collapse whitespace runs
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut last_was_space = true;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                // Tag boundaries separate words
                if !last_was_space {
                    out.push(' ');
                    last_was_space = true;
                }
            }
            _ if in_tag => {}
            c if c.is_whitespace() => {
                if !last_was_space {
                    out.push(' ');
                    last_was_space = true;
                }
            }
            c => {
                out.push(c);
                last_was_space = false;
            }
        }
    }

    out.trim_end().to_string()
}

/// Truncate to at most `max_chars` characters, preferring a word boundary
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(pos) => &cut[..pos],
        None => cut.as_str(),
    };

    format!("{}...", trimmed.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeEnricher {
        result: Result<String, EnrichError>,
    }

    #[async_trait]
    impl Enricher for FakeEnricher {
        async fn enrich(&self, _item: &FeedItem) -> Result<String, EnrichError> {
            match &self.result {
                Ok(s) => Ok(s.clone()),
                Err(EnrichError::Provider(m)) => Err(EnrichError::Provider(m.clone())),
                Err(EnrichError::Timeout) => Err(EnrichError::Timeout),
                Err(EnrichError::InvalidResponse(m)) => Err(EnrichError::InvalidResponse(m.clone())),
            }
        }
    }

    fn sample_item() -> FeedItem {
        FeedItem {
            id: "post1".to_string(),
            title: "A Field Guide to Herons".to_string(),
            body_html: "<p>Herons are <b>patient</b> hunters.</p><p>They wait.</p>".to_string(),
            url: "https://blog.example.com/herons".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_caption_passes_through_enricher_output() {
        let usecase = CaptionUseCase::new(
            FakeEnricher {
                result: Ok("A polished caption".to_string()),
            },
            CaptionConfig::default(),
        );

        let caption = usecase.caption(&sample_item()).await;
        assert_eq!(caption, "A polished caption");
    }

    #[tokio::test]
    async fn test_caption_falls_back_on_enricher_error() {
        let usecase = CaptionUseCase::new(
            FakeEnricher {
                result: Err(EnrichError::Provider("boom".to_string())),
            },
            CaptionConfig::default(),
        );

        let caption = usecase.caption(&sample_item()).await;
        assert!(caption.starts_with("A Field Guide to Herons"));
        assert!(caption.contains("patient hunters"));
        assert!(!caption.contains('<'));
    }

    #[tokio::test]
    async fn test_caption_falls_back_on_empty_output() {
        let usecase = CaptionUseCase::new(
            FakeEnricher {
                result: Ok("   ".to_string()),
            },
            CaptionConfig::default(),
        );

        let caption = usecase.caption(&sample_item()).await;
        assert!(caption.starts_with("A Field Guide to Herons"));
    }

    #[tokio::test]
    async fn test_fallback_is_title_only_for_empty_body() {
        let usecase = CaptionUseCase::new(
            FakeEnricher {
                result: Err(EnrichError::Timeout),
            },
            CaptionConfig::default(),
        );

        let mut item = sample_item();
        item.body_html = String::new();

        let caption = usecase.caption(&item).await;
        assert_eq!(caption, "A Field Guide to Herons");
    }

    #[test]
    fn test_strip_html_removes_tags_and_collapses_whitespace() {
        let stripped = strip_html("<p>Hello   <b>world</b></p>\n<p>again</p>");
        assert_eq!(stripped, "Hello world again");
    }

    #[test]
    fn test_truncate_excerpt_prefers_word_boundary() {
        let text = "one two three four five";
        let truncated = truncate_excerpt(text, 14);
        assert!(truncated.len() <= 14);
        assert!(truncated.ends_with("..."));
        assert!(!truncated.contains("thre"));
    }

    #[test]
    fn test_truncate_excerpt_short_input_unchanged() {
        assert_eq!(truncate_excerpt("short", 100), "short");
    }

    #[test]
    fn test_truncate_excerpt_multibyte_safe() {
        let text = "héron héron héron héron";
        let truncated = truncate_excerpt(text, 10);
        assert!(truncated.chars().count() <= 10);
    }
}
