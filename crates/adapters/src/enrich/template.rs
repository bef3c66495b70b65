//! Local template enricher
//!
//! Deterministic caption built from the item title and a tag-stripped
//! excerpt of the body. No network, never fails; the offline counterpart
//! of the remote provider.

use async_trait::async_trait;
use feed_courier_domain::usecases::caption::{strip_html, truncate_excerpt};
use feed_courier_domain::{EnrichError, Enricher, FeedItem};

use super::escape_html;

/// Enricher that formats a caption locally
pub struct TemplateEnricher {
    excerpt_max_chars: usize,
}

impl TemplateEnricher {
    pub fn new(excerpt_max_chars: usize) -> Self {
        Self { excerpt_max_chars }
    }
}

impl Default for TemplateEnricher {
    fn default() -> Self {
        Self::new(200)
    }
}

#[async_trait]
impl Enricher for TemplateEnricher {
    async fn enrich(&self, item: &FeedItem) -> Result<String, EnrichError> {
        let excerpt = truncate_excerpt(&strip_html(&item.body_html), self.excerpt_max_chars);
        let title = escape_html(&item.title);

        if excerpt.is_empty() {
            return Ok(format!("<b>{}</b>", title));
        }

        Ok(format!("<b>{}</b>\n\n{}", title, escape_html(&excerpt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, body_html: &str) -> FeedItem {
        FeedItem {
            id: "p1".to_string(),
            title: title.to_string(),
            body_html: body_html.to_string(),
            url: "https://blog.example.com/p1".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_caption_has_bold_title_and_excerpt() {
        let enricher = TemplateEnricher::default();

        let caption = enricher
            .enrich(&item("Hello", "<p>Some <b>body</b> text</p>"))
            .await
            .unwrap();

        assert_eq!(caption, "<b>Hello</b>\n\nSome body text");
    }

    #[tokio::test]
    async fn test_caption_escapes_markup_in_title() {
        let enricher = TemplateEnricher::default();

        let caption = enricher.enrich(&item("A <b> & B", "")).await.unwrap();

        assert_eq!(caption, "<b>A &lt;b&gt; &amp; B</b>");
    }

    #[tokio::test]
    async fn test_excerpt_respects_limit() {
        let enricher = TemplateEnricher::new(20);

        let caption = enricher
            .enrich(&item("T", &"word ".repeat(50)))
            .await
            .unwrap();

        let excerpt = caption.split("\n\n").nth(1).unwrap();
        assert!(excerpt.chars().count() <= 20);
        assert!(excerpt.ends_with("..."));
    }
}
