//! Stub enricher for testing and offline mode

use async_trait::async_trait;
use feed_courier_domain::{EnrichError, Enricher, FeedItem};

/// Stub enricher with configurable behavior
pub struct StubEnricher {
    caption: Option<String>,
    error: Option<EnrichError>,
}

impl StubEnricher {
    /// Create a stub that echoes the item title as the caption
    pub fn titled() -> Self {
        Self {
            caption: None,
            error: None,
        }
    }

    /// Create a stub that returns a fixed caption
    pub fn with_caption(caption: impl Into<String>) -> Self {
        Self {
            caption: Some(caption.into()),
            error: None,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: EnrichError) -> Self {
        Self {
            caption: None,
            error: Some(error),
        }
    }
}

impl Default for StubEnricher {
    fn default() -> Self {
        Self::titled()
    }
}

#[async_trait]
impl Enricher for StubEnricher {
    async fn enrich(&self, item: &FeedItem) -> Result<String, EnrichError> {
        if let Some(error) = &self.error {
            return Err(match error {
                EnrichError::Provider(m) => EnrichError::Provider(m.clone()),
                EnrichError::Timeout => EnrichError::Timeout,
                EnrichError::InvalidResponse(m) => EnrichError::InvalidResponse(m.clone()),
            });
        }

        if let Some(caption) = &self.caption {
            return Ok(caption.clone());
        }

        Ok(item.title.clone())
    }
}
