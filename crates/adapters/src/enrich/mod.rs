//! Caption enricher adapters

pub mod remote;
pub mod stub;
pub mod template;

pub use remote::RemoteEnricher;
pub use stub::StubEnricher;
pub use template::TemplateEnricher;

/// Common configuration for HTTP-backed enrichers
#[derive(Debug, Clone)]
pub struct EnrichHttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries on failure
    pub retries: u32,
}

impl Default for EnrichHttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 2,
        }
    }
}

/// Escape text for HTML-formatted message bodies
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
