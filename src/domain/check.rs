//! Per-row audit classification

use serde::Serialize;
use std::fmt;

/// Outcome of probing one row's image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    /// Probe answered with something other than 200
    HttpStatus(u16),
    /// Transport-level failure (DNS, connect, timeout, TLS, malformed URL)
    Error(String),
    /// Row carries no image reference; no probe was made
    NoUrl,
}

impl CheckStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::HttpStatus(code) => write!(f, "http_status:{code}"),
            Self::Error(message) => write!(f, "error:{message}"),
            Self::NoUrl => write!(f, "no_url"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    #[serde(rename = "idSku")]
    pub id_sku: String,
    /// The checked URL; empty for [`CheckStatus::NoUrl`]
    pub url: String,
    pub status: CheckStatus,
}

impl CheckResult {
    /// First `width` characters of the URL, for display.
    pub fn url_prefix(&self, width: usize) -> &str {
        truncate_chars(&self.url, width)
    }
}

/// First `width` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, width: usize) -> &str {
    text.char_indices()
        .nth(width)
        .map_or(text, |(idx, _)| &text[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(CheckStatus::Ok.to_string(), "ok");
        assert_eq!(CheckStatus::HttpStatus(404).to_string(), "http_status:404");
        assert_eq!(
            CheckStatus::Error("operation timed out".into()).to_string(),
            "error:operation timed out"
        );
        assert_eq!(CheckStatus::NoUrl.to_string(), "no_url");
    }

    #[test]
    fn test_url_prefix_truncates_on_char_boundary() {
        let result = CheckResult {
            id_sku: "1".into(),
            url: "https://example.com/ürün/görsel.png".into(),
            status: CheckStatus::HttpStatus(404),
        };
        assert_eq!(result.url_prefix(22), "https://example.com/ür");
        assert_eq!(result.url_prefix(500), result.url);
        assert_eq!(result.url_prefix(0), "");
    }
}
