//! Shopify Admin REST API integration.
//!
//! # Architecture
//!
//! - [`ProductSource`] is the seam between the sync engine and Shopify
//! - [`AdminClient`] implements it over `GET /admin/api/{version}/products.json`
//! - Remote payloads ([`RemoteProduct`], [`RemoteVariant`]) are converted into
//!   write models by [`convert`] before anything touches the store
//!
//! A single page of up to `SHOPIFY_PRODUCTS_LIMIT` products is fetched per
//! sync; pagination is not followed.

mod client;
pub mod convert;
pub mod types;

pub use client::AdminClient;
pub use types::{RemoteProduct, RemoteVariant};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Shopify reported an error for the request.
    #[error("Shopify API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the `errors` field, or the raw body.
        message: String,
    },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The access token was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The configured store did not produce a valid URL.
    #[error("Invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A source of remote product records.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the current remote product list.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` on transport or platform-reported failure.
    async fn fetch_products(&self) -> Result<Vec<RemoteProduct>, ShopifyError>;
}

// =============================================================================
// API call limit
// =============================================================================

/// Header carrying the leaky-bucket state, formatted `made/limit`.
pub const CALL_LIMIT_HEADER: &str = "X-Shopify-Shop-Api-Call-Limit";

/// Parsed `X-Shopify-Shop-Api-Call-Limit` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLimit {
    /// Calls made in the current bucket.
    pub made: u32,
    /// Bucket size.
    pub limit: u32,
}

impl CallLimit {
    /// Parse a `made/limit` header value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (made, limit) = value.trim().split_once('/')?;
        Some(Self {
            made: made.trim().parse().ok()?,
            limit: limit.trim().parse().ok()?,
        })
    }

    /// Calls remaining before Shopify starts throttling.
    #[must_use]
    pub const fn left(self) -> u32 {
        self.limit.saturating_sub(self.made)
    }
}

/// Extract a readable message from a Shopify error body.
///
/// Shopify returns either `{"errors": "text"}` or
/// `{"errors": {"field": ["msg", ...]}}`; anything else is returned truncated.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.chars().take(200).collect();
    };

    match value.get("errors") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Object(fields)) => fields
            .iter()
            .map(|(field, messages)| match messages {
                serde_json::Value::Array(items) => {
                    let joined = items
                        .iter()
                        .map(|m| m.as_str().map_or_else(|| m.to_string(), str::to_string))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{field}: {joined}")
                }
                other => format!("{field}: {other}"),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_limit_parse() {
        let limit = CallLimit::parse("2/40").unwrap_or(CallLimit { made: 0, limit: 0 });
        assert_eq!(limit, CallLimit { made: 2, limit: 40 });
        assert_eq!(limit.left(), 38);
    }

    #[test]
    fn test_call_limit_rejects_garbage() {
        assert_eq!(CallLimit::parse(""), None);
        assert_eq!(CallLimit::parse("40"), None);
        assert_eq!(CallLimit::parse("a/b"), None);
    }

    #[test]
    fn test_call_limit_left_saturates() {
        assert_eq!(CallLimit { made: 41, limit: 40 }.left(), 0);
    }

    #[test]
    fn test_error_message_string_form() {
        assert_eq!(
            error_message(r#"{"errors":"[API] Invalid API key or access token"}"#),
            "[API] Invalid API key or access token"
        );
    }

    #[test]
    fn test_error_message_field_form() {
        assert_eq!(
            error_message(r#"{"errors":{"title":["can't be blank"]}}"#),
            "title: can't be blank"
        );
    }

    #[test]
    fn test_error_message_plain_body() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_api_error_display() {
        let err = ShopifyError::Api {
            status: 422,
            message: "title: can't be blank".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shopify API error (422): title: can't be blank"
        );

        let err = ShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");
    }
}
