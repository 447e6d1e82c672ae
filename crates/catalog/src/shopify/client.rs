//! Shopify Admin REST client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::types::{ProductsResponse, RemoteProduct};
use super::{CALL_LIMIT_HEADER, CallLimit, ProductSource, ShopifyError, error_message};
use crate::config::ShopifyConfig;

/// Seconds to wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER: u64 = 2;

/// Client for the Shopify Admin REST API.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    products_url: Url,
    access_token: SecretString,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::InvalidUrl` if the store domain does not form a
    /// valid URL, or `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let mut products_url = Url::parse(&format!(
            "https://{}/admin/api/{}/products.json",
            config.store, config.api_version
        ))?;
        products_url
            .query_pairs_mut()
            .append_pair("limit", &config.products_limit.to_string());

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client: builder.build()?,
                products_url,
                access_token: config.access_token.clone(),
            }),
        })
    }

    /// Products endpoint, including the `limit` query parameter.
    #[must_use]
    pub fn products_url(&self) -> &Url {
        &self.inner.products_url
    }
}

#[async_trait]
impl ProductSource for AdminClient {
    #[instrument(skip(self), fields(url = %self.inner.products_url))]
    async fn fetch_products(&self) -> Result<Vec<RemoteProduct>, ShopifyError> {
        let response = self
            .inner
            .client
            .get(self.inner.products_url.clone())
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if let Some(limit) = response
            .headers()
            .get(CALL_LIMIT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(CallLimit::parse)
        {
            debug!(
                calls_made = limit.made,
                calls_left = limit.left(),
                call_limit = limit.limit,
                "Shopify API call limit"
            );
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split('.').next())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER);
            warn!(retry_after, "Shopify rate limited the products request");
            return Err(ShopifyError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ShopifyError::Unauthorized(error_message(&body)));
        }

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: ProductsResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Shopify products response"
            );
            ShopifyError::Parse(e)
        })?;

        debug!(count = parsed.products.len(), "Fetched remote products");
        Ok(parsed.products)
    }
}
