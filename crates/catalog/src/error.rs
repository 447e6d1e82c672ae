//! Unified error handling for the catalog service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::sync::SyncError;

/// Application-level error type for catalog handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// A catalog sync failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Sync(SyncError::Store(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Catalog request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Sync(SyncError::Store(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Sync(SyncError::Remote(_) | SyncError::EmptyCatalog) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match self {
            Self::Database(_) | Self::Sync(SyncError::Store(_)) => {
                "Internal server error".to_string()
            }
            Self::Sync(SyncError::EmptyCatalog) => "Error syncing products.".to_string(),
            Self::Sync(SyncError::Remote(e)) => e.to_string(),
            Self::NotFound(message) | Self::BadRequest(message) => message,
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::ShopifyError;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product ID not found.".to_string());
        assert_eq!(err.to_string(), "Not found: Product ID not found.");

        let err = AppError::Sync(SyncError::EmptyCatalog);
        assert_eq!(err.to_string(), "Sync error: Shopify returned no products");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::CatalogLoad(
                "test".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Sync(SyncError::EmptyCatalog)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Sync(SyncError::Remote(ShopifyError::RateLimited(2)))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Sync(SyncError::Store(
                RepositoryError::DataCorruption("x".to_string())
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_found_body_is_plain_message() {
        let response = AppError::NotFound("Product ID not found.".to_string()).into_response();
        assert_eq!(body_text(response).await, "Product ID not found.");
    }

    #[tokio::test]
    async fn test_remote_failure_body_describes_error() {
        let response = AppError::Sync(SyncError::Remote(ShopifyError::Unauthorized(
            "[API] Invalid API key or access token".to_string(),
        )))
        .into_response();
        assert_eq!(
            body_text(response).await,
            "Unauthorized: [API] Invalid API key or access token"
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Database(RepositoryError::DataCorruption(
            "secret stack trace".to_string(),
        ))
        .into_response();
        assert_eq!(body_text(response).await, "Internal server error");
    }
}
