//! Error to HTTP response mapping.
//!
//! Validation failures are precise and carry a 400; everything that went
//! wrong on our side of the fence collapses to a generic message with the
//! detail kept in server logs. Tool names and invocation detail never
//! reach the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mediatap_core::ledger::LedgerError;
use mediatap_core::{ExtractorError, ProxyError, ReferenceError, SelectorError};
use serde_json::json;
use tracing::error;

/// Errors surfaced by the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    InvalidRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Unauthorized")]
    Unauthorized,

    /// Server-side failure. The caller sees `message`; the underlying
    /// detail was already logged where the failure was mapped.
    #[error("{message}")]
    Upstream { message: String },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ReferenceError> for ApiError {
    fn from(e: ReferenceError) -> Self {
        ApiError::InvalidRequest {
            message: e.to_string(),
        }
    }
}

impl From<ExtractorError> for ApiError {
    fn from(e: ExtractorError) -> Self {
        // Full detail server-side only.
        error!("Extraction failed: {e}");
        ApiError::Upstream {
            message: "Failed to resolve media information".to_string(),
        }
    }
}

impl From<SelectorError> for ApiError {
    fn from(e: SelectorError) -> Self {
        ApiError::NotFound {
            message: e.to_string(),
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(e: ProxyError) -> Self {
        error!("Download failed: {e}");
        let message = match e {
            ProxyError::BatchDownloadFailed { .. } => {
                "All playlist members failed to download".to_string()
            }
            _ => "Download failed".to_string(),
        };
        ApiError::Upstream { message }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound { transaction_id } => ApiError::NotFound {
                message: format!("Payment {transaction_id} not found"),
            },
            LedgerError::AlreadyRecorded { transaction_id } => ApiError::InvalidRequest {
                message: format!("Payment {transaction_id} already recorded"),
            },
            other => {
                error!("Ledger operation failed: {other}");
                ApiError::Upstream {
                    message: "Payment operation failed".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reference_error_is_precise_400() {
        let api: ApiError = ReferenceError::InvalidReference {
            reason: "unrecognized host".to_string(),
        }
        .into();

        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(
            parsed["error"]
                .as_str()
                .unwrap()
                .contains("unrecognized host")
        );
    }

    #[tokio::test]
    async fn test_extractor_error_is_generic_500() {
        let api: ApiError = ExtractorError::Failed {
            cause: "yt-dlp exited with status 1: secret stderr".to_string(),
        }
        .into();

        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // Internal tool detail must not leak outward.
        assert_eq!(
            parsed["error"].as_str().unwrap(),
            "Failed to resolve media information"
        );
    }

    #[test]
    fn test_selector_error_is_404() {
        let api: ApiError = SelectorError::NoMatchingRendition {
            kind: mediatap_core::RenditionKind::Audio,
        }
        .into();
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_is_403() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::FORBIDDEN);
    }
}
