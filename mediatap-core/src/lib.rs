//! Mediatap Core - Media resolution and proxy functionality
//!
//! This crate provides the fundamental building blocks for fronting external
//! media-extraction tools with an HTTP API: source URL validation, extractor
//! adapters, rendition selection, byte-stream proxying, and configuration
//! management.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod extractor;
pub mod ledger;
pub mod metadata;
pub mod proxy;
pub mod reference;
pub mod selector;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use catalog::{PlaylistCatalog, QualityTier, Rendition, RenditionCatalog, RenditionKind};
pub use config::MediatapConfig;
pub use extractor::{ExtractorError, MediaExtractor};
pub use ledger::{LedgerError, PaymentLedger};
pub use proxy::ProxyError;
pub use reference::{MediaReference, ReferenceError};
pub use selector::SelectorError;

/// Core errors that can bubble up from any Mediatap subsystem.
///
/// High-level error types representing failures in core functionality.
#[derive(Debug, thiserror::Error)]
pub enum MediatapError {
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediatapError {
    /// Returns a user-friendly error message suitable for display.
    ///
    /// Extractor and proxy detail stays in server-side logs; callers see a
    /// generic description so internal tool invocations are not leaked.
    pub fn user_message(&self) -> String {
        match self {
            MediatapError::Reference(e) => e.to_string(),
            MediatapError::Selector(SelectorError::NoMatchingRendition { kind }) => {
                format!("No usable {kind} stream for this media")
            }
            MediatapError::Extractor(_) => "Failed to resolve media information".to_string(),
            MediatapError::Proxy(_) => "Download failed".to_string(),
            MediatapError::Ledger(LedgerError::NotFound { transaction_id }) => {
                format!("Payment {transaction_id} not found")
            }
            MediatapError::Ledger(_) => "Payment operation failed".to_string(),
            MediatapError::Configuration { reason } => {
                format!("Configuration error: {reason}")
            }
            MediatapError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            MediatapError::Reference(_) | MediatapError::Configuration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MediatapError>;
