//! Mediatap Web - HTTP API server
//!
//! JSON endpoints for media metadata, direct download links, streamed
//! single-item downloads, playlist archives, and the payment ledger.
//! Handlers are thin: request parsing and response mapping here, all
//! resolution logic in mediatap-core.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, build_router, run_server};
