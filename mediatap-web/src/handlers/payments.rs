//! Payment ledger endpoints.
//!
//! Verification is manual: users submit a claim, admins approve or reject
//! it later. Admin routes require the shared `x-admin-key` header.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use mediatap_core::ledger::{PaymentClaim, PaymentRecord};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub transaction_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub transaction_id: String,
    pub reason: String,
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let supplied = headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if supplied != state.config.server.admin_key {
        warn!("Admin request rejected: bad or missing x-admin-key");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

/// POST /api/payments/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(claim): Json<PaymentClaim>,
) -> Result<Json<Value>, ApiError> {
    let record = state.ledger.record(claim).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Payment submitted for verification",
        "transaction_id": record.transaction_id,
    })))
}

/// GET /api/payments/{transaction_id}/status
pub async fn payment_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<PaymentRecord>, ApiError> {
    let record = state.ledger.status(&transaction_id).await?;
    Ok(Json(record))
}

/// GET /api/admin/payments/pending
pub async fn pending_payments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PaymentRecord>>, ApiError> {
    require_admin(&state, &headers)?;
    let pending = state.ledger.pending().await?;
    Ok(Json(pending))
}

/// POST /api/admin/payments/approve
pub async fn approve_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<PaymentRecord>, ApiError> {
    require_admin(&state, &headers)?;
    let record = state.ledger.approve(&request.transaction_id).await?;
    Ok(Json(record))
}

/// POST /api/admin/payments/reject
pub async fn reject_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RejectRequest>,
) -> Result<Json<PaymentRecord>, ApiError> {
    require_admin(&state, &headers)?;
    let record = state
        .ledger
        .reject(&request.transaction_id, &request.reason)
        .await?;
    Ok(Json(record))
}
