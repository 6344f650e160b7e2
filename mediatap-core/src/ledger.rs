//! Payment ledger collaborator.
//!
//! Not on the resolution hot path: the core never calls this. The ledger
//! records payment claims for later manual verification. Persistence is one
//! JSON file per record with write-temp-then-rename updates, so concurrent
//! admin actions on different records never clobber each other.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

/// Lifecycle of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    PendingVerification,
    Approved,
    Rejected,
}

/// One recorded payment claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
    pub days_count: u32,
    pub upi_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Fields supplied by the caller when recording a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentClaim {
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
    pub days_count: u32,
    pub upi_id: String,
}

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Payment {transaction_id} not found")]
    NotFound { transaction_id: String },

    #[error("Payment {transaction_id} already recorded")]
    AlreadyRecorded { transaction_id: String },

    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Injected repository interface for payment records.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Records a new claim in pending state.
    async fn record(&self, claim: PaymentClaim) -> Result<PaymentRecord, LedgerError>;

    /// Lists records still awaiting verification.
    async fn pending(&self) -> Result<Vec<PaymentRecord>, LedgerError>;

    /// Marks a record approved.
    async fn approve(&self, transaction_id: &str) -> Result<PaymentRecord, LedgerError>;

    /// Marks a record rejected with a reason.
    async fn reject(&self, transaction_id: &str, reason: &str)
    -> Result<PaymentRecord, LedgerError>;

    /// Looks up one record.
    async fn status(&self, transaction_id: &str) -> Result<PaymentRecord, LedgerError>;
}

/// File-backed ledger: one JSON file per record under a directory.
///
/// Updates write a sibling temp file and rename over the original, so a
/// crash mid-update leaves the previous version intact.
pub struct FileLedger {
    directory: PathBuf,
    /// Serializes writers; readers go straight to disk.
    write_lock: Mutex<()>,
}

impl FileLedger {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn record_path(&self, transaction_id: &str) -> PathBuf {
        // Transaction ids are opaque caller input; encode anything that
        // could escape the ledger directory.
        let safe: String = transaction_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.directory.join(format!("{safe}.json"))
    }

    async fn read_record(&self, path: &Path) -> Result<PaymentRecord, LedgerError> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn write_record(&self, record: &PaymentRecord) -> Result<(), LedgerError> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let target = self.record_path(&record.transaction_id);
        let temp = target.with_extension("json.tmp");
        let serialized = serde_json::to_vec_pretty(record)?;

        tokio::fs::write(&temp, serialized).await?;
        tokio::fs::rename(&temp, &target).await?;
        Ok(())
    }

    async fn load(&self, transaction_id: &str) -> Result<PaymentRecord, LedgerError> {
        let path = self.record_path(transaction_id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(LedgerError::NotFound {
                transaction_id: transaction_id.to_string(),
            });
        }
        self.read_record(&path).await
    }
}

#[async_trait]
impl PaymentLedger for FileLedger {
    async fn record(&self, claim: PaymentClaim) -> Result<PaymentRecord, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let path = self.record_path(&claim.transaction_id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(LedgerError::AlreadyRecorded {
                transaction_id: claim.transaction_id,
            });
        }

        let record = PaymentRecord {
            transaction_id: claim.transaction_id,
            amount: claim.amount,
            currency: claim.currency,
            days_count: claim.days_count,
            upi_id: claim.upi_id,
            status: PaymentStatus::PendingVerification,
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
        };

        self.write_record(&record).await?;
        info!(transaction_id = %record.transaction_id, "Payment recorded");
        Ok(record)
    }

    async fn pending(&self) -> Result<Vec<PaymentRecord>, LedgerError> {
        let mut records = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            // No directory yet means no records yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(record) = self.read_record(&path).await {
                if record.status == PaymentStatus::PendingVerification {
                    records.push(record);
                }
            }
        }

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn approve(&self, transaction_id: &str) -> Result<PaymentRecord, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.load(transaction_id).await?;
        record.status = PaymentStatus::Approved;
        record.approved_at = Some(Utc::now());
        self.write_record(&record).await?;

        info!(%transaction_id, "Payment approved");
        Ok(record)
    }

    async fn reject(
        &self,
        transaction_id: &str,
        reason: &str,
    ) -> Result<PaymentRecord, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.load(transaction_id).await?;
        record.status = PaymentStatus::Rejected;
        record.rejected_at = Some(Utc::now());
        record.rejection_reason = Some(reason.to_string());
        self.write_record(&record).await?;

        info!(%transaction_id, reason, "Payment rejected");
        Ok(record)
    }

    async fn status(&self, transaction_id: &str) -> Result<PaymentRecord, LedgerError> {
        self.load(transaction_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(id: &str) -> PaymentClaim {
        PaymentClaim {
            transaction_id: id.to_string(),
            amount: 99.0,
            currency: "INR".to_string(),
            days_count: 30,
            upi_id: "user@bank".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_and_status_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path());

        let recorded = ledger.record(claim("txn-1")).await.unwrap();
        assert_eq!(recorded.status, PaymentStatus::PendingVerification);

        let fetched = ledger.status("txn-1").await.unwrap();
        assert_eq!(fetched, recorded);
    }

    #[tokio::test]
    async fn test_duplicate_record_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path());

        ledger.record(claim("txn-1")).await.unwrap();
        let result = ledger.record(claim("txn-1")).await;
        assert!(matches!(result, Err(LedgerError::AlreadyRecorded { .. })));
    }

    #[tokio::test]
    async fn test_approve_and_reject_update_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path());

        ledger.record(claim("txn-1")).await.unwrap();
        ledger.record(claim("txn-2")).await.unwrap();

        let approved = ledger.approve("txn-1").await.unwrap();
        assert_eq!(approved.status, PaymentStatus::Approved);
        assert!(approved.approved_at.is_some());

        let rejected = ledger.reject("txn-2", "no matching transfer").await.unwrap();
        assert_eq!(rejected.status, PaymentStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("no matching transfer")
        );

        // Updates touched only their own record files.
        assert!(ledger.pending().await.unwrap().is_empty());
        assert_eq!(
            ledger.status("txn-1").await.unwrap().status,
            PaymentStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_pending_lists_only_unverified() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path());

        ledger.record(claim("txn-1")).await.unwrap();
        ledger.record(claim("txn-2")).await.unwrap();
        ledger.approve("txn-1").await.unwrap();

        let pending = ledger.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].transaction_id, "txn-2");
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path());

        assert!(matches!(
            ledger.status("missing").await,
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.approve("missing").await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_hostile_transaction_id_stays_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path());

        ledger.record(claim("../../etc/passwd")).await.unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].contains('/'));
    }
}
