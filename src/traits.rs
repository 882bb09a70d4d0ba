//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::*;

/// Filter for transaction queries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub merchant_id: Option<String>,
    pub status: Option<TransactionStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// Only transactions without a settlement batch
    pub unbatched_only: bool,
}

impl TransactionFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.merchant_id
            .as_ref()
            .map_or(true, |m| &transaction.merchant_id == m)
            && self.status.map_or(true, |s| transaction.status == s)
            && self
                .from_date
                .map_or(true, |d| transaction.transaction_date >= d)
            && self.to_date.map_or(true, |d| transaction.transaction_date <= d)
            && (!self.unbatched_only || !transaction.is_batched())
    }
}

/// Rolling reserve to hold as part of a settlement commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveHold {
    pub hold_date: NaiveDate,
    pub release_date: NaiveDate,
    pub reserve_percentage: BigDecimal,
    pub hold_days: u32,
}

/// Everything written when a settlement batch is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementCommit {
    pub batch: SettlementBatch,
    /// Move the batch's transactions to `SETTLED` as well as linking them
    pub mark_settled: bool,
    /// Queue rows to mark `PROCESSED` in the same unit
    pub processed_queue_ids: Vec<Uuid>,
    /// Reserve entry to append when the batch withheld a reserve
    pub reserve_hold: Option<ReserveHold>,
    pub committed_at: NaiveDateTime,
}

/// Storage abstraction for the settlement system
///
/// This trait allows the engine to work with any storage backend (PostgreSQL,
/// in-memory, etc.). Methods documented as atomic must apply all of their
/// writes or none of them.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Save or replace a merchant master record
    async fn save_merchant(&self, merchant: &MerchantConfig) -> LedgerResult<()>;

    /// Get a merchant by canonical id
    async fn get_merchant(&self, merchant_id: &str) -> LedgerResult<Option<MerchantConfig>>;

    /// Register an alternate id (e.g. a UUID) for a merchant
    async fn save_merchant_alias(&self, alias: &str, merchant_id: &str) -> LedgerResult<()>;

    /// Look up the canonical merchant id for an alias
    async fn resolve_merchant_alias(&self, alias: &str) -> LedgerResult<Option<String>>;

    async fn save_commission_config(&self, config: &CommissionConfig) -> LedgerResult<()>;

    /// All commission rows for a merchant in insertion order, active or not
    async fn list_commission_configs(&self, merchant_id: &str) -> LedgerResult<Vec<CommissionConfig>>;

    async fn save_fee_bearer_config(&self, config: &FeeBearerConfig) -> LedgerResult<()>;

    /// Active fee-bearer row for a merchant and payment mode id
    async fn get_fee_bearer_config(
        &self,
        merchant_id: &str,
        payment_mode_id: &str,
    ) -> LedgerResult<Option<FeeBearerConfig>>;

    async fn save_settlement_profile(&self, profile: &MerchantSettlementProfile) -> LedgerResult<()>;

    async fn get_settlement_profile(
        &self,
        merchant_id: &str,
    ) -> LedgerResult<Option<MerchantSettlementProfile>>;

    /// Active settlement profiles ordered by merchant id
    async fn list_settlement_profiles(&self) -> LedgerResult<Vec<MerchantSettlementProfile>>;

    /// Save or replace a transaction
    async fn save_transaction(&self, transaction: &Transaction) -> LedgerResult<()>;

    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>>;

    /// Transactions for the given ids, in the given order; unknown ids are skipped
    async fn get_transactions_by_ids(&self, ids: &[String]) -> LedgerResult<Vec<Transaction>>;

    /// Transactions matching a filter, ordered by date then id
    async fn list_transactions(&self, filter: &TransactionFilter) -> LedgerResult<Vec<Transaction>>;

    /// Append bank statement lines for a cycle date
    async fn save_bank_records(&self, cycle_date: NaiveDate, records: &[BankRecord]) -> LedgerResult<()>;

    async fn list_bank_records(&self, cycle_date: NaiveDate) -> LedgerResult<Vec<BankRecord>>;

    /// Atomically store match results, move matched transactions to
    /// `RECONCILED` and queue them for settlement. Returns the number queued.
    async fn persist_reconciliation(
        &self,
        job_id: Uuid,
        results: &[MatchResult],
        queued_at: NaiveDateTime,
    ) -> LedgerResult<usize>;

    /// Stored results for a reconciliation job
    async fn list_reconciliation_results(&self, job_id: Uuid) -> LedgerResult<Vec<MatchResult>>;

    async fn enqueue_settlement(&self, entry: &SettlementQueueEntry) -> LedgerResult<()>;

    /// Queue rows, optionally by status, ordered by `queued_at`
    async fn list_queue_entries(&self, status: Option<QueueStatus>)
        -> LedgerResult<Vec<SettlementQueueEntry>>;

    /// Atomically move the given rows from `PENDING` to `PROCESSING`.
    ///
    /// Only rows still `PENDING` are claimed; the claimed rows are returned.
    /// Two concurrent claims over the same rows never both win a row.
    async fn claim_queue_entries(
        &self,
        ids: &[Uuid],
        now: NaiveDateTime,
    ) -> LedgerResult<Vec<SettlementQueueEntry>>;

    /// Mark rows `FAILED` with a message, optionally bumping `retry_count`
    async fn fail_queue_entries(
        &self,
        ids: &[Uuid],
        message: &str,
        bump_retry: bool,
        now: NaiveDateTime,
    ) -> LedgerResult<()>;

    /// Mark rows `PROCESSED`
    async fn complete_queue_entries(&self, ids: &[Uuid], now: NaiveDateTime) -> LedgerResult<()>;

    /// Move `FAILED` rows back to `PENDING` for another attempt. Returns the count.
    async fn requeue_failed(&self, now: NaiveDateTime) -> LedgerResult<usize>;

    async fn find_batch(
        &self,
        merchant_id: &str,
        cycle_date: NaiveDate,
    ) -> LedgerResult<Option<SettlementBatch>>;

    async fn get_batch(&self, batch_id: Uuid) -> LedgerResult<Option<SettlementBatch>>;

    /// Batches ordered by cycle date, optionally for one merchant
    async fn list_batches(&self, merchant_id: Option<&str>) -> LedgerResult<Vec<SettlementBatch>>;

    /// Atomically write a batch with its items, link its transactions,
    /// append the reserve entry and finish the listed queue rows.
    ///
    /// Fails with [`LedgerError::DuplicateBatch`] if the merchant already has
    /// a batch for the cycle date, and with [`LedgerError::InvariantViolation`]
    /// if any transaction is already batched. Returns the reserve entry written.
    async fn commit_settlement(
        &self,
        commit: &SettlementCommit,
    ) -> LedgerResult<Option<RollingReserveEntry>>;

    async fn update_batch_status(
        &self,
        batch_id: Uuid,
        status: BatchStatus,
        now: NaiveDateTime,
    ) -> LedgerResult<()>;

    /// Reserve entries for a merchant in the order they were held
    async fn list_reserve_entries(&self, merchant_id: &str) -> LedgerResult<Vec<RollingReserveEntry>>;

    /// Queue a bank transfer. Idempotent per batch: an existing item for the
    /// batch is returned instead of creating another.
    async fn enqueue_transfer(&self, item: &BankTransferQueueItem) -> LedgerResult<BankTransferQueueItem>;

    async fn find_transfer_for_batch(&self, batch_id: Uuid) -> LedgerResult<Option<BankTransferQueueItem>>;

    async fn list_transfers(&self) -> LedgerResult<Vec<BankTransferQueueItem>>;

    /// Save or replace a schedule run
    async fn save_schedule_run(&self, run: &ScheduleRun) -> LedgerResult<()>;

    async fn get_schedule_run(&self, run_id: Uuid) -> LedgerResult<Option<ScheduleRun>>;

    /// Schedule runs, most recent first
    async fn list_schedule_runs(&self) -> LedgerResult<Vec<ScheduleRun>>;
}

/// Externally owned store for reconciliation jobs and their logs
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn put_job(&self, job: &ReconciliationJob) -> LedgerResult<()>;

    async fn get_job(&self, job_id: Uuid) -> LedgerResult<Option<ReconciliationJob>>;

    /// All jobs, most recently started first
    async fn list_jobs(&self) -> LedgerResult<Vec<ReconciliationJob>>;

    async fn append_log(&self, job_id: Uuid, entry: JobLogEntry) -> LedgerResult<()>;

    async fn job_logs(&self, job_id: Uuid) -> LedgerResult<Vec<JobLogEntry>>;
}

/// Trait for implementing custom transaction validation rules
pub trait TransactionValidator: Send + Sync {
    /// Validate a transaction before it is settled
    fn validate_transaction(&self, transaction: &Transaction) -> LedgerResult<()>;
}

/// Default transaction validator with basic structural rules
pub struct DefaultTransactionValidator;

impl TransactionValidator for DefaultTransactionValidator {
    fn validate_transaction(&self, transaction: &Transaction) -> LedgerResult<()> {
        transaction.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_filter() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut transaction = Transaction::new(
            "T1".to_string(),
            "M1".to_string(),
            1_000,
            "UPI".to_string(),
            date,
        )
        .with_status(TransactionStatus::Reconciled);

        let filter = TransactionFilter {
            merchant_id: Some("M1".to_string()),
            status: Some(TransactionStatus::Reconciled),
            from_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            to_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            unbatched_only: true,
        };
        assert!(filter.matches(&transaction));

        transaction.settlement_batch_id = Some(Uuid::new_v4());
        assert!(!filter.matches(&transaction));
        assert!(TransactionFilter::default().matches(&transaction));
    }
}
