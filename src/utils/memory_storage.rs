//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct LedgerState {
    merchants: HashMap<String, MerchantConfig>,
    aliases: HashMap<String, String>,
    commission_configs: Vec<CommissionConfig>,
    fee_bearers: Vec<FeeBearerConfig>,
    profiles: BTreeMap<String, MerchantSettlementProfile>,
    transactions: HashMap<String, Transaction>,
    bank_records: BTreeMap<NaiveDate, Vec<BankRecord>>,
    recon_results: HashMap<Uuid, Vec<MatchResult>>,
    queue: Vec<SettlementQueueEntry>,
    batches: Vec<SettlementBatch>,
    reserves: Vec<RollingReserveEntry>,
    transfers: Vec<BankTransferQueueItem>,
    schedule_runs: HashMap<Uuid, ScheduleRun>,
    fail_next: HashMap<FailPoint, String>,
}

/// Store operations that can be made to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Commit,
    ListTransactions,
    ListSettlementProfiles,
}

/// In-memory storage implementation for testing and development
///
/// All state sits behind one lock, so every trait method is atomic. Clones
/// share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("memory store lock poisoned".to_string()))
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        *self.write()? = LedgerState::default();
        Ok(())
    }

    /// Make the next call at `point` fail with a storage error
    pub fn fail_next(&self, point: FailPoint, message: &str) -> LedgerResult<()> {
        self.write()?.fail_next.insert(point, message.to_string());
        Ok(())
    }

    /// Make the next `commit_settlement` fail with a storage error
    pub fn fail_next_commit(&self, message: &str) -> LedgerResult<()> {
        self.fail_next(FailPoint::Commit, message)
    }

    fn check_failure(&self, point: FailPoint) -> LedgerResult<()> {
        match self.write()?.fail_next.remove(&point) {
            Some(message) => Err(LedgerError::Storage(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_merchant(&self, merchant: &MerchantConfig) -> LedgerResult<()> {
        self.write()?
            .merchants
            .insert(merchant.merchant_id.clone(), merchant.clone());
        Ok(())
    }

    async fn get_merchant(&self, merchant_id: &str) -> LedgerResult<Option<MerchantConfig>> {
        Ok(self.read()?.merchants.get(merchant_id).cloned())
    }

    async fn save_merchant_alias(&self, alias: &str, merchant_id: &str) -> LedgerResult<()> {
        self.write()?
            .aliases
            .insert(alias.to_string(), merchant_id.to_string());
        Ok(())
    }

    async fn resolve_merchant_alias(&self, alias: &str) -> LedgerResult<Option<String>> {
        Ok(self.read()?.aliases.get(alias).cloned())
    }

    async fn save_commission_config(&self, config: &CommissionConfig) -> LedgerResult<()> {
        self.write()?.commission_configs.push(config.clone());
        Ok(())
    }

    async fn list_commission_configs(&self, merchant_id: &str) -> LedgerResult<Vec<CommissionConfig>> {
        Ok(self
            .read()?
            .commission_configs
            .iter()
            .filter(|c| c.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn save_fee_bearer_config(&self, config: &FeeBearerConfig) -> LedgerResult<()> {
        let mut state = self.write()?;
        state.fee_bearers.retain(|f| {
            !(f.merchant_id == config.merchant_id && f.payment_mode_id == config.payment_mode_id)
        });
        state.fee_bearers.push(config.clone());
        Ok(())
    }

    async fn get_fee_bearer_config(
        &self,
        merchant_id: &str,
        payment_mode_id: &str,
    ) -> LedgerResult<Option<FeeBearerConfig>> {
        Ok(self
            .read()?
            .fee_bearers
            .iter()
            .find(|f| {
                f.is_active && f.merchant_id == merchant_id && f.payment_mode_id == payment_mode_id
            })
            .cloned())
    }

    async fn save_settlement_profile(&self, profile: &MerchantSettlementProfile) -> LedgerResult<()> {
        self.write()?
            .profiles
            .insert(profile.merchant_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_settlement_profile(
        &self,
        merchant_id: &str,
    ) -> LedgerResult<Option<MerchantSettlementProfile>> {
        Ok(self.read()?.profiles.get(merchant_id).cloned())
    }

    async fn list_settlement_profiles(&self) -> LedgerResult<Vec<MerchantSettlementProfile>> {
        self.check_failure(FailPoint::ListSettlementProfiles)?;
        Ok(self
            .read()?
            .profiles
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn save_transaction(&self, transaction: &Transaction) -> LedgerResult<()> {
        self.write()?
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        Ok(self.read()?.transactions.get(transaction_id).cloned())
    }

    async fn get_transactions_by_ids(&self, ids: &[String]) -> LedgerResult<Vec<Transaction>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.transactions.get(id).cloned())
            .collect())
    }

    async fn list_transactions(&self, filter: &TransactionFilter) -> LedgerResult<Vec<Transaction>> {
        self.check_failure(FailPoint::ListTransactions)?;
        let mut transactions: Vec<Transaction> = self
            .read()?
            .transactions
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(transactions)
    }

    async fn save_bank_records(&self, cycle_date: NaiveDate, records: &[BankRecord]) -> LedgerResult<()> {
        self.write()?
            .bank_records
            .entry(cycle_date)
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }

    async fn list_bank_records(&self, cycle_date: NaiveDate) -> LedgerResult<Vec<BankRecord>> {
        Ok(self
            .read()?
            .bank_records
            .get(&cycle_date)
            .cloned()
            .unwrap_or_default())
    }

    async fn persist_reconciliation(
        &self,
        job_id: Uuid,
        results: &[MatchResult],
        queued_at: NaiveDateTime,
    ) -> LedgerResult<usize> {
        let mut state = self.write()?;

        let matched_ids: Vec<&str> = results
            .iter()
            .filter_map(|r| match r {
                MatchResult::Matched { pg, .. } => Some(pg.id.as_str()),
                _ => None,
            })
            .collect();

        if let Some(missing) = matched_ids
            .iter()
            .find(|id| !state.transactions.contains_key(**id))
        {
            return Err(LedgerError::TransactionNotFound(missing.to_string()));
        }

        let already_queued: HashSet<String> = state
            .queue
            .iter()
            .filter(|e| e.status != QueueStatus::Failed)
            .map(|e| e.transaction_id.clone())
            .collect();

        let mut queued = 0;
        for id in matched_ids {
            let Some(transaction) = state.transactions.get_mut(id) else {
                continue;
            };
            if transaction.status == TransactionStatus::Captured {
                transaction.status = TransactionStatus::Reconciled;
            }
            let entry = SettlementQueueEntry::pending(transaction, queued_at);
            if !already_queued.contains(id) {
                state.queue.push(entry);
                queued += 1;
            }
        }

        state
            .recon_results
            .entry(job_id)
            .or_default()
            .extend_from_slice(results);
        Ok(queued)
    }

    async fn list_reconciliation_results(&self, job_id: Uuid) -> LedgerResult<Vec<MatchResult>> {
        Ok(self
            .read()?
            .recon_results
            .get(&job_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn enqueue_settlement(&self, entry: &SettlementQueueEntry) -> LedgerResult<()> {
        self.write()?.queue.push(entry.clone());
        Ok(())
    }

    async fn list_queue_entries(
        &self,
        status: Option<QueueStatus>,
    ) -> LedgerResult<Vec<SettlementQueueEntry>> {
        let mut entries: Vec<SettlementQueueEntry> = self
            .read()?
            .queue
            .iter()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.queued_at);
        Ok(entries)
    }

    async fn claim_queue_entries(
        &self,
        ids: &[Uuid],
        now: NaiveDateTime,
    ) -> LedgerResult<Vec<SettlementQueueEntry>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut state = self.write()?;

        let mut claimed = Vec::new();
        for entry in state.queue.iter_mut() {
            if wanted.contains(&entry.id) && entry.status == QueueStatus::Pending {
                entry.status = QueueStatus::Processing;
                entry.updated_at = now;
                claimed.push(entry.clone());
            }
        }
        claimed.sort_by_key(|e| e.queued_at);
        Ok(claimed)
    }

    async fn fail_queue_entries(
        &self,
        ids: &[Uuid],
        message: &str,
        bump_retry: bool,
        now: NaiveDateTime,
    ) -> LedgerResult<()> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut state = self.write()?;

        for entry in state.queue.iter_mut().filter(|e| wanted.contains(&e.id)) {
            entry.status = QueueStatus::Failed;
            entry.error_message = Some(message.to_string());
            entry.updated_at = now;
            if bump_retry {
                entry.retry_count += 1;
            }
        }
        Ok(())
    }

    async fn complete_queue_entries(&self, ids: &[Uuid], now: NaiveDateTime) -> LedgerResult<()> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut state = self.write()?;

        for entry in state.queue.iter_mut().filter(|e| wanted.contains(&e.id)) {
            entry.status = QueueStatus::Processed;
            entry.processed_at = Some(now);
            entry.updated_at = now;
        }
        Ok(())
    }

    async fn requeue_failed(&self, now: NaiveDateTime) -> LedgerResult<usize> {
        let mut state = self.write()?;
        let mut count = 0;
        for entry in state
            .queue
            .iter_mut()
            .filter(|e| e.status == QueueStatus::Failed)
        {
            entry.status = QueueStatus::Pending;
            entry.updated_at = now;
            count += 1;
        }
        Ok(count)
    }

    async fn find_batch(
        &self,
        merchant_id: &str,
        cycle_date: NaiveDate,
    ) -> LedgerResult<Option<SettlementBatch>> {
        Ok(self
            .read()?
            .batches
            .iter()
            .find(|b| b.merchant_id == merchant_id && b.cycle_date == cycle_date)
            .cloned())
    }

    async fn get_batch(&self, batch_id: Uuid) -> LedgerResult<Option<SettlementBatch>> {
        Ok(self
            .read()?
            .batches
            .iter()
            .find(|b| b.id == batch_id)
            .cloned())
    }

    async fn list_batches(&self, merchant_id: Option<&str>) -> LedgerResult<Vec<SettlementBatch>> {
        let mut batches: Vec<SettlementBatch> = self
            .read()?
            .batches
            .iter()
            .filter(|b| merchant_id.map_or(true, |m| b.merchant_id == m))
            .cloned()
            .collect();
        batches.sort_by(|a, b| {
            a.cycle_date
                .cmp(&b.cycle_date)
                .then_with(|| a.merchant_id.cmp(&b.merchant_id))
        });
        Ok(batches)
    }

    async fn commit_settlement(
        &self,
        commit: &SettlementCommit,
    ) -> LedgerResult<Option<RollingReserveEntry>> {
        let mut state = self.write()?;
        let batch = &commit.batch;

        if let Some(message) = state.fail_next.remove(&FailPoint::Commit) {
            return Err(LedgerError::Storage(message));
        }

        if state
            .batches
            .iter()
            .any(|b| b.merchant_id == batch.merchant_id && b.cycle_date == batch.cycle_date)
        {
            return Err(LedgerError::DuplicateBatch {
                merchant_id: batch.merchant_id.clone(),
                cycle_date: batch.cycle_date,
            });
        }

        batch.verify_totals()?;

        for item in &batch.items {
            match state.transactions.get(&item.transaction_id) {
                None => return Err(LedgerError::TransactionNotFound(item.transaction_id.clone())),
                Some(t) if t.is_batched() => {
                    return Err(LedgerError::InvariantViolation(format!(
                        "Transaction {} is already in batch {:?}",
                        t.id, t.settlement_batch_id
                    )))
                }
                Some(_) => {}
            }
        }

        for item in &batch.items {
            if let Some(transaction) = state.transactions.get_mut(&item.transaction_id) {
                transaction.settlement_batch_id = Some(batch.id);
                if commit.mark_settled {
                    transaction.status = TransactionStatus::Settled;
                    transaction.settled_at = Some(commit.committed_at);
                }
            }
        }

        let processed: HashSet<&Uuid> = commit.processed_queue_ids.iter().collect();
        for entry in state.queue.iter_mut().filter(|e| processed.contains(&e.id)) {
            entry.status = QueueStatus::Processed;
            entry.processed_at = Some(commit.committed_at);
            entry.updated_at = commit.committed_at;
        }

        let reserve_entry = match &commit.reserve_hold {
            Some(hold) if batch.total_reserve_paise > 0 => {
                let previous_balance = state
                    .reserves
                    .iter()
                    .rev()
                    .find(|r| r.merchant_id == batch.merchant_id)
                    .map(|r| r.balance_paise)
                    .unwrap_or(0);
                let entry = RollingReserveEntry {
                    id: Uuid::new_v4(),
                    merchant_id: batch.merchant_id.clone(),
                    batch_id: batch.id,
                    reserve_amount_paise: batch.total_reserve_paise,
                    balance_paise: previous_balance + batch.total_reserve_paise,
                    hold_date: hold.hold_date,
                    release_date: hold.release_date,
                    reserve_percentage: hold.reserve_percentage.clone(),
                    hold_days: hold.hold_days,
                    status: ReserveStatus::Held,
                };
                state.reserves.push(entry.clone());
                Some(entry)
            }
            _ => None,
        };

        state.batches.push(batch.clone());
        Ok(reserve_entry)
    }

    async fn update_batch_status(
        &self,
        batch_id: Uuid,
        status: BatchStatus,
        now: NaiveDateTime,
    ) -> LedgerResult<()> {
        let mut state = self.write()?;
        let batch = state
            .batches
            .iter_mut()
            .find(|b| b.id == batch_id)
            .ok_or(LedgerError::BatchNotFound(batch_id))?;
        batch.status = status;
        batch.updated_at = now;
        Ok(())
    }

    async fn list_reserve_entries(&self, merchant_id: &str) -> LedgerResult<Vec<RollingReserveEntry>> {
        Ok(self
            .read()?
            .reserves
            .iter()
            .filter(|r| r.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn enqueue_transfer(&self, item: &BankTransferQueueItem) -> LedgerResult<BankTransferQueueItem> {
        let mut state = self.write()?;
        if let Some(existing) = state.transfers.iter().find(|t| t.batch_id == item.batch_id) {
            return Ok(existing.clone());
        }
        state.transfers.push(item.clone());
        Ok(item.clone())
    }

    async fn find_transfer_for_batch(&self, batch_id: Uuid) -> LedgerResult<Option<BankTransferQueueItem>> {
        Ok(self
            .read()?
            .transfers
            .iter()
            .find(|t| t.batch_id == batch_id)
            .cloned())
    }

    async fn list_transfers(&self) -> LedgerResult<Vec<BankTransferQueueItem>> {
        Ok(self.read()?.transfers.clone())
    }

    async fn save_schedule_run(&self, run: &ScheduleRun) -> LedgerResult<()> {
        self.write()?.schedule_runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn get_schedule_run(&self, run_id: Uuid) -> LedgerResult<Option<ScheduleRun>> {
        Ok(self.read()?.schedule_runs.get(&run_id).cloned())
    }

    async fn list_schedule_runs(&self) -> LedgerResult<Vec<ScheduleRun>> {
        let mut runs: Vec<ScheduleRun> = self.read()?.schedule_runs.values().cloned().collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }
}

/// In-memory job store keeping the most recent log lines per job
#[derive(Debug, Clone)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<HashMap<Uuid, ReconciliationJob>>>,
    logs: Arc<RwLock<HashMap<Uuid, VecDeque<JobLogEntry>>>>,
    log_capacity: usize,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::with_log_capacity(500)
    }

    pub fn with_log_capacity(log_capacity: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            logs: Arc::new(RwLock::new(HashMap::new())),
            log_capacity,
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::Storage("job store lock poisoned".to_string())
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put_job(&self, job: &ReconciliationJob) -> LedgerResult<()> {
        self.jobs.write().map_err(poisoned)?.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> LedgerResult<Option<ReconciliationJob>> {
        Ok(self.jobs.read().map_err(poisoned)?.get(&job_id).cloned())
    }

    async fn list_jobs(&self) -> LedgerResult<Vec<ReconciliationJob>> {
        let mut jobs: Vec<ReconciliationJob> =
            self.jobs.read().map_err(poisoned)?.values().cloned().collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(jobs)
    }

    async fn append_log(&self, job_id: Uuid, entry: JobLogEntry) -> LedgerResult<()> {
        let mut logs = self.logs.write().map_err(poisoned)?;
        let lines = logs.entry(job_id).or_default();
        lines.push_back(entry);
        while lines.len() > self.log_capacity {
            lines.pop_front();
        }
        Ok(())
    }

    async fn job_logs(&self, job_id: Uuid) -> LedgerResult<Vec<JobLogEntry>> {
        Ok(self
            .logs
            .read()
            .map_err(poisoned)?
            .get(&job_id)
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn reconciled(id: &str) -> Transaction {
        Transaction::new(
            id.to_string(),
            "M1".to_string(),
            10_000,
            "UPI".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .with_status(TransactionStatus::Reconciled)
    }

    #[tokio::test]
    async fn test_claim_only_pending_rows() {
        let storage = MemoryStorage::new();
        let entry = SettlementQueueEntry::pending(&reconciled("T1"), now());
        storage.enqueue_settlement(&entry).await.unwrap();

        let first = storage.claim_queue_entries(&[entry.id], now()).await.unwrap();
        let second = storage.claim_queue_entries(&[entry.id], now()).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].status, QueueStatus::Processing);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_fail_and_requeue() {
        let storage = MemoryStorage::new();
        let entry = SettlementQueueEntry::pending(&reconciled("T1"), now());
        storage.enqueue_settlement(&entry).await.unwrap();

        storage
            .fail_queue_entries(&[entry.id], "boom", true, now())
            .await
            .unwrap();
        let failed = storage
            .list_queue_entries(Some(QueueStatus::Failed))
            .await
            .unwrap();
        assert_eq!(failed[0].retry_count, 1);
        assert_eq!(failed[0].error_message.as_deref(), Some("boom"));

        assert_eq!(storage.requeue_failed(now()).await.unwrap(), 1);
        assert_eq!(
            storage
                .list_queue_entries(Some(QueueStatus::Pending))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_transfer_enqueue_is_idempotent() {
        let storage = MemoryStorage::new();
        let batch_id = Uuid::new_v4();
        let item = BankTransferQueueItem {
            id: Uuid::new_v4(),
            batch_id,
            merchant_id: "M1".to_string(),
            transfer_mode: TransferMode::Neft,
            amount_paise: 1_000,
            beneficiary: BeneficiaryAccount {
                account_holder_name: "Acme".to_string(),
                account_number: "001".to_string(),
                ifsc_code: "UTIB0000001".to_string(),
                bank_name: "Axis".to_string(),
            },
            status: TransferStatus::Queued,
            created_at: now(),
        };

        let first = storage.enqueue_transfer(&item).await.unwrap();
        let second = storage
            .enqueue_transfer(&BankTransferQueueItem {
                id: Uuid::new_v4(),
                ..item.clone()
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(storage.list_transfers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_reconciliation_queues_once() {
        let storage = MemoryStorage::new();
        let pg = Transaction::new(
            "T1".to_string(),
            "M1".to_string(),
            10_000,
            "UPI".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .with_utr("U1");
        storage.save_transaction(&pg).await.unwrap();

        let results = vec![MatchResult::Matched {
            pg: pg.clone(),
            bank: BankRecord::new("U1", 10_000),
            confidence: 100,
        }];
        let job_id = Uuid::new_v4();

        assert_eq!(storage.persist_reconciliation(job_id, &results, now()).await.unwrap(), 1);
        assert_eq!(storage.persist_reconciliation(job_id, &results, now()).await.unwrap(), 0);

        let stored = storage.get_transaction("T1").await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Reconciled);
        assert_eq!(storage.list_reconciliation_results(job_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_job_log_capacity() {
        let store = MemoryJobStore::with_log_capacity(3);
        let job_id = Uuid::new_v4();
        for i in 0..5 {
            store
                .append_log(
                    job_id,
                    JobLogEntry {
                        timestamp: now(),
                        level: LogLevel::Info,
                        stage: JobStage::Matching,
                        message: format!("line {}", i),
                        fields: serde_json::Value::Null,
                    },
                )
                .await
                .unwrap();
        }

        let logs = store.job_logs(job_id).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "line 2");
    }
}
