//! Engine facade that wires ingestion, reconciliation and settlement together

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::config::EngineConfig;
use crate::pipeline::PipelineCounts;
use crate::reconciliation::{
    BankSchemaMapping, JobOutcome, JobParams, PgSchemaMapping, RawRow, ReconciliationJobRunner,
    SkippedRow,
};
use crate::settlement::{BatchOutcome, QueueProcessor, RunOptions, SettlementScheduler};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::EnhancedTransactionValidator;

/// Main settlement system over one storage backend and job store
pub struct SettlementEngine<S: LedgerStorage, J: JobStore> {
    storage: S,
    validator: Box<dyn TransactionValidator>,
    reconciler: ReconciliationJobRunner<S, J>,
    queue: QueueProcessor<S>,
    scheduler: SettlementScheduler<S>,
}

impl<S: LedgerStorage + Clone, J: JobStore> SettlementEngine<S, J> {
    pub fn new(storage: S, jobs: J) -> Self {
        Self::with_config(storage, jobs, &EngineConfig::default())
    }

    pub fn with_config(storage: S, jobs: J, config: &EngineConfig) -> Self {
        Self {
            validator: Box::new(EnhancedTransactionValidator::default()),
            reconciler: ReconciliationJobRunner::with_config(
                storage.clone(),
                jobs,
                config.recon.clone(),
            ),
            queue: QueueProcessor::with_config(storage.clone(), config),
            scheduler: SettlementScheduler::with_config(storage.clone(), config),
            storage,
        }
    }

    /// Replace the validator used at ingestion
    pub fn with_validator(mut self, validator: Box<dyn TransactionValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn reconciler(&self) -> &ReconciliationJobRunner<S, J> {
        &self.reconciler
    }

    pub fn queue(&self) -> &QueueProcessor<S> {
        &self.queue
    }

    pub fn scheduler(&self) -> &SettlementScheduler<S> {
        &self.scheduler
    }

    // Ingestion
    /// Validate and store captured PG transactions
    pub async fn ingest_transactions(&self, transactions: &[Transaction]) -> LedgerResult<()> {
        for transaction in transactions {
            self.validator.validate_transaction(transaction)?;
        }
        for transaction in transactions {
            self.storage.save_transaction(transaction).await?;
        }
        info!(count = transactions.len(), "PG transactions ingested");
        Ok(())
    }

    /// Map raw PG export rows and store the valid ones
    pub async fn ingest_pg_rows(
        &self,
        mapping: &PgSchemaMapping,
        rows: &[RawRow],
    ) -> LedgerResult<Vec<SkippedRow>> {
        let (transactions, skipped) = mapping.map_rows(rows);
        self.ingest_transactions(&transactions).await?;
        Ok(skipped)
    }

    /// Map a raw bank statement and store it against `cycle_date`
    pub async fn ingest_bank_statement(
        &self,
        cycle_date: NaiveDate,
        mapping: &BankSchemaMapping,
        rows: &[RawRow],
    ) -> LedgerResult<usize> {
        let records = mapping.map_rows(rows);
        self.storage.save_bank_records(cycle_date, &records).await?;
        info!(%cycle_date, count = records.len(), "Bank statement ingested");
        Ok(records.len())
    }

    // Reconciliation and settlement
    pub async fn reconcile(&self, today: NaiveDate, params: JobParams) -> LedgerResult<JobOutcome> {
        self.reconciler.run_on(today, params).await
    }

    pub async fn process_queue(&self, now: NaiveDateTime) -> LedgerResult<Vec<BatchOutcome>> {
        self.queue.process_pending_batches(now).await
    }

    pub async fn run_settlement(
        &self,
        today: NaiveDate,
        trigger: TriggerType,
        triggered_by: &str,
        options: &RunOptions,
    ) -> LedgerResult<ScheduleRun> {
        self.scheduler
            .run_settlement_on(today, trigger, triggered_by, options)
            .await
    }

    // Reporting
    pub async fn pipeline_counts(&self, from: NaiveDate, to: NaiveDate) -> LedgerResult<PipelineCounts> {
        PipelineCounts::for_window(&self.storage, from, to).await
    }

    pub async fn list_batches(&self, merchant_id: Option<&str>) -> LedgerResult<Vec<SettlementBatch>> {
        self.storage.list_batches(merchant_id).await
    }

    pub async fn list_reserve_entries(&self, merchant_id: &str) -> LedgerResult<Vec<RollingReserveEntry>> {
        self.storage.list_reserve_entries(merchant_id).await
    }

    pub async fn list_transfers(&self) -> LedgerResult<Vec<BankTransferQueueItem>> {
        self.storage.list_transfers().await
    }

    pub async fn list_schedule_runs(&self) -> LedgerResult<Vec<ScheduleRun>> {
        self.storage.list_schedule_runs().await
    }
}
