//! Reconciliation jobs
//!
//! Wraps the matcher with fetch, validation and persistence for one cycle
//! date. Every stage writes a structured log line to the [`JobStore`].

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ReconConfig;
use crate::reconciliation::matcher::{match_records, MatchSummary};
use crate::traits::{JobStore, LedgerStorage, TransactionFilter};
use crate::types::*;

/// Parameters for one reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParams {
    pub cycle_date: NaiveDate,
    /// Match without persisting anything
    pub dry_run: bool,
}

/// Finished job with its match summary
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: ReconciliationJob,
    pub summary: MatchSummary,
    /// Transactions queued for settlement, zero on a dry run
    pub queued: usize,
}

pub struct ReconciliationJobRunner<S: LedgerStorage, J: JobStore> {
    storage: S,
    jobs: J,
    config: ReconConfig,
}

impl<S: LedgerStorage, J: JobStore> ReconciliationJobRunner<S, J> {
    pub fn new(storage: S, jobs: J) -> Self {
        Self::with_config(storage, jobs, ReconConfig::default())
    }

    pub fn with_config(storage: S, jobs: J, config: ReconConfig) -> Self {
        Self {
            storage,
            jobs,
            config,
        }
    }

    pub fn jobs(&self) -> &J {
        &self.jobs
    }

    /// Run a job for `params.cycle_date` as of the current date
    pub async fn run(&self, params: JobParams) -> LedgerResult<JobOutcome> {
        self.run_on(Utc::now().date_naive(), params).await
    }

    /// Run a job as of `today`.
    ///
    /// On failure the job is stored as `failed` with the error detail and
    /// nothing is persisted.
    pub async fn run_on(&self, today: NaiveDate, params: JobParams) -> LedgerResult<JobOutcome> {
        let mut job = ReconciliationJob {
            id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            cycle_date: params.cycle_date,
            dry_run: params.dry_run,
            status: JobStatus::Running,
            stage: JobStage::Validation,
            counters: JobCounters::default(),
            error: None,
            started_at: Utc::now().naive_utc(),
            finished_at: None,
        };
        self.jobs.put_job(&job).await?;
        info!(
            job_id = %job.id,
            correlation_id = %job.correlation_id,
            cycle_date = %params.cycle_date,
            dry_run = params.dry_run,
            "Reconciliation job started"
        );

        match self.execute(&mut job, today).await {
            Ok((summary, queued)) => {
                job.stage = JobStage::Done;
                job.status = JobStatus::Completed;
                job.finished_at = Some(Utc::now().naive_utc());
                self.log(
                    &job,
                    LogLevel::Info,
                    "Reconciliation completed",
                    json!({ "counters": job.counters, "queued": queued }),
                )
                .await?;
                self.jobs.put_job(&job).await?;
                info!(
                    job_id = %job.id,
                    matched = job.counters.matched,
                    match_rate = summary.stats.match_rate,
                    queued,
                    "Reconciliation job completed"
                );
                Ok(JobOutcome {
                    job,
                    summary,
                    queued,
                })
            }
            Err(err) => {
                let detail = ErrorDetail::from(&err);
                error!(
                    job_id = %job.id,
                    stage = ?job.stage,
                    code = %detail.code,
                    error = %err,
                    "Reconciliation job failed"
                );
                job.status = JobStatus::Failed;
                job.finished_at = Some(Utc::now().naive_utc());
                job.error = Some(detail.clone());
                self.log(&job, LogLevel::Error, &detail.message, json!({ "error": detail }))
                    .await?;
                self.jobs.put_job(&job).await?;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        job: &mut ReconciliationJob,
        today: NaiveDate,
    ) -> LedgerResult<(MatchSummary, usize)> {
        let cycle_date = job.cycle_date;
        if cycle_date > today {
            return Err(LedgerError::Validation(format!(
                "Cannot reconcile future date {}",
                cycle_date
            )));
        }
        let age = (today - cycle_date).num_days();
        if age > self.config.max_lookback_days {
            return Err(LedgerError::Validation(format!(
                "Cycle date {} is more than {} days back",
                cycle_date, self.config.max_lookback_days
            )));
        }
        self.log(job, LogLevel::Info, "Cycle date accepted", json!({ "age_days": age }))
            .await?;

        self.advance(job, JobStage::FetchPg).await?;
        let pg = self
            .storage
            .list_transactions(&TransactionFilter {
                status: Some(TransactionStatus::Captured),
                from_date: Some(cycle_date),
                to_date: Some(cycle_date),
                ..TransactionFilter::default()
            })
            .await?;
        job.counters.pg_fetched = pg.len();
        self.log(job, LogLevel::Info, "Fetched PG transactions", json!({ "count": pg.len() }))
            .await?;

        self.advance(job, JobStage::FetchBank).await?;
        let bank = self.storage.list_bank_records(cycle_date).await?;
        job.counters.bank_fetched = bank.len();
        self.log(job, LogLevel::Info, "Fetched bank records", json!({ "count": bank.len() }))
            .await?;

        if pg.is_empty() && bank.is_empty() {
            return Err(LedgerError::EmptyDataset(format!(
                "No PG transactions or bank records for {}",
                cycle_date
            )));
        }

        self.advance(job, JobStage::Normalize).await?;
        let pg_missing = pg.iter().filter(|t| t.normalized_utr().is_none()).count();
        let bank_missing = bank.iter().filter(|b| b.normalized_utr().is_none()).count();
        job.counters.normalized = pg.len() + bank.len() - pg_missing - bank_missing;
        let level = if pg_missing + bank_missing > 0 {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        self.log(
            job,
            level,
            "Normalized references",
            json!({ "pg_without_utr": pg_missing, "bank_without_utr": bank_missing }),
        )
        .await?;

        self.advance(job, JobStage::Matching).await?;
        let summary = match_records(&pg, &bank);
        job.counters.matched = summary.stats.matched;
        job.counters.unmatched_pg = summary.stats.unmatched_pg;
        job.counters.unmatched_bank = summary.stats.unmatched_bank;
        job.counters.exceptions = summary.stats.exceptions;
        self.log(job, LogLevel::Info, "Matching finished", json!({ "stats": summary.stats }))
            .await?;

        if job.dry_run {
            self.log(job, LogLevel::Info, "Dry run, skipping persistence", json!({}))
                .await?;
            return Ok((summary, 0));
        }

        self.advance(job, JobStage::Persist).await?;
        let queued = self
            .storage
            .persist_reconciliation(job.id, &summary.results, Utc::now().naive_utc())
            .await?;
        self.log(
            job,
            LogLevel::Info,
            "Results persisted",
            json!({ "results": summary.results.len(), "queued": queued }),
        )
        .await?;

        Ok((summary, queued))
    }

    async fn advance(&self, job: &mut ReconciliationJob, stage: JobStage) -> LedgerResult<()> {
        job.stage = stage;
        self.jobs.put_job(job).await
    }

    async fn log(
        &self,
        job: &ReconciliationJob,
        level: LogLevel,
        message: &str,
        mut fields: serde_json::Value,
    ) -> LedgerResult<()> {
        if let Some(map) = fields.as_object_mut() {
            map.insert("correlation_id".to_string(), json!(job.correlation_id));
        }
        self.jobs
            .append_log(
                job.id,
                JobLogEntry {
                    timestamp: Utc::now().naive_utc(),
                    level,
                    stage: job.stage,
                    message: message.to_string(),
                    fields,
                },
            )
            .await
    }
}
