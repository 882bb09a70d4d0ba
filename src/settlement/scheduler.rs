//! Frequency-driven settlement runs
//!
//! A run picks the merchants due today, settles each one's reconciled,
//! unbatched transactions in one batch per transaction date and records
//! everything it did on a [`ScheduleRun`]. Errors for one merchant or date
//! are recorded and never stop the rest of the run.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::settlement::calculator::{PersistOptions, SettlementCalculator};
use crate::settlement::transfer::PayoutPolicy;
use crate::tax::rounding::format_paise;
use crate::traits::{LedgerStorage, TransactionFilter};
use crate::types::*;

/// Hour of day (UTC) the daily cron run fires
pub const DEFAULT_RUN_HOUR: u32 = 23;

/// Narrows a run to one merchant and/or a transaction date window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Settle only this merchant, ignoring its frequency
    pub merchant_id: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Whether a profile's frequency makes it due on `today`
pub fn is_due(profile: &MerchantSettlementProfile, today: NaiveDate) -> bool {
    match profile.frequency {
        SettlementFrequency::Daily => true,
        SettlementFrequency::Weekly => profile.settlement_day == Some(today.weekday().number_from_monday()),
        SettlementFrequency::Monthly => profile.settlement_day == Some(today.day()),
        SettlementFrequency::OnDemand => !profile.auto_settle,
    }
}

/// Group transactions by transaction date, earliest first
pub fn group_by_date(transactions: Vec<Transaction>) -> BTreeMap<NaiveDate, Vec<Transaction>> {
    let mut groups: BTreeMap<NaiveDate, Vec<Transaction>> = BTreeMap::new();
    for transaction in transactions {
        groups
            .entry(transaction.transaction_date)
            .or_default()
            .push(transaction);
    }
    groups
}

/// Next time strictly after `now` at `hour:00:00`
pub fn next_run_after(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let today_at = now
        .date()
        .and_hms_opt(hour.min(23), 0, 0)
        .unwrap_or(now);
    if today_at > now {
        today_at
    } else {
        today_at + chrono::Duration::days(1)
    }
}

/// Creates settlement batches on a schedule
pub struct SettlementScheduler<S: LedgerStorage> {
    storage: S,
    calculator: SettlementCalculator<S>,
    policy: PayoutPolicy,
}

impl<S: LedgerStorage + Clone> SettlementScheduler<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, &EngineConfig::default())
    }

    pub fn with_config(storage: S, config: &EngineConfig) -> Self {
        Self {
            calculator: SettlementCalculator::with_config(storage.clone(), config),
            storage,
            policy: PayoutPolicy::from_config(config),
        }
    }

    /// Run a settlement for today
    pub async fn run_settlement(
        &self,
        trigger: TriggerType,
        triggered_by: &str,
        options: &RunOptions,
    ) -> LedgerResult<ScheduleRun> {
        self.run_settlement_on(Utc::now().date_naive(), trigger, triggered_by, options)
            .await
    }

    /// Run a settlement as of `today`.
    ///
    /// Only a failure to select merchants or to save the run record is
    /// returned as `Err`; the run is then saved as `failed` when possible.
    pub async fn run_settlement_on(
        &self,
        today: NaiveDate,
        trigger: TriggerType,
        triggered_by: &str,
        options: &RunOptions,
    ) -> LedgerResult<ScheduleRun> {
        let started = Utc::now().naive_utc();
        let mut run = ScheduleRun {
            id: Uuid::new_v4(),
            run_date: today,
            trigger_type: trigger,
            triggered_by: triggered_by.to_string(),
            status: RunStatus::Running,
            merchants_processed: 0,
            batches_created: 0,
            total_amount_settled_paise: 0,
            errors_count: 0,
            error_details: Vec::new(),
            started_at: started,
            completed_at: None,
            duration_seconds: None,
        };
        self.storage.save_schedule_run(&run).await?;
        info!(run_id = %run.id, ?trigger, triggered_by, %today, "Settlement run started");

        let merchants = match self.select_merchants(today, options).await {
            Ok(merchants) => merchants,
            Err(err) => {
                error!(run_id = %run.id, error = %err, "Settlement run failed selecting merchants");
                run.error_details.push(RunError {
                    merchant_id: options.merchant_id.clone().unwrap_or_default(),
                    cycle_date: None,
                    detail: ErrorDetail::from(&err),
                });
                self.complete(&mut run, Some(RunStatus::Failed)).await?;
                return Err(err);
            }
        };
        info!(run_id = %run.id, merchants = merchants.len(), "Merchants due for settlement");

        for profile in &merchants {
            match self.settle_merchant(&mut run, profile, options).await {
                Ok(true) => run.merchants_processed += 1,
                Ok(false) => {}
                Err(err) => {
                    error!(
                        run_id = %run.id,
                        merchant_id = %profile.merchant_id,
                        error = %err,
                        "Merchant settlement failed"
                    );
                    run.error_details.push(RunError {
                        merchant_id: profile.merchant_id.clone(),
                        cycle_date: None,
                        detail: ErrorDetail::from(&err),
                    });
                }
            }
        }

        self.complete(&mut run, None).await?;
        Ok(run)
    }

    async fn select_merchants(
        &self,
        today: NaiveDate,
        options: &RunOptions,
    ) -> LedgerResult<Vec<MerchantSettlementProfile>> {
        if let Some(merchant_id) = &options.merchant_id {
            return Ok(self
                .storage
                .get_settlement_profile(merchant_id)
                .await?
                .filter(|p| p.is_active)
                .into_iter()
                .collect());
        }

        Ok(self
            .storage
            .list_settlement_profiles()
            .await?
            .into_iter()
            .filter(|p| p.is_active && is_due(p, today))
            .collect())
    }

    /// Settle one merchant. Returns `false` when it had nothing to settle.
    ///
    /// A missing or inactive merchant record fails the whole merchant, so it
    /// is not counted as processed.
    async fn settle_merchant(
        &self,
        run: &mut ScheduleRun,
        profile: &MerchantSettlementProfile,
        options: &RunOptions,
    ) -> LedgerResult<bool> {
        let filter = TransactionFilter {
            merchant_id: Some(profile.merchant_id.clone()),
            status: Some(TransactionStatus::Reconciled),
            from_date: options.from_date,
            to_date: options.to_date,
            unbatched_only: true,
        };
        let transactions = self.storage.list_transactions(&filter).await?;
        if transactions.is_empty() {
            info!(merchant_id = %profile.merchant_id, "No transactions to settle");
            return Ok(false);
        }
        self.calculator.merchant_config(&profile.merchant_id).await?;

        for (cycle_date, batch_transactions) in group_by_date(transactions) {
            if let Err(err) = self
                .settle_date(run, profile, cycle_date, &batch_transactions)
                .await
            {
                error!(
                    merchant_id = %profile.merchant_id,
                    %cycle_date,
                    error = %err,
                    "Settlement batch failed"
                );
                run.error_details.push(RunError {
                    merchant_id: profile.merchant_id.clone(),
                    cycle_date: Some(cycle_date),
                    detail: ErrorDetail::from(&err),
                });
            }
        }

        Ok(true)
    }

    async fn settle_date(
        &self,
        run: &mut ScheduleRun,
        profile: &MerchantSettlementProfile,
        cycle_date: NaiveDate,
        transactions: &[Transaction],
    ) -> LedgerResult<()> {
        let computation = self
            .calculator
            .calculate_settlement(&profile.merchant_id, transactions, cycle_date)
            .await?;

        for rejected in &computation.rejected {
            run.error_details.push(RunError {
                merchant_id: profile.merchant_id.clone(),
                cycle_date: Some(cycle_date),
                detail: ErrorDetail {
                    message: format!("{}: {}", rejected.transaction_id, rejected.error.message),
                    ..rejected.error.clone()
                },
            });
        }

        let batch = computation.batch;
        if batch.items.is_empty() {
            return Err(LedgerError::Configuration(format!(
                "No transactions could be settled for merchant {} on {}",
                profile.merchant_id, cycle_date
            )));
        }

        let settled: HashSet<&str> = batch.items.iter().map(|i| i.transaction_id.as_str()).collect();
        let processed_queue_ids = self
            .storage
            .list_queue_entries(Some(QueueStatus::Pending))
            .await?
            .into_iter()
            .filter(|e| settled.contains(e.transaction_id.as_str()))
            .map(|e| e.id)
            .collect();

        self.calculator
            .persist_settlement(
                &batch,
                PersistOptions {
                    mark_settled: false,
                    processed_queue_ids,
                },
            )
            .await?;

        run.batches_created += 1;
        run.total_amount_settled_paise += batch.net_settlement_amount_paise;
        if let Err(err) = self.storage.save_schedule_run(run).await {
            warn!(run_id = %run.id, error = %err, "Could not save run progress");
        }

        if let Err(err) = self.policy.route_batch(&self.storage, &batch).await {
            error!(batch_id = %batch.id, error = %err, "Batch approval routing failed");
        }

        if profile.auto_settle && batch.net_settlement_amount_paise >= profile.min_settlement_amount_paise {
            if let Err(err) = self.policy.queue_transfer(&self.storage, &batch, profile).await {
                error!(batch_id = %batch.id, error = %err, "Bank transfer enqueue failed");
            }
        }

        Ok(())
    }

    async fn complete(&self, run: &mut ScheduleRun, status: Option<RunStatus>) -> LedgerResult<()> {
        let finished = Utc::now().naive_utc();
        run.errors_count = run.error_details.len() as u32;
        run.status = status.unwrap_or(if run.error_details.is_empty() {
            RunStatus::Completed
        } else if run.merchants_processed > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Failed
        });
        run.completed_at = Some(finished);
        run.duration_seconds = Some((finished - run.started_at).num_seconds());
        self.storage.save_schedule_run(run).await?;

        info!(
            run_id = %run.id,
            status = ?run.status,
            merchants = run.merchants_processed,
            batches = run.batches_created,
            total_settled = %format_paise(run.total_amount_settled_paise),
            errors = run.errors_count,
            "Settlement run completed"
        );
        Ok(())
    }

    /// Fire a cron-triggered run every day at `hour` until `shutdown` turns true
    pub async fn run_daily(&self, hour: u32, mut shutdown: watch::Receiver<bool>) {
        loop {
            let now = Utc::now().naive_utc();
            let next = next_run_after(now, hour);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Next settlement run scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(err) = self
                        .run_settlement(TriggerType::Cron, "system", &RunOptions::default())
                        .await
                    {
                        error!(error = %err, "Scheduled settlement run failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
