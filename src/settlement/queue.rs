//! Settlement queue processing
//!
//! Reconciled transactions wait in the settlement queue as `PENDING` rows.
//! Rows are grouped by merchant and a group is settled once it is large
//! enough or its oldest row has waited past the batch window. Claiming a
//! group is a single conditional store write, so any number of processors
//! can share one store.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, QueueConfig};
use crate::settlement::calculator::{PersistOptions, SettlementCalculator};
use crate::settlement::transfer::PayoutPolicy;
use crate::traits::LedgerStorage;
use crate::types::*;

/// Message stored on rows whose transactions were no longer settleable
pub const NO_ELIGIBLE_TRANSACTIONS: &str = "No eligible transactions found (status != RECONCILED)";

/// Pending queue rows for one merchant, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantGroup {
    pub merchant_id: String,
    pub entries: Vec<SettlementQueueEntry>,
}

impl MerchantGroup {
    pub fn oldest_queued_at(&self) -> Option<NaiveDateTime> {
        self.entries.iter().map(|e| e.queued_at).min()
    }
}

/// Result of processing one merchant group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Another processor claimed the rows first
    NothingClaimed { merchant_id: String },
    /// Rows were claimed but none of their transactions could be settled
    NoEligibleTransactions { merchant_id: String, rows: usize },
    /// The merchant already has a batch for this cycle date. Rows were left
    /// `PENDING` for the next date.
    Deferred {
        merchant_id: String,
        cycle_date: NaiveDate,
        existing_batch_id: Uuid,
        rows: usize,
    },
    Settled {
        merchant_id: String,
        batch_id: Uuid,
        transactions: usize,
        net_paise: Paise,
        status: Option<BatchStatus>,
        transfer_id: Option<Uuid>,
        /// Rows whose transaction was rejected by the calculator
        rejected_rows: usize,
    },
    /// Nothing was persisted; claimed rows were marked `FAILED`
    Failed {
        merchant_id: String,
        rows: usize,
        error: ErrorDetail,
    },
}

/// Group pending rows by merchant and keep the groups ready to settle
pub fn select_eligible_groups(
    pending: &[SettlementQueueEntry],
    now: NaiveDateTime,
    config: &QueueConfig,
) -> Vec<MerchantGroup> {
    let mut by_merchant: BTreeMap<&str, Vec<SettlementQueueEntry>> = BTreeMap::new();
    for entry in pending.iter().filter(|e| e.status == QueueStatus::Pending) {
        by_merchant
            .entry(entry.merchant_id.as_str())
            .or_default()
            .push(entry.clone());
    }

    let cutoff = now - config.batch_window();
    by_merchant
        .into_iter()
        .filter_map(|(merchant_id, mut entries)| {
            entries.sort_by_key(|e| e.queued_at);
            let group = MerchantGroup {
                merchant_id: merchant_id.to_string(),
                entries,
            };
            let full = group.entries.len() >= config.batch_size;
            let stale = group.oldest_queued_at().is_some_and(|t| t < cutoff);
            (full || stale).then_some(group)
        })
        .collect()
}

struct Committed {
    batch: SettlementBatch,
    rejected_ids: Vec<Uuid>,
    rejected_reason: String,
}

enum Prepared {
    NoEligible,
    Committed(Committed),
}

/// Settles queued transactions in merchant batches
pub struct QueueProcessor<S: LedgerStorage> {
    storage: S,
    calculator: SettlementCalculator<S>,
    policy: PayoutPolicy,
    config: QueueConfig,
    processing: Mutex<()>,
}

impl<S: LedgerStorage + Clone> QueueProcessor<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, &EngineConfig::default())
    }

    pub fn with_config(storage: S, config: &EngineConfig) -> Self {
        Self {
            calculator: SettlementCalculator::with_config(storage.clone(), config),
            storage,
            policy: PayoutPolicy::from_config(config),
            config: config.queue.clone(),
            processing: Mutex::new(()),
        }
    }

    pub fn calculator(&self) -> &SettlementCalculator<S> {
        &self.calculator
    }

    /// Canonical merchant id for a queue row's merchant reference
    pub async fn resolve_merchant_id(&self, merchant_ref: &str) -> LedgerResult<String> {
        if Uuid::parse_str(merchant_ref).is_err() {
            return Ok(merchant_ref.to_string());
        }
        match self.storage.resolve_merchant_alias(merchant_ref).await? {
            Some(canonical) => Ok(canonical),
            None => {
                warn!(merchant_ref, "No merchant mapping for UUID, using it as-is");
                Ok(merchant_ref.to_string())
            }
        }
    }

    /// Run one polling cycle. Skipped if a cycle is already running.
    pub async fn process_pending_batches(&self, now: NaiveDateTime) -> LedgerResult<Vec<BatchOutcome>> {
        let Ok(_guard) = self.processing.try_lock() else {
            info!("Settlement queue already processing, skipping cycle");
            return Ok(Vec::new());
        };

        let pending = self
            .storage
            .list_queue_entries(Some(QueueStatus::Pending))
            .await?;
        let groups = select_eligible_groups(&pending, now, &self.config);
        debug!(pending = pending.len(), groups = groups.len(), "Queue scan complete");

        let mut outcomes = Vec::with_capacity(groups.len());
        for group in &groups {
            outcomes.push(self.process_group(group, now).await?);
        }
        Ok(outcomes)
    }

    /// Claim and settle one merchant group.
    ///
    /// The cycle date is `now`'s date. A merchant that already has a batch
    /// for it is not claimed; its rows stay `PENDING` and settle on the next
    /// date ([`BatchOutcome::Deferred`]).
    ///
    /// Errors before the batch commit mark every claimed row `FAILED` with
    /// `retry_count + 1` and are reported as [`BatchOutcome::Failed`]. Only a
    /// failure to record that outcome is returned as `Err`.
    pub async fn process_group(&self, group: &MerchantGroup, now: NaiveDateTime) -> LedgerResult<BatchOutcome> {
        let cycle_date = now.date();
        let merchant_id = self.resolve_merchant_id(&group.merchant_id).await?;
        if let Some(existing) = self.storage.find_batch(&merchant_id, cycle_date).await? {
            warn!(
                merchant_id = %merchant_id,
                %cycle_date,
                batch_id = %existing.id,
                rows = group.entries.len(),
                "Merchant already settled for this cycle date, leaving rows pending"
            );
            return Ok(BatchOutcome::Deferred {
                merchant_id,
                cycle_date,
                existing_batch_id: existing.id,
                rows: group.entries.len(),
            });
        }

        let ids: Vec<Uuid> = group.entries.iter().map(|e| e.id).collect();
        let claimed = self.storage.claim_queue_entries(&ids, now).await?;

        if claimed.is_empty() {
            debug!(merchant_id = %group.merchant_id, "Queue rows already claimed elsewhere");
            return Ok(BatchOutcome::NothingClaimed {
                merchant_id: group.merchant_id.clone(),
            });
        }

        info!(
            merchant_id = %group.merchant_id,
            claimed = claimed.len(),
            "Processing settlement group"
        );

        let claimed_ids: Vec<Uuid> = claimed.iter().map(|e| e.id).collect();
        let committed = match self.prepare_and_commit(&merchant_id, &claimed, cycle_date).await {
            Ok(Prepared::Committed(committed)) => committed,
            Ok(Prepared::NoEligible) => {
                self.storage
                    .fail_queue_entries(&claimed_ids, NO_ELIGIBLE_TRANSACTIONS, false, now)
                    .await?;
                warn!(merchant_id = %group.merchant_id, rows = claimed.len(), "{}", NO_ELIGIBLE_TRANSACTIONS);
                return Ok(BatchOutcome::NoEligibleTransactions {
                    merchant_id: group.merchant_id.clone(),
                    rows: claimed.len(),
                });
            }
            Err(err) => {
                error!(
                    merchant_id = %group.merchant_id,
                    rows = claimed.len(),
                    error = %err,
                    "Settlement group failed, nothing persisted"
                );
                self.storage
                    .fail_queue_entries(&claimed_ids, &err.to_string(), true, now)
                    .await?;
                return Ok(BatchOutcome::Failed {
                    merchant_id: group.merchant_id.clone(),
                    rows: claimed.len(),
                    error: ErrorDetail::from(&err),
                });
            }
        };

        let batch = &committed.batch;
        if !committed.rejected_ids.is_empty() {
            if let Err(err) = self
                .storage
                .fail_queue_entries(&committed.rejected_ids, &committed.rejected_reason, true, now)
                .await
            {
                error!(batch_id = %batch.id, error = %err, "Could not mark rejected queue rows");
            }
        }

        let (status, transfer_id) = self.finalize(batch).await;

        Ok(BatchOutcome::Settled {
            merchant_id: batch.merchant_id.clone(),
            batch_id: batch.id,
            transactions: batch.transaction_count,
            net_paise: batch.net_settlement_amount_paise,
            status,
            transfer_id,
            rejected_rows: committed.rejected_ids.len(),
        })
    }

    async fn prepare_and_commit(
        &self,
        merchant_id: &str,
        claimed: &[SettlementQueueEntry],
        cycle_date: NaiveDate,
    ) -> LedgerResult<Prepared> {
        let transaction_ids: Vec<String> = claimed.iter().map(|e| e.transaction_id.clone()).collect();
        let eligible: Vec<Transaction> = self
            .storage
            .get_transactions_by_ids(&transaction_ids)
            .await?
            .into_iter()
            .filter(|t| t.status == TransactionStatus::Reconciled && !t.is_batched())
            .collect();

        if eligible.is_empty() {
            return Ok(Prepared::NoEligible);
        }

        let computation = self
            .calculator
            .calculate_settlement(merchant_id, &eligible, cycle_date)
            .await?;

        if computation.batch.items.is_empty() {
            let reasons: Vec<String> = computation
                .rejected
                .iter()
                .map(|r| format!("{}: {}", r.transaction_id, r.error.message))
                .collect();
            return Err(LedgerError::Configuration(format!(
                "All transactions rejected for merchant {}: {}",
                merchant_id,
                reasons.join("; ")
            )));
        }

        let rejected: HashSet<&str> = computation
            .rejected
            .iter()
            .map(|r| r.transaction_id.as_str())
            .collect();
        let (rejected_rows, processed_rows): (Vec<&SettlementQueueEntry>, Vec<&SettlementQueueEntry>) =
            claimed
                .iter()
                .partition(|e| rejected.contains(e.transaction_id.as_str()));

        let options = PersistOptions {
            mark_settled: true,
            processed_queue_ids: processed_rows.iter().map(|e| e.id).collect(),
        };
        self.calculator
            .persist_settlement(&computation.batch, options)
            .await?;

        let rejected_reason = computation
            .rejected
            .iter()
            .map(|r| r.error.message.clone())
            .collect::<Vec<_>>()
            .join("; ");

        Ok(Prepared::Committed(Committed {
            batch: computation.batch,
            rejected_ids: rejected_rows.iter().map(|e| e.id).collect(),
            rejected_reason,
        }))
    }

    /// Post-commit routing. Failures here are logged; the batch stands.
    async fn finalize(&self, batch: &SettlementBatch) -> (Option<BatchStatus>, Option<Uuid>) {
        let status = match self.policy.route_batch(&self.storage, batch).await {
            Ok(status) => status,
            Err(err) => {
                error!(batch_id = %batch.id, error = %err, "Batch approval routing failed");
                return (None, None);
            }
        };

        if status != BatchStatus::Approved {
            return (Some(status), None);
        }

        let profile = match self.storage.get_settlement_profile(&batch.merchant_id).await {
            Ok(Some(profile)) if profile.beneficiary.is_some() => profile,
            Ok(_) => return (Some(status), None),
            Err(err) => {
                error!(batch_id = %batch.id, error = %err, "Could not load settlement profile");
                return (Some(status), None);
            }
        };

        match self.policy.queue_transfer(&self.storage, batch, &profile).await {
            Ok(item) => (Some(status), item.map(|t| t.id)),
            Err(err) => {
                error!(batch_id = %batch.id, error = %err, "Bank transfer enqueue failed");
                (Some(status), None)
            }
        }
    }

    /// Poll the queue until `shutdown` turns true or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_secs = self.config.poll_interval_secs,
            batch_size = self.config.batch_size,
            "Settlement queue processor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.process_pending_batches(Utc::now().naive_utc()).await {
                        Ok(outcomes) if !outcomes.is_empty() => {
                            info!(groups = outcomes.len(), "Settlement queue cycle complete");
                        }
                        Ok(_) => {}
                        Err(err) => error!(error = %err, "Settlement queue cycle failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Settlement queue processor stopped");
    }
}
