//! Settlement pipeline counts for reporting

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::traits::{LedgerStorage, TransactionFilter};
use crate::types::*;

/// Number of transactions and their total amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub count: usize,
    pub amount_paise: Paise,
}

impl Bucket {
    fn add(&mut self, amount: Paise) {
        self.count += 1;
        self.amount_paise += amount;
    }
}

/// Where captured transactions currently sit in the settlement pipeline.
///
/// Buckets nest: every batched transaction is `in_settlement`, those whose
/// batch went to the bank are also `sent_to_bank`, and `credited` is a
/// subset of that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCounts {
    pub captured: Bucket,
    pub in_settlement: Bucket,
    pub unsettled: Bucket,
    pub sent_to_bank: Bucket,
    pub credited: Bucket,
}

impl PipelineCounts {
    pub fn compute(transactions: &[Transaction], batches: &[SettlementBatch]) -> Self {
        let batch_status: HashMap<Uuid, BatchStatus> =
            batches.iter().map(|b| (b.id, b.status)).collect();

        let mut counts = Self::default();
        for transaction in transactions {
            let amount = transaction.amount_paise;
            counts.captured.add(amount);

            let Some(batch_id) = transaction.settlement_batch_id else {
                counts.unsettled.add(amount);
                continue;
            };
            counts.in_settlement.add(amount);

            match batch_status.get(&batch_id) {
                Some(BatchStatus::SentToBank) => counts.sent_to_bank.add(amount),
                Some(BatchStatus::Credited) => {
                    counts.sent_to_bank.add(amount);
                    counts.credited.add(amount);
                }
                _ => {}
            }
        }
        counts
    }

    /// Check `captured == in_settlement + unsettled` and
    /// `credited <= sent_to_bank <= in_settlement`
    pub fn validate(&self) -> LedgerResult<()> {
        if self.captured.count != self.in_settlement.count + self.unsettled.count
            || self.captured.amount_paise
                != self.in_settlement.amount_paise + self.unsettled.amount_paise
        {
            return Err(LedgerError::InvariantViolation(format!(
                "captured ({}) != in settlement ({}) + unsettled ({})",
                self.captured.count, self.in_settlement.count, self.unsettled.count
            )));
        }
        if self.credited.count > self.sent_to_bank.count
            || self.sent_to_bank.count > self.in_settlement.count
        {
            return Err(LedgerError::InvariantViolation(format!(
                "credited ({}) / sent to bank ({}) / in settlement ({}) out of order",
                self.credited.count, self.sent_to_bank.count, self.in_settlement.count
            )));
        }
        Ok(())
    }

    /// Counts for transactions dated within `from..=to`
    pub async fn for_window<S: LedgerStorage>(
        storage: &S,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Self> {
        let transactions = storage
            .list_transactions(&TransactionFilter {
                from_date: Some(from),
                to_date: Some(to),
                ..TransactionFilter::default()
            })
            .await?;
        let batches = storage.list_batches(None).await?;

        let counts = Self::compute(&transactions, &batches);
        counts.validate()?;
        Ok(counts)
    }
}
