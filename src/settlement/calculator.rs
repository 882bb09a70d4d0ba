//! Per-transaction settlement breakdown and batch persistence

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::settlement::commission::{calculate_commission_amount, CommissionResolver};
use crate::tax::gst::{CommissionGst, GstRate};
use crate::tax::rounding::percent_of;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_merchant_config;

/// A transaction left out of a batch, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedTransaction {
    pub transaction_id: String,
    pub error: ErrorDetail,
}

/// A calculated batch plus any transactions that could not be included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementComputation {
    pub batch: SettlementBatch,
    pub rejected: Vec<RejectedTransaction>,
}

/// How a batch's transactions and queue rows are finalized on persist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistOptions {
    /// Move transactions to `SETTLED`
    pub mark_settled: bool,
    /// Queue rows to mark `PROCESSED` with the batch
    pub processed_queue_ids: Vec<Uuid>,
}

/// Settlement calculator for commission, GST and rolling reserve
pub struct SettlementCalculator<S: LedgerStorage> {
    storage: S,
    resolver: CommissionResolver<S>,
    validator: Box<dyn TransactionValidator>,
}

impl<S: LedgerStorage + Clone> SettlementCalculator<S> {
    /// Create a calculator with the default commission and validator
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, &EngineConfig::default())
    }

    pub fn with_config(storage: S, config: &EngineConfig) -> Self {
        Self {
            resolver: CommissionResolver::with_default(
                storage.clone(),
                config.default_commission.clone(),
            ),
            storage,
            validator: Box::new(DefaultTransactionValidator),
        }
    }

    /// Replace the transaction validator
    pub fn with_validator(mut self, validator: Box<dyn TransactionValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn resolver(&self) -> &CommissionResolver<S> {
        &self.resolver
    }

    /// Active merchant master record. Missing or deactivated merchants are
    /// [`LedgerError::MerchantNotFound`].
    pub async fn merchant_config(&self, merchant_id: &str) -> LedgerResult<MerchantConfig> {
        let merchant = self
            .storage
            .get_merchant(merchant_id)
            .await?
            .ok_or_else(|| LedgerError::MerchantNotFound(merchant_id.to_string()))?;
        if !merchant.is_active {
            return Err(LedgerError::MerchantNotFound(format!("{} (inactive)", merchant_id)));
        }
        validate_merchant_config(&merchant)?;
        Ok(merchant)
    }

    /// Settlement breakdown for a single transaction
    pub async fn calculate_item(
        &self,
        merchant: &MerchantConfig,
        transaction: &Transaction,
    ) -> LedgerResult<SettlementItem> {
        self.validator.validate_transaction(transaction)?;

        let commission = self
            .resolver
            .resolve(
                &merchant.merchant_id,
                &transaction.payment_mode,
                transaction.bank_code.as_deref(),
            )
            .await?;

        let amount = transaction.amount_paise;
        let commission_paise =
            calculate_commission_amount(amount, &commission.value, &commission.commission_type)?;
        let gst = CommissionGst::calculate(
            commission_paise,
            GstRate::new(commission.gst_percentage.clone(), merchant.gst_supply),
        )?;
        let gst_paise = gst.total_gst_paise;

        let fee_bearer = self
            .resolver
            .fee_bearer(&merchant.merchant_id, &transaction.payment_mode_id)
            .await?;
        let before_reserve = fee_bearer.settlement_before_reserve(amount, commission_paise, gst_paise);

        let reserve_paise = if merchant.rolling_reserve_enabled && before_reserve > 0 {
            percent_of(before_reserve, &merchant.rolling_reserve_percentage)?
        } else {
            0
        };

        Ok(SettlementItem {
            transaction_id: transaction.id.clone(),
            amount_paise: amount,
            commission_paise,
            commission_rate: commission.value,
            commission_type: commission.commission_type,
            gst_paise,
            cgst_paise: gst.cgst_paise,
            sgst_paise: gst.sgst_paise,
            igst_paise: gst.igst_paise,
            reserve_paise,
            net_paise: before_reserve - reserve_paise,
            payment_mode: transaction.payment_mode.clone(),
            fee_bearer_code: fee_bearer.code().to_string(),
        })
    }

    /// Calculate a batch for a merchant and cycle date.
    ///
    /// Transactions that fail validation or commission calculation are left
    /// out and reported in `rejected`. Totals are summed from items only.
    pub async fn calculate_settlement(
        &self,
        merchant_id: &str,
        transactions: &[Transaction],
        cycle_date: NaiveDate,
    ) -> LedgerResult<SettlementComputation> {
        let merchant = self.merchant_config(merchant_id).await?;

        let mut items = Vec::with_capacity(transactions.len());
        let mut rejected = Vec::new();

        for transaction in transactions {
            match self.calculate_item(&merchant, transaction).await {
                Ok(item) => items.push(item),
                Err(LedgerError::Storage(message)) => return Err(LedgerError::Storage(message)),
                Err(err) => {
                    warn!(
                        merchant_id,
                        transaction_id = %transaction.id,
                        error = %err,
                        "Transaction excluded from settlement"
                    );
                    rejected.push(RejectedTransaction {
                        transaction_id: transaction.id.clone(),
                        error: ErrorDetail::from(&err),
                    });
                }
            }
        }

        let now = Utc::now().naive_utc();
        let mut batch = SettlementBatch {
            id: Uuid::new_v4(),
            merchant_id: merchant.merchant_id.clone(),
            merchant_name: merchant.merchant_name.clone(),
            cycle_date,
            transaction_count: items.len(),
            gross_amount_paise: 0,
            total_commission_paise: 0,
            total_gst_paise: 0,
            total_reserve_paise: 0,
            net_settlement_amount_paise: 0,
            status: BatchStatus::Calculated,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        for item in &items {
            batch.gross_amount_paise += item.amount_paise;
            batch.total_commission_paise += item.commission_paise;
            batch.total_gst_paise += item.gst_paise;
            batch.total_reserve_paise += item.reserve_paise;
            batch.net_settlement_amount_paise += item.net_paise;
        }
        batch.items = items;

        info!(
            merchant_id,
            %cycle_date,
            transactions = batch.transaction_count,
            rejected = rejected.len(),
            gross = batch.gross_amount_paise,
            net = batch.net_settlement_amount_paise,
            "Settlement calculated"
        );

        Ok(SettlementComputation { batch, rejected })
    }

    /// Persist a calculated batch in one atomic unit.
    ///
    /// Rejects a second batch for the same merchant and cycle date. Returns
    /// the rolling reserve entry when one was held.
    pub async fn persist_settlement(
        &self,
        batch: &SettlementBatch,
        options: PersistOptions,
    ) -> LedgerResult<Option<RollingReserveEntry>> {
        if batch.items.is_empty() {
            return Err(LedgerError::Validation(format!(
                "Batch for merchant {} on {} has no transactions",
                batch.merchant_id, batch.cycle_date
            )));
        }

        if self
            .storage
            .find_batch(&batch.merchant_id, batch.cycle_date)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateBatch {
                merchant_id: batch.merchant_id.clone(),
                cycle_date: batch.cycle_date,
            });
        }

        let reserve_hold = if batch.total_reserve_paise > 0 {
            let merchant = self.merchant_config(&batch.merchant_id).await?;
            let release_date = batch
                .cycle_date
                .checked_add_days(Days::new(u64::from(merchant.reserve_hold_days)))
                .ok_or_else(|| {
                    LedgerError::Configuration(format!(
                        "Reserve release date out of range for merchant {}",
                        merchant.merchant_id
                    ))
                })?;
            Some(ReserveHold {
                hold_date: batch.cycle_date,
                release_date,
                reserve_percentage: merchant.rolling_reserve_percentage,
                hold_days: merchant.reserve_hold_days,
            })
        } else {
            None
        };

        let commit = SettlementCommit {
            batch: batch.clone(),
            mark_settled: options.mark_settled,
            processed_queue_ids: options.processed_queue_ids,
            reserve_hold,
            committed_at: Utc::now().naive_utc(),
        };

        let reserve = self.storage.commit_settlement(&commit).await?;

        info!(
            batch_id = %batch.id,
            merchant_id = %batch.merchant_id,
            cycle_date = %batch.cycle_date,
            net = batch.net_settlement_amount_paise,
            reserve = batch.total_reserve_paise,
            "Settlement batch persisted"
        );

        Ok(reserve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::gst::SupplyType;
    use crate::utils::MemoryStorage;
    use bigdecimal::BigDecimal;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn txn(id: &str, amount: Paise) -> Transaction {
        Transaction::new(id.to_string(), "M1".to_string(), amount, "UPI".to_string(), date())
            .with_utr(format!("UTR{}", id))
            .with_status(TransactionStatus::Reconciled)
    }

    async fn setup(reserve: bool) -> MemoryStorage {
        let storage = MemoryStorage::new();
        let mut merchant = MerchantConfig::new("M1", "Acme Retail");
        if reserve {
            merchant = merchant.with_rolling_reserve(BigDecimal::from(5), 30);
        }
        storage.save_merchant(&merchant).await.unwrap();
        storage
            .save_commission_config(&CommissionConfig::new(
                "M1",
                "UPI",
                BigDecimal::from(2),
                CommissionType::Percentage,
                BigDecimal::from(18),
            ))
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_settlement_arithmetic() {
        let storage = setup(true).await;
        let calculator = SettlementCalculator::new(storage);

        let computation = calculator
            .calculate_settlement("M1", &[txn("T1", 100_000)], date())
            .await
            .unwrap();

        let item = &computation.batch.items[0];
        assert_eq!(item.commission_paise, 2000);
        assert_eq!(item.gst_paise, 360);
        assert_eq!(item.reserve_paise, 4882);
        assert_eq!(item.net_paise, 92_758);
        assert_eq!(item.fee_bearer_code, "2");
        assert_eq!(
            item.net_paise,
            item.amount_paise - item.commission_paise - item.gst_paise - item.reserve_paise
        );
        assert!(computation.batch.verify_totals().is_ok());
    }

    #[tokio::test]
    async fn test_item_carries_gst_split() {
        let storage = setup(false).await;
        let calculator = SettlementCalculator::new(storage.clone());
        let computation = calculator
            .calculate_settlement("M1", &[txn("T1", 100_000)], date())
            .await
            .unwrap();
        let item = &computation.batch.items[0];
        assert_eq!((item.cgst_paise, item.sgst_paise, item.igst_paise), (180, 180, 0));

        storage
            .save_merchant(&MerchantConfig::new("M1", "Acme Retail").with_gst_supply(SupplyType::InterState))
            .await
            .unwrap();
        let computation = calculator
            .calculate_settlement("M1", &[txn("T2", 100_000)], date())
            .await
            .unwrap();
        let item = &computation.batch.items[0];
        assert_eq!((item.cgst_paise, item.sgst_paise, item.igst_paise), (0, 0, 360));
        assert_eq!(item.gst_paise, 360);
        assert!(computation.batch.verify_totals().is_ok());
    }

    #[tokio::test]
    async fn test_batch_totals_sum_items() {
        let storage = setup(true).await;
        let calculator = SettlementCalculator::new(storage);

        let computation = calculator
            .calculate_settlement(
                "M1",
                &[txn("T1", 100_000), txn("T2", 33_333), txn("T3", 7)],
                date(),
            )
            .await
            .unwrap();

        let batch = &computation.batch;
        assert_eq!(batch.transaction_count, 3);
        assert_eq!(batch.gross_amount_paise, 133_340);
        let net: Paise = batch.items.iter().map(|i| i.net_paise).sum();
        assert_eq!(batch.net_settlement_amount_paise, net);
        assert!(batch.verify_totals().is_ok());
    }

    #[tokio::test]
    async fn test_payer_bears_fees() {
        let storage = setup(false).await;
        storage
            .save_fee_bearer_config(&FeeBearerConfig {
                merchant_id: "M1".to_string(),
                payment_mode_id: "3".to_string(),
                fee_bearer_code: "3".to_string(),
                is_active: true,
            })
            .await
            .unwrap();
        let calculator = SettlementCalculator::new(storage);

        let computation = calculator
            .calculate_settlement("M1", &[txn("T1", 100_000)], date())
            .await
            .unwrap();
        let item = &computation.batch.items[0];
        assert_eq!(item.commission_paise, 2000);
        assert_eq!(item.gst_paise, 360);
        assert_eq!(item.net_paise, 100_000);
    }

    #[tokio::test]
    async fn test_unknown_commission_type_excluded() {
        let storage = MemoryStorage::new();
        storage
            .save_merchant(&MerchantConfig::new("M1", "Acme Retail"))
            .await
            .unwrap();
        let mut config = CommissionConfig::new(
            "M1",
            "CARD",
            BigDecimal::from(2),
            CommissionType::Percentage,
            BigDecimal::from(18),
        );
        config.commission_type = "slab".to_string();
        storage.save_commission_config(&config).await.unwrap();

        let mut card = txn("T2", 50_000);
        card.payment_mode = "CARD".to_string();

        let calculator = SettlementCalculator::new(storage);
        let computation = calculator
            .calculate_settlement("M1", &[card], date())
            .await
            .unwrap();

        assert!(computation.batch.items.is_empty());
        assert_eq!(computation.rejected.len(), 1);
        assert_eq!(computation.rejected[0].error.code, "UNKNOWN_COMMISSION_TYPE");
    }

    #[tokio::test]
    async fn test_missing_merchant() {
        let calculator = SettlementCalculator::new(MemoryStorage::new());
        let result = calculator
            .calculate_settlement("NOPE", &[txn("T1", 100)], date())
            .await;
        assert!(matches!(result, Err(LedgerError::MerchantNotFound(_))));
    }

    #[tokio::test]
    async fn test_inactive_merchant_not_settled() {
        let storage = setup(false).await;
        let mut merchant = MerchantConfig::new("M1", "Acme Retail");
        merchant.is_active = false;
        storage.save_merchant(&merchant).await.unwrap();

        let calculator = SettlementCalculator::new(storage);
        let result = calculator
            .calculate_settlement("M1", &[txn("T1", 100_000)], date())
            .await;
        match result {
            Err(err @ LedgerError::MerchantNotFound(_)) => {
                assert_eq!(err.code(), "MERCHANT_CONFIG_MISSING");
            }
            other => panic!("expected MerchantNotFound, got {:?}", other.map(|c| c.batch.id)),
        }
    }

    #[tokio::test]
    async fn test_persist_is_idempotent_per_cycle() {
        let storage = setup(true).await;
        storage.save_transaction(&txn("T1", 100_000)).await.unwrap();
        storage.save_transaction(&txn("T2", 50_000)).await.unwrap();
        let calculator = SettlementCalculator::new(storage.clone());

        let first = calculator
            .calculate_settlement("M1", &[txn("T1", 100_000)], date())
            .await
            .unwrap();
        let reserve = calculator
            .persist_settlement(&first.batch, PersistOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reserve.reserve_amount_paise, 4882);
        assert_eq!(reserve.balance_paise, 4882);
        assert_eq!(reserve.release_date, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(reserve.status, ReserveStatus::Held);

        let second = calculator
            .calculate_settlement("M1", &[txn("T2", 50_000)], date())
            .await
            .unwrap();
        let result = calculator
            .persist_settlement(&second.batch, PersistOptions::default())
            .await;
        assert!(matches!(result, Err(LedgerError::DuplicateBatch { .. })));
        assert_eq!(storage.list_batches(Some("M1")).await.unwrap().len(), 1);

        let t1 = storage.get_transaction("T1").await.unwrap().unwrap();
        assert_eq!(t1.settlement_batch_id, Some(first.batch.id));
        assert_eq!(t1.status, TransactionStatus::Reconciled);
        let t2 = storage.get_transaction("T2").await.unwrap().unwrap();
        assert!(t2.settlement_batch_id.is_none());
    }

    #[tokio::test]
    async fn test_persist_rejects_empty_batch() {
        let storage = setup(false).await;
        let calculator = SettlementCalculator::new(storage);
        let computation = calculator.calculate_settlement("M1", &[], date()).await.unwrap();
        assert!(calculator
            .persist_settlement(&computation.batch, PersistOptions::default())
            .await
            .is_err());
    }
}
