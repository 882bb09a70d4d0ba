//! Approval routing and bank transfer queueing

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::tax::rounding::format_paise;
use crate::traits::LedgerStorage;
use crate::types::*;

/// Thresholds that decide approval and transfer rail for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutPolicy {
    pub approval_threshold_paise: Paise,
    pub rtgs_threshold_paise: Paise,
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl PayoutPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            approval_threshold_paise: config.approval_threshold_paise,
            rtgs_threshold_paise: config.rtgs_threshold_paise,
        }
    }

    /// Large batches wait for manual approval, the rest are approved
    pub fn approval_status(&self, net_paise: Paise) -> BatchStatus {
        if net_paise >= self.approval_threshold_paise {
            BatchStatus::PendingApproval
        } else {
            BatchStatus::Approved
        }
    }

    /// RTGS at or above the threshold, IMPS when preferred, NEFT otherwise
    pub fn transfer_mode(&self, net_paise: Paise, preferred: Option<TransferMode>) -> TransferMode {
        if net_paise >= self.rtgs_threshold_paise {
            TransferMode::Rtgs
        } else if preferred == Some(TransferMode::Imps) {
            TransferMode::Imps
        } else {
            TransferMode::Neft
        }
    }

    /// Route a persisted batch to its approval status
    pub async fn route_batch<S: LedgerStorage>(
        &self,
        storage: &S,
        batch: &SettlementBatch,
    ) -> LedgerResult<BatchStatus> {
        let status = self.approval_status(batch.net_settlement_amount_paise);
        storage
            .update_batch_status(batch.id, status, Utc::now().naive_utc())
            .await?;
        info!(
            batch_id = %batch.id,
            net = %format_paise(batch.net_settlement_amount_paise),
            ?status,
            "Batch routed"
        );
        Ok(status)
    }

    /// Queue a bank transfer for a batch.
    ///
    /// Returns `None` when the amount is not payable. At most one transfer
    /// exists per batch; repeated calls return the existing one.
    pub async fn queue_transfer<S: LedgerStorage>(
        &self,
        storage: &S,
        batch: &SettlementBatch,
        profile: &MerchantSettlementProfile,
    ) -> LedgerResult<Option<BankTransferQueueItem>> {
        let amount = batch.net_settlement_amount_paise;
        if amount <= 0 {
            warn!(batch_id = %batch.id, amount, "Skipping transfer for non-positive amount");
            return Ok(None);
        }

        let beneficiary = profile.beneficiary.clone().ok_or_else(|| {
            LedgerError::Configuration(format!(
                "Merchant {} has no beneficiary account",
                profile.merchant_id
            ))
        })?;

        let item = BankTransferQueueItem {
            id: Uuid::new_v4(),
            batch_id: batch.id,
            merchant_id: batch.merchant_id.clone(),
            transfer_mode: self.transfer_mode(amount, profile.preferred_transfer_mode),
            amount_paise: amount,
            beneficiary,
            status: TransferStatus::Queued,
            created_at: Utc::now().naive_utc(),
        };

        let queued = storage.enqueue_transfer(&item).await?;
        info!(
            batch_id = %batch.id,
            transfer_id = %queued.id,
            mode = ?queued.transfer_mode,
            amount = %format_paise(amount),
            "Bank transfer queued"
        );
        Ok(Some(queued))
    }
}
