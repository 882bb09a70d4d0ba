//! Core types for reconciliation and settlement

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tax::gst::SupplyType;

/// Monetary amount in minor units (paise). 1 rupee = 100 paise.
pub type Paise = i64;

/// Payment mode id used when a transaction carries none (Net Banking)
pub const DEFAULT_PAYMENT_MODE_ID: &str = "3";

/// Lifecycle of a payment gateway transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Captured by the gateway, not yet matched against the bank
    Captured,
    /// Matched against a bank record
    Reconciled,
    /// Included in a settlement batch by the queue processor
    Settled,
}

/// A payment gateway transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: String,
    /// Merchant the transaction belongs to
    pub merchant_id: String,
    /// Transaction amount in paise
    pub amount_paise: Paise,
    /// Payment mode label (UPI, CARD, NETBANKING, ...)
    pub payment_mode: String,
    /// Payment mode id used for the fee-bearer lookup
    pub payment_mode_id: String,
    /// Bank or acquirer code
    pub bank_code: Option<String>,
    /// Unique transaction reference issued by the bank
    pub utr: Option<String>,
    /// Retrieval reference number
    pub rrn: Option<String>,
    /// Date the transaction was captured
    pub transaction_date: NaiveDate,
    /// Current status
    pub status: TransactionStatus,
    /// Batch this transaction was settled in, if any
    pub settlement_batch_id: Option<Uuid>,
    /// When the transaction was marked settled
    pub settled_at: Option<NaiveDateTime>,
}

impl Transaction {
    /// Create a captured transaction with the default payment mode id
    pub fn new(
        id: String,
        merchant_id: String,
        amount_paise: Paise,
        payment_mode: String,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            merchant_id,
            amount_paise,
            payment_mode,
            payment_mode_id: DEFAULT_PAYMENT_MODE_ID.to_string(),
            bank_code: None,
            utr: None,
            rrn: None,
            transaction_date,
            status: TransactionStatus::Captured,
            settlement_batch_id: None,
            settled_at: None,
        }
    }

    pub fn with_utr(mut self, utr: impl Into<String>) -> Self {
        self.utr = Some(utr.into());
        self
    }

    pub fn with_rrn(mut self, rrn: impl Into<String>) -> Self {
        self.rrn = Some(rrn.into());
        self
    }

    pub fn with_bank_code(mut self, bank_code: impl Into<String>) -> Self {
        self.bank_code = Some(bank_code.into());
        self
    }

    pub fn with_payment_mode_id(mut self, payment_mode_id: impl Into<String>) -> Self {
        self.payment_mode_id = payment_mode_id.into();
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// UTR trimmed and upper-cased, `None` when missing or blank
    pub fn normalized_utr(&self) -> Option<String> {
        self.utr.as_deref().and_then(normalize_utr)
    }

    /// Whether the transaction already belongs to a settlement batch
    pub fn is_batched(&self) -> bool {
        self.settlement_batch_id.is_some()
    }

    /// Basic structural validation
    pub fn validate(&self) -> LedgerResult<()> {
        if self.id.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Transaction ID cannot be empty".to_string(),
            ));
        }

        if self.merchant_id.trim().is_empty() {
            return Err(LedgerError::Validation(format!(
                "Transaction {} has no merchant",
                self.id
            )));
        }

        if self.amount_paise <= 0 {
            return Err(LedgerError::Validation(format!(
                "Transaction {} amount must be positive, got {}",
                self.id, self.amount_paise
            )));
        }

        Ok(())
    }
}

/// Normalize a UTR for comparison
pub fn normalize_utr(utr: &str) -> Option<String> {
    let trimmed = utr.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// A credit line from a bank settlement statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRecord {
    /// Unique transaction reference
    pub utr: String,
    /// Credited amount in paise
    pub amount_paise: Paise,
    /// Value date reported by the bank
    pub value_date: Option<NaiveDate>,
    /// Free-text remarks
    pub remarks: Option<String>,
    /// Retrieval reference number
    pub rrn: Option<String>,
}

impl BankRecord {
    pub fn new(utr: impl Into<String>, amount_paise: Paise) -> Self {
        Self {
            utr: utr.into(),
            amount_paise,
            value_date: None,
            remarks: None,
            rrn: None,
        }
    }

    pub fn normalized_utr(&self) -> Option<String> {
        normalize_utr(&self.utr)
    }
}

/// Kind of reconciliation exception
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    MissingUtr,
    DuplicateUtr,
    AmountMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Why a record was left unmatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnmatchedReason {
    /// No bank record carries the transaction's UTR
    UtrNotFound,
    /// Bank records exist for the UTR but none is within tolerance
    AmountMismatch,
    /// Bank record with no corresponding gateway transaction
    NoPgTxn,
}

/// An anomaly found while matching. Recorded as data, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchException {
    pub exception_type: ExceptionType,
    pub severity: Severity,
    pub pg: Option<Transaction>,
    pub bank: Option<BankRecord>,
    pub message: String,
}

/// Outcome of matching for a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        pg: Transaction,
        bank: BankRecord,
        /// 100, 90 or 70
        confidence: u8,
    },
    UnmatchedPg {
        pg: Transaction,
        reason: UnmatchedReason,
    },
    UnmatchedBank {
        bank: BankRecord,
        reason: UnmatchedReason,
    },
    Exception(MatchException),
}

/// Merchant master record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantConfig {
    pub merchant_id: String,
    pub merchant_name: String,
    /// Whether a rolling reserve is withheld from settlements
    pub rolling_reserve_enabled: bool,
    /// Reserve percentage (e.g. 5.0 for 5%)
    pub rolling_reserve_percentage: BigDecimal,
    /// Days a reserve is held before release
    pub reserve_hold_days: u32,
    /// Settlement cycle in days (T+n)
    pub settlement_cycle_days: u32,
    /// Decides whether commission GST is split CGST/SGST or charged as IGST
    #[serde(default)]
    pub gst_supply: SupplyType,
    pub is_active: bool,
}

impl MerchantConfig {
    /// Active merchant with no rolling reserve and a T+1 cycle
    pub fn new(merchant_id: impl Into<String>, merchant_name: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            merchant_name: merchant_name.into(),
            rolling_reserve_enabled: false,
            rolling_reserve_percentage: BigDecimal::from(0),
            reserve_hold_days: 0,
            settlement_cycle_days: 1,
            gst_supply: SupplyType::IntraState,
            is_active: true,
        }
    }

    pub fn with_gst_supply(mut self, supply: SupplyType) -> Self {
        self.gst_supply = supply;
        self
    }

    pub fn with_rolling_reserve(mut self, percentage: BigDecimal, hold_days: u32) -> Self {
        self.rolling_reserve_enabled = true;
        self.rolling_reserve_percentage = percentage;
        self.reserve_hold_days = hold_days;
        self
    }
}

/// How a commission value is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    /// Percentage of the transaction amount
    Percentage,
    /// Flat amount in rupees per transaction
    Fixed,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionType::Percentage => "percentage",
            CommissionType::Fixed => "fixed",
        }
    }

    /// Parse a stored commission type, case-insensitively
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(CommissionType::Percentage),
            "fixed" => Ok(CommissionType::Fixed),
            _ => Err(LedgerError::UnknownCommissionType(raw.to_string())),
        }
    }
}

/// A commission rate row for a merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionConfig {
    pub merchant_id: String,
    pub payment_mode: String,
    /// Bank code the rate applies to
    pub bank_code: Option<String>,
    /// Bank name the rate applies to
    pub bank_name: Option<String>,
    /// Percentage (2.0) or flat rupee amount (5.0) depending on type
    pub commission_value: BigDecimal,
    /// Stored raw so unrecognised types surface at calculation time
    pub commission_type: String,
    /// GST percentage charged on the commission
    pub gst_percentage: BigDecimal,
    pub is_active: bool,
}

impl CommissionConfig {
    pub fn new(
        merchant_id: impl Into<String>,
        payment_mode: impl Into<String>,
        commission_value: BigDecimal,
        commission_type: CommissionType,
        gst_percentage: BigDecimal,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            payment_mode: payment_mode.into(),
            bank_code: None,
            bank_name: None,
            commission_value,
            commission_type: commission_type.as_str().to_string(),
            gst_percentage,
            is_active: true,
        }
    }

    pub fn for_bank(mut self, bank_code: impl Into<String>) -> Self {
        self.bank_code = Some(bank_code.into());
        self
    }
}

/// Who bears the gateway fee for a payment mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBearerConfig {
    pub merchant_id: String,
    pub payment_mode_id: String,
    /// `1` bank, `2` merchant, `3` payer
    pub fee_bearer_code: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementFrequency {
    Daily,
    Weekly,
    Monthly,
    OnDemand,
}

/// Bank transfer rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferMode {
    Imps,
    Neft,
    Rtgs,
}

/// Merchant bank account that receives settlements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryAccount {
    pub account_holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub bank_name: String,
}

/// How and when a merchant is settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantSettlementProfile {
    pub merchant_id: String,
    pub frequency: SettlementFrequency,
    /// ISO weekday (Mon=1..Sun=7) for weekly, day of month for monthly
    pub settlement_day: Option<u32>,
    /// Queue a bank transfer automatically after batching
    pub auto_settle: bool,
    /// Minimum net amount for an automatic transfer
    pub min_settlement_amount_paise: Paise,
    pub preferred_transfer_mode: Option<TransferMode>,
    pub beneficiary: Option<BeneficiaryAccount>,
    pub is_active: bool,
}

impl MerchantSettlementProfile {
    /// Active daily profile with auto-settle off
    pub fn daily(merchant_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            frequency: SettlementFrequency::Daily,
            settlement_day: None,
            auto_settle: false,
            min_settlement_amount_paise: 0,
            preferred_transfer_mode: None,
            beneficiary: None,
            is_active: true,
        }
    }
}

/// Settlement batch lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Calculated,
    PendingApproval,
    Approved,
    SentToBank,
    Credited,
    Failed,
}

/// Per-transaction settlement breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementItem {
    pub transaction_id: String,
    pub amount_paise: Paise,
    pub commission_paise: Paise,
    /// Configured commission value that was applied
    pub commission_rate: BigDecimal,
    pub commission_type: String,
    /// Total GST; always `cgst_paise + sgst_paise + igst_paise`
    pub gst_paise: Paise,
    pub cgst_paise: Paise,
    pub sgst_paise: Paise,
    pub igst_paise: Paise,
    pub reserve_paise: Paise,
    pub net_paise: Paise,
    pub payment_mode: String,
    pub fee_bearer_code: String,
}

/// Settlement for one merchant and cycle date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementBatch {
    pub id: Uuid,
    pub merchant_id: String,
    pub merchant_name: String,
    pub cycle_date: NaiveDate,
    pub transaction_count: usize,
    pub gross_amount_paise: Paise,
    pub total_commission_paise: Paise,
    pub total_gst_paise: Paise,
    pub total_reserve_paise: Paise,
    pub net_settlement_amount_paise: Paise,
    pub status: BatchStatus,
    pub items: Vec<SettlementItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SettlementBatch {
    /// Check that batch totals equal the sum of its items
    pub fn verify_totals(&self) -> LedgerResult<()> {
        let mut sums = [0 as Paise; 5];
        for item in &self.items {
            let split = item.cgst_paise + item.sgst_paise + item.igst_paise;
            if split != item.gst_paise {
                return Err(LedgerError::InvariantViolation(format!(
                    "Item {} GST {} != CGST/SGST/IGST sum {}",
                    item.transaction_id, item.gst_paise, split
                )));
            }
            sums[0] += item.amount_paise;
            sums[1] += item.commission_paise;
            sums[2] += item.gst_paise;
            sums[3] += item.reserve_paise;
            sums[4] += item.net_paise;
        }

        let checks = [
            ("gross", self.gross_amount_paise, sums[0]),
            ("commission", self.total_commission_paise, sums[1]),
            ("gst", self.total_gst_paise, sums[2]),
            ("reserve", self.total_reserve_paise, sums[3]),
            ("net", self.net_settlement_amount_paise, sums[4]),
        ];

        for (name, total, item_sum) in checks {
            if total != item_sum {
                return Err(LedgerError::InvariantViolation(format!(
                    "Batch {} {} total {} != item sum {}",
                    self.id, name, total, item_sum
                )));
            }
        }

        if self.transaction_count != self.items.len() {
            return Err(LedgerError::InvariantViolation(format!(
                "Batch {} count {} != {} items",
                self.id,
                self.transaction_count,
                self.items.len()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReserveStatus {
    Held,
    Released,
}

/// Rolling reserve withheld from a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingReserveEntry {
    pub id: Uuid,
    pub merchant_id: String,
    pub batch_id: Uuid,
    pub reserve_amount_paise: Paise,
    /// Merchant's running reserve balance including this entry
    pub balance_paise: Paise,
    pub hold_date: NaiveDate,
    pub release_date: NaiveDate,
    pub reserve_percentage: BigDecimal,
    pub hold_days: u32,
    pub status: ReserveStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Queued,
    Sent,
    Failed,
}

/// Outbound payout waiting for the bank integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransferQueueItem {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub merchant_id: String,
    pub transfer_mode: TransferMode,
    pub amount_paise: Paise,
    pub beneficiary: BeneficiaryAccount,
    pub status: TransferStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Pending,
    Processing,
    Processed,
    Failed,
}

/// A reconciled transaction waiting to be settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementQueueEntry {
    pub id: Uuid,
    pub transaction_id: String,
    pub merchant_id: String,
    pub amount_paise: Paise,
    pub status: QueueStatus,
    pub queued_at: NaiveDateTime,
    pub retry_count: u32,
    pub error_message: Option<String>,
    pub processed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

impl SettlementQueueEntry {
    pub fn pending(transaction: &Transaction, queued_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id: transaction.id.clone(),
            merchant_id: transaction.merchant_id.clone(),
            amount_paise: transaction.amount_paise,
            status: QueueStatus::Pending,
            queued_at,
            retry_count: 0,
            error_message: None,
            processed_at: None,
            updated_at: queued_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Cron,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Partial,
    Failed,
}

/// Machine-readable error with an operator hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub hint: String,
}

impl From<&LedgerError> for ErrorDetail {
    fn from(err: &LedgerError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            hint: err.hint().to_string(),
        }
    }
}

/// Error recorded against a merchant during a schedule run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub merchant_id: String,
    pub cycle_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub detail: ErrorDetail,
}

/// Audit record of one scheduler run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRun {
    pub id: Uuid,
    pub run_date: NaiveDate,
    pub trigger_type: TriggerType,
    pub triggered_by: String,
    pub status: RunStatus,
    pub merchants_processed: u32,
    pub batches_created: u32,
    pub total_amount_settled_paise: Paise,
    pub errors_count: u32,
    pub error_details: Vec<RunError>,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Validation,
    FetchPg,
    FetchBank,
    Normalize,
    Matching,
    Persist,
    Done,
}

/// Running counts for a reconciliation job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    pub pg_fetched: usize,
    pub bank_fetched: usize,
    pub normalized: usize,
    pub matched: usize,
    pub unmatched_pg: usize,
    pub unmatched_bank: usize,
    pub exceptions: usize,
}

/// A reconciliation run for one cycle date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationJob {
    pub id: Uuid,
    /// Shared by every log line the job emits
    pub correlation_id: Uuid,
    pub cycle_date: NaiveDate,
    pub dry_run: bool,
    pub status: JobStatus,
    pub stage: JobStage,
    pub counters: JobCounters,
    pub error: Option<ErrorDetail>,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One structured log line attached to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub timestamp: NaiveDateTime,
    pub level: LogLevel,
    pub stage: JobStage,
    pub message: String,
    pub fields: serde_json::Value,
}

/// Errors that can occur in the settlement system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Merchant config not found: {0}")]
    MerchantNotFound(String),
    #[error("Unknown commission type: {0}")]
    UnknownCommissionType(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Settlement batch already exists for merchant {merchant_id} on {cycle_date}")]
    DuplicateBatch {
        merchant_id: String,
        cycle_date: NaiveDate,
    },
    #[error("Settlement batch not found: {0}")]
    BatchNotFound(Uuid),
    #[error("No data to reconcile: {0}")]
    EmptyDataset(String),
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// Stable machine code for the error
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Storage(_) => "DATABASE_ERROR",
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            LedgerError::MerchantNotFound(_) => "MERCHANT_CONFIG_MISSING",
            LedgerError::UnknownCommissionType(_) => "UNKNOWN_COMMISSION_TYPE",
            LedgerError::Configuration(_) => "CONFIGURATION_ERROR",
            LedgerError::DuplicateBatch { .. } => "DUPLICATE_BATCH",
            LedgerError::BatchNotFound(_) => "BATCH_NOT_FOUND",
            LedgerError::EmptyDataset(_) => "EMPTY_DATASET",
            LedgerError::InvariantViolation(_) => "INVARIANT_VIOLATION",
        }
    }

    /// Short remediation hint for operators
    pub fn hint(&self) -> &'static str {
        match self {
            LedgerError::Storage(_) => "Check database connectivity and retry",
            LedgerError::Validation(_) => "Fix the input values and resubmit",
            LedgerError::TransactionNotFound(_) => "Verify the transaction was ingested",
            LedgerError::MerchantNotFound(_) => "Create the merchant master record before settling",
            LedgerError::UnknownCommissionType(_) => {
                "Set commission_type to 'percentage' or 'fixed'"
            }
            LedgerError::Configuration(_) => "Review merchant settlement configuration",
            LedgerError::DuplicateBatch { .. } => {
                "A batch for this cycle already exists; settle on a later cycle date"
            }
            LedgerError::BatchNotFound(_) => "Verify the batch id",
            LedgerError::EmptyDataset(_) => {
                "Confirm gateway and bank files were ingested for this cycle date"
            }
            LedgerError::InvariantViolation(_) => "Escalate to engineering; data is inconsistent",
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
