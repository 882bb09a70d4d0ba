//! Commission rate resolution and fee-bearer policy

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::DefaultCommission;
use crate::tax::rounding::{percent_of, rupees_to_paise};
use crate::traits::LedgerStorage;
use crate::types::*;

/// Which step of the fallback chain produced a commission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Merchant, payment mode and bank all matched
    Exact,
    /// Merchant and payment mode matched, any bank
    PaymentMode,
    /// Any active row for the merchant
    Merchant,
    /// No usable configuration; hard default applied
    Default,
}

/// Commission terms that apply to one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCommission {
    pub value: BigDecimal,
    pub commission_type: String,
    pub gst_percentage: BigDecimal,
    pub source: ResolutionSource,
}

/// Party responsible for gateway fees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeBearer {
    /// Code `1`
    Bank,
    /// Code `2`
    Merchant,
    /// Code `3`
    Payer,
}

impl FeeBearer {
    /// Map a stored bearer code. Unknown codes fall back to the merchant.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => FeeBearer::Bank,
            "2" => FeeBearer::Merchant,
            "3" => FeeBearer::Payer,
            other => {
                warn!(code = other, "Unknown fee bearer code, merchant bears fees");
                FeeBearer::Merchant
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FeeBearer::Bank => "1",
            FeeBearer::Merchant => "2",
            FeeBearer::Payer => "3",
        }
    }

    pub fn merchant_bears_fees(&self) -> bool {
        matches!(self, FeeBearer::Merchant)
    }

    /// Amount the merchant is owed before any reserve
    pub fn settlement_before_reserve(&self, amount: Paise, commission: Paise, gst: Paise) -> Paise {
        if self.merchant_bears_fees() {
            amount - commission - gst
        } else {
            amount
        }
    }
}

/// `percentage` → `round(amount * value / 100)`; `fixed` → `round(value * 100)`
/// with the value in rupees. Any other type is a configuration error.
pub fn calculate_commission_amount(
    amount: Paise,
    value: &BigDecimal,
    commission_type: &str,
) -> LedgerResult<Paise> {
    match CommissionType::parse(commission_type)? {
        CommissionType::Percentage => percent_of(amount, value),
        CommissionType::Fixed => rupees_to_paise(value),
    }
}

fn lowest<'a, I>(rows: I) -> Option<&'a CommissionConfig>
where
    I: Iterator<Item = &'a CommissionConfig>,
{
    let mut best: Option<&CommissionConfig> = None;
    for row in rows {
        if best.map_or(true, |b| row.commission_value < b.commission_value) {
            best = Some(row);
        }
    }
    best
}

fn matches_bank(config: &CommissionConfig, bank: &str) -> bool {
    let eq = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case(bank))
    };
    eq(&config.bank_code) || eq(&config.bank_name)
}

/// Walk the fallback chain over a merchant's commission rows.
///
/// Rows are considered in the order given; among equal lowest values the
/// first row wins.
pub fn resolve_from(
    configs: &[CommissionConfig],
    merchant_id: &str,
    payment_mode: &str,
    bank: Option<&str>,
    default: &DefaultCommission,
) -> ResolvedCommission {
    let active = || {
        configs
            .iter()
            .filter(move |c| c.is_active && c.merchant_id == merchant_id)
    };
    let same_mode = |c: &&CommissionConfig| c.payment_mode.eq_ignore_ascii_case(payment_mode);

    let resolved = |row: &CommissionConfig, source| ResolvedCommission {
        value: row.commission_value.clone(),
        commission_type: row.commission_type.clone(),
        gst_percentage: row.gst_percentage.clone(),
        source,
    };

    if let Some(bank) = bank {
        if let Some(row) = lowest(active().filter(same_mode).filter(|c| matches_bank(c, bank))) {
            return resolved(row, ResolutionSource::Exact);
        }
    }

    if let Some(row) = lowest(active().filter(same_mode)) {
        return resolved(row, ResolutionSource::PaymentMode);
    }

    if let Some(row) = lowest(active()) {
        warn!(
            merchant_id,
            payment_mode,
            value = %row.commission_value,
            "No commission for payment mode, using merchant's lowest rate"
        );
        return resolved(row, ResolutionSource::Merchant);
    }

    error!(
        merchant_id,
        payment_mode,
        "No commission config for merchant, applying default rate"
    );
    ResolvedCommission {
        value: default.value.clone(),
        commission_type: default.commission_type.as_str().to_string(),
        gst_percentage: default.gst_percentage.clone(),
        source: ResolutionSource::Default,
    }
}

/// Resolves commission terms and fee bearers from the store
pub struct CommissionResolver<S: LedgerStorage> {
    storage: S,
    default: DefaultCommission,
    default_fallbacks: Arc<AtomicU64>,
}

impl<S: LedgerStorage> CommissionResolver<S> {
    pub fn new(storage: S) -> Self {
        Self::with_default(storage, DefaultCommission::default())
    }

    pub fn with_default(storage: S, default: DefaultCommission) -> Self {
        Self {
            storage,
            default,
            default_fallbacks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Resolve commission terms for a transaction
    pub async fn resolve(
        &self,
        merchant_id: &str,
        payment_mode: &str,
        bank: Option<&str>,
    ) -> LedgerResult<ResolvedCommission> {
        let configs = self.storage.list_commission_configs(merchant_id).await?;
        let resolved = resolve_from(&configs, merchant_id, payment_mode, bank, &self.default);
        if resolved.source == ResolutionSource::Default {
            self.default_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
        Ok(resolved)
    }

    /// Fee bearer for a merchant and payment mode id; merchant when unconfigured
    pub async fn fee_bearer(&self, merchant_id: &str, payment_mode_id: &str) -> LedgerResult<FeeBearer> {
        let config = self
            .storage
            .get_fee_bearer_config(merchant_id, payment_mode_id)
            .await?;
        Ok(config
            .map(|c| FeeBearer::from_code(&c.fee_bearer_code))
            .unwrap_or(FeeBearer::Merchant))
    }

    /// How many resolutions fell through to the hard default
    pub fn default_fallbacks(&self) -> u64 {
        self.default_fallbacks.load(Ordering::Relaxed)
    }
}
