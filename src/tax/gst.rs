//! GST charged on gateway commission

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::tax::rounding::percent_of;
use crate::types::{LedgerError, Paise};

/// Where the gateway's service is supplied relative to the merchant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    /// Same state: charged as CGST plus SGST
    #[default]
    IntraState,
    /// Different state: charged as IGST
    InterState,
}

/// Total GST percentage and how it is levied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstRate {
    /// e.g. `18` for 18%
    pub total_rate: BigDecimal,
    pub supply: SupplyType,
}

impl GstRate {
    pub fn new(total_rate: BigDecimal, supply: SupplyType) -> Self {
        Self { total_rate, supply }
    }

    pub fn intra_state(total_rate: BigDecimal) -> Self {
        Self::new(total_rate, SupplyType::IntraState)
    }

    pub fn inter_state(total_rate: BigDecimal) -> Self {
        Self::new(total_rate, SupplyType::InterState)
    }

    pub fn is_inter_state(&self) -> bool {
        self.supply == SupplyType::InterState
    }

    pub fn validate(&self) -> Result<(), GstError> {
        if self.total_rate < BigDecimal::from(0) || self.total_rate > BigDecimal::from(100) {
            return Err(GstError::InvalidRate(format!(
                "GST percentage must be within 0..=100, got {}",
                self.total_rate
            )));
        }
        Ok(())
    }
}

/// GST on one commission amount, in paise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionGst {
    /// Commission the tax is charged on
    pub commission_paise: Paise,
    pub gst_rate: GstRate,
    pub cgst_paise: Paise,
    pub sgst_paise: Paise,
    pub igst_paise: Paise,
    /// `round(commission * rate / 100)`
    pub total_gst_paise: Paise,
}

impl CommissionGst {
    /// Calculate GST on a commission. The total is rounded once; the CGST/SGST
    /// split gives any odd paise to SGST so the parts always sum to the total.
    pub fn calculate(commission_paise: Paise, gst_rate: GstRate) -> Result<Self, GstError> {
        gst_rate.validate()?;

        let total_gst_paise = percent_of(commission_paise, &gst_rate.total_rate)
            .map_err(|e| GstError::Calculation(e.to_string()))?;

        let (cgst_paise, sgst_paise, igst_paise) = if gst_rate.is_inter_state() {
            (0, 0, total_gst_paise)
        } else {
            let cgst = total_gst_paise / 2;
            (cgst, total_gst_paise - cgst, 0)
        };

        Ok(Self {
            commission_paise,
            gst_rate,
            cgst_paise,
            sgst_paise,
            igst_paise,
            total_gst_paise,
        })
    }
}

/// GST-related errors
#[derive(Debug, thiserror::Error)]
pub enum GstError {
    #[error("Invalid GST rate: {0}")]
    InvalidRate(String),
    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl From<GstError> for LedgerError {
    fn from(err: GstError) -> Self {
        LedgerError::Configuration(err.to_string())
    }
}
