//! Validation utilities

use bigdecimal::BigDecimal;

use crate::traits::*;
use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: Paise) -> LedgerResult<()> {
    if amount <= 0 {
        Err(LedgerError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a merchant ID is valid
pub fn validate_merchant_id(merchant_id: &str) -> LedgerResult<()> {
    if merchant_id.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Merchant ID cannot be empty".to_string(),
        ));
    }

    if merchant_id.len() > 64 {
        return Err(LedgerError::Validation(
            "Merchant ID cannot exceed 64 characters".to_string(),
        ));
    }

    if !merchant_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Merchant ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate a UTR when one is present
pub fn validate_utr(utr: &str) -> LedgerResult<()> {
    let trimmed = utr.trim();
    if trimmed.len() > 35 {
        return Err(LedgerError::Validation(format!(
            "UTR '{}' exceeds 35 characters",
            trimmed
        )));
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::Validation(format!(
            "UTR '{}' must be alphanumeric",
            trimmed
        )));
    }

    Ok(())
}

/// Validate that a percentage lies in `0..=100`
pub fn validate_percentage(name: &str, value: &BigDecimal) -> LedgerResult<()> {
    if *value < BigDecimal::from(0) || *value > BigDecimal::from(100) {
        return Err(LedgerError::Configuration(format!(
            "{} must be between 0 and 100, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate merchant settlement settings before they are used
pub fn validate_merchant_config(merchant: &MerchantConfig) -> LedgerResult<()> {
    validate_merchant_id(&merchant.merchant_id)?;
    if merchant.rolling_reserve_enabled {
        validate_percentage(
            "Rolling reserve percentage",
            &merchant.rolling_reserve_percentage,
        )?;
    }
    Ok(())
}

/// Enhanced transaction validator with detailed checks
pub struct EnhancedTransactionValidator {
    /// Largest single transaction accepted for settlement
    pub max_amount_paise: Paise,
}

impl Default for EnhancedTransactionValidator {
    fn default() -> Self {
        // ₹1 crore
        Self {
            max_amount_paise: 1_000_000_000,
        }
    }
}

impl TransactionValidator for EnhancedTransactionValidator {
    fn validate_transaction(&self, transaction: &Transaction) -> LedgerResult<()> {
        transaction.validate()?;

        validate_merchant_id(&transaction.merchant_id)?;
        validate_positive_amount(transaction.amount_paise)?;

        if transaction.amount_paise > self.max_amount_paise {
            return Err(LedgerError::Validation(format!(
                "Transaction {} amount {} exceeds limit {}",
                transaction.id, transaction.amount_paise, self.max_amount_paise
            )));
        }

        if transaction.payment_mode.trim().is_empty() {
            return Err(LedgerError::Validation(format!(
                "Transaction {} has no payment mode",
                transaction.id
            )));
        }

        if let Some(utr) = &transaction.utr {
            validate_utr(utr)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_validate_merchant_id() {
        assert!(validate_merchant_id("M_001-a").is_ok());
        assert!(validate_merchant_id("").is_err());
        assert!(validate_merchant_id("bad id").is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage("p", &BigDecimal::from(5)).is_ok());
        assert!(validate_percentage("p", &BigDecimal::from(101)).is_err());
        assert!(validate_percentage("p", &BigDecimal::from(-1)).is_err());
    }

    #[test]
    fn test_enhanced_validator() {
        let validator = EnhancedTransactionValidator::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let ok = Transaction::new("T1".to_string(), "M1".to_string(), 100, "UPI".to_string(), date)
            .with_utr("UTR123");
        assert!(validator.validate_transaction(&ok).is_ok());

        let bad_utr = ok.clone().with_utr("UTR-123!");
        assert!(validator.validate_transaction(&bad_utr).is_err());

        let mut too_large = ok.clone();
        too_large.amount_paise = 2_000_000_000;
        assert!(validator.validate_transaction(&too_large).is_err());
    }
}
