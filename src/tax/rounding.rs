//! Paise conversion and half-up rounding

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::types::{LedgerError, LedgerResult, Paise};

/// Round a decimal amount of paise to the nearest whole paise, halves away from zero
pub fn round_half_up(value: &BigDecimal) -> LedgerResult<Paise> {
    let half = BigDecimal::from(5) / BigDecimal::from(10);
    let zero = BigDecimal::from(0);

    let rounded = if *value >= zero {
        (value + &half).with_scale(0)
    } else {
        -((-value + &half).with_scale(0))
    };

    rounded.to_i64().ok_or_else(|| {
        LedgerError::Validation(format!("Amount {} is out of range", value))
    })
}

/// `round(amount * percentage / 100)`
pub fn percent_of(amount: Paise, percentage: &BigDecimal) -> LedgerResult<Paise> {
    let raw = (BigDecimal::from(amount) * percentage) / BigDecimal::from(100);
    round_half_up(&raw)
}

/// Convert a rupee amount to paise
pub fn rupees_to_paise(rupees: &BigDecimal) -> LedgerResult<Paise> {
    round_half_up(&(rupees.clone() * BigDecimal::from(100)))
}

/// Render paise as a rupee string, e.g. `₹1000.50`
pub fn format_paise(amount: Paise) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}₹{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(&dec("0.5")).unwrap(), 1);
        assert_eq!(round_half_up(&dec("1.49")).unwrap(), 1);
        assert_eq!(round_half_up(&dec("2.5")).unwrap(), 3);
        assert_eq!(round_half_up(&dec("4882")).unwrap(), 4882);
        assert_eq!(round_half_up(&dec("-2.5")).unwrap(), -3);
        assert_eq!(round_half_up(&dec("0")).unwrap(), 0);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(100_000, &BigDecimal::from(2)).unwrap(), 2000);
        assert_eq!(percent_of(2000, &BigDecimal::from(18)).unwrap(), 360);
        assert_eq!(percent_of(97_640, &BigDecimal::from(5)).unwrap(), 4882);
        // 333 * 1.5% = 4.995
        assert_eq!(percent_of(333, &dec("1.5")).unwrap(), 5);
    }

    #[test]
    fn test_rupees_to_paise() {
        assert_eq!(rupees_to_paise(&dec("5")).unwrap(), 500);
        assert_eq!(rupees_to_paise(&dec("12.345")).unwrap(), 1235);
    }

    #[test]
    fn test_format_paise() {
        assert_eq!(format_paise(100_050), "₹1000.50");
        assert_eq!(format_paise(7), "₹0.07");
        assert_eq!(format_paise(-250), "-₹2.50");
    }
}
