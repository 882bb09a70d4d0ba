//! Column mappings for heterogeneous gateway and bank files
//!
//! A mapping is resolved once at ingestion: each logical field names the
//! source columns that may carry it, in priority order. The matcher only ever
//! sees normalized [`Transaction`] and [`BankRecord`] values.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

use crate::tax::rounding::{round_half_up, rupees_to_paise};
use crate::types::*;

/// A raw file row keyed by header
pub type RawRow = HashMap<String, String>;

/// Unit the amount column is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountUnit {
    Rupees,
    Paise,
}

/// Shared column resolution rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    pub amount_unit: AmountUnit,
    /// chrono formats tried in order
    pub date_formats: Vec<String>,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            amount_unit: AmountUnit::Rupees,
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%d/%m/%Y".to_string(),
                "%d-%m-%Y".to_string(),
                "%d-%b-%Y".to_string(),
            ],
        }
    }
}

impl FieldRules {
    /// Parse an amount leniently. Unparsable values become 0.
    pub fn parse_amount(&self, raw: Option<&str>, row_index: usize) -> Paise {
        let Some(raw) = raw else {
            return 0;
        };
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        let parsed = BigDecimal::from_str(&cleaned).ok().and_then(|value| match self.amount_unit {
            AmountUnit::Rupees => rupees_to_paise(&value).ok(),
            AmountUnit::Paise => round_half_up(&value).ok(),
        });

        match parsed {
            Some(paise) => paise,
            None => {
                warn!(row = row_index, value = raw, "Non-numeric amount coerced to 0");
                0
            }
        }
    }

    /// Parse a date with the configured formats, accepting a trailing time part
    pub fn parse_date(&self, raw: Option<&str>) -> Option<NaiveDate> {
        let raw = raw?.trim();
        for format in &self.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Some(date);
            }
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .map(|dt| dt.date())
            .ok()
    }
}

fn first_present<'a>(row: &'a RawRow, columns: &[String]) -> Option<&'a str> {
    columns
        .iter()
        .filter_map(|c| row.get(c))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Column mapping for a bank statement file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSchemaMapping {
    pub name: String,
    pub utr_columns: Vec<String>,
    pub amount_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub remarks_columns: Vec<String>,
    pub rrn_columns: Vec<String>,
    pub rules: FieldRules,
}

impl BankSchemaMapping {
    /// Axis Bank settlement statement layout
    pub fn axis_bank() -> Self {
        Self {
            name: "AXIS_BANK".to_string(),
            utr_columns: columns(&["UTR Number", "utr", "UTR"]),
            amount_columns: columns(&["Amount", "amount", "AMOUNT"]),
            date_columns: columns(&["Transaction Date", "date", "txn_date"]),
            remarks_columns: columns(&["Bank Reference", "bank_ref", "Remarks"]),
            rrn_columns: columns(&["RRN", "rrn"]),
            rules: FieldRules::default(),
        }
    }

    /// Lower-case snake_case columns with amounts already in paise
    pub fn generic_paise() -> Self {
        Self {
            name: "GENERIC".to_string(),
            utr_columns: columns(&["utr"]),
            amount_columns: columns(&["amount", "amount_paise"]),
            date_columns: columns(&["date", "value_date"]),
            remarks_columns: columns(&["remarks"]),
            rrn_columns: columns(&["rrn"]),
            rules: FieldRules {
                amount_unit: AmountUnit::Paise,
                ..FieldRules::default()
            },
        }
    }

    pub fn map_row(&self, row: &RawRow, row_index: usize) -> BankRecord {
        BankRecord {
            utr: first_present(row, &self.utr_columns)
                .unwrap_or_default()
                .to_string(),
            amount_paise: self
                .rules
                .parse_amount(first_present(row, &self.amount_columns), row_index),
            value_date: self.rules.parse_date(first_present(row, &self.date_columns)),
            remarks: first_present(row, &self.remarks_columns).map(str::to_string),
            rrn: first_present(row, &self.rrn_columns).map(str::to_string),
        }
    }

    /// Map every row. Bad cells are coerced, never fatal.
    pub fn map_rows(&self, rows: &[RawRow]) -> Vec<BankRecord> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.map_row(row, idx))
            .collect()
    }
}

/// A row that could not become a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_index: usize,
    pub reason: String,
}

/// Column mapping for a gateway transaction export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgSchemaMapping {
    pub name: String,
    pub id_columns: Vec<String>,
    pub merchant_columns: Vec<String>,
    pub utr_columns: Vec<String>,
    pub rrn_columns: Vec<String>,
    pub amount_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub payment_mode_columns: Vec<String>,
    pub bank_code_columns: Vec<String>,
    /// Used when no payment mode column is present
    pub default_payment_mode: String,
    pub rules: FieldRules,
}

impl PgSchemaMapping {
    /// Standard gateway export layout
    pub fn standard_pg() -> Self {
        Self {
            name: "STANDARD_PG".to_string(),
            id_columns: columns(&["Transaction ID", "txn_id", "transaction_id"]),
            merchant_columns: columns(&["Merchant ID", "merchant_id", "client_code"]),
            utr_columns: columns(&["UTR", "utr"]),
            rrn_columns: columns(&["RRN", "rrn"]),
            amount_columns: columns(&["Amount", "amount"]),
            date_columns: columns(&["Date", "date", "created_at"]),
            payment_mode_columns: columns(&["Payment Mode", "payment_mode"]),
            bank_code_columns: columns(&["Bank Code", "bank_code", "acquirer_code"]),
            default_payment_mode: "UPI".to_string(),
            rules: FieldRules::default(),
        }
    }

    /// Map one row. A row without id, merchant or a readable date is skipped.
    pub fn map_row(&self, row: &RawRow, row_index: usize) -> Result<Transaction, SkippedRow> {
        let skip = |reason: &str| SkippedRow {
            row_index,
            reason: reason.to_string(),
        };

        let id = first_present(row, &self.id_columns).ok_or_else(|| skip("missing transaction id"))?;
        let merchant_id =
            first_present(row, &self.merchant_columns).ok_or_else(|| skip("missing merchant id"))?;
        let date = self
            .rules
            .parse_date(first_present(row, &self.date_columns))
            .ok_or_else(|| skip("missing or unreadable date"))?;

        let payment_mode = first_present(row, &self.payment_mode_columns)
            .unwrap_or(&self.default_payment_mode)
            .to_string();
        let amount = self
            .rules
            .parse_amount(first_present(row, &self.amount_columns), row_index);

        let mut transaction = Transaction::new(
            id.to_string(),
            merchant_id.to_string(),
            amount,
            payment_mode,
            date,
        );
        transaction.utr = first_present(row, &self.utr_columns).map(str::to_string);
        transaction.rrn = first_present(row, &self.rrn_columns).map(str::to_string);
        transaction.bank_code = first_present(row, &self.bank_code_columns).map(str::to_string);

        Ok(transaction)
    }

    /// Map every row, collecting the ones that had to be skipped
    pub fn map_rows(&self, rows: &[RawRow]) -> (Vec<Transaction>, Vec<SkippedRow>) {
        let mut transactions = Vec::with_capacity(rows.len());
        let mut skipped = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            match self.map_row(row, idx) {
                Ok(transaction) => transactions.push(transaction),
                Err(skip) => {
                    warn!(row = idx, reason = %skip.reason, "Skipping gateway row");
                    skipped.push(skip);
                }
            }
        }

        (transactions, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_axis_bank_mapping() {
        let mapping = BankSchemaMapping::axis_bank();
        let record = mapping.map_row(
            &row(&[
                ("UTR Number", "AXIS123"),
                ("Amount", "1,000.50"),
                ("Transaction Date", "15/03/2024"),
                ("RRN", "998877"),
            ]),
            0,
        );

        assert_eq!(record.utr, "AXIS123");
        assert_eq!(record.amount_paise, 100_050);
        assert_eq!(record.value_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(record.rrn.as_deref(), Some("998877"));
    }

    #[test]
    fn test_fallback_columns() {
        let mapping = BankSchemaMapping::axis_bank();
        let record = mapping.map_row(&row(&[("UTR", "U1"), ("AMOUNT", "25")]), 0);
        assert_eq!(record.utr, "U1");
        assert_eq!(record.amount_paise, 2_500);
    }

    #[test]
    fn test_non_numeric_amount_coerced() {
        let mapping = BankSchemaMapping::axis_bank();
        let records = mapping.map_rows(&[
            row(&[("UTR Number", "U1"), ("Amount", "N/A")]),
            row(&[("UTR Number", "U2"), ("Amount", "10")]),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount_paise, 0);
        assert_eq!(records[1].amount_paise, 1_000);
    }

    #[test]
    fn test_paise_unit() {
        let mapping = BankSchemaMapping::generic_paise();
        let record = mapping.map_row(&row(&[("utr", "U1"), ("amount", "12345")]), 0);
        assert_eq!(record.amount_paise, 12_345);
    }

    #[test]
    fn test_pg_mapping_skips_bad_rows() {
        let mapping = PgSchemaMapping::standard_pg();
        let (transactions, skipped) = mapping.map_rows(&[
            row(&[
                ("Transaction ID", "T1"),
                ("merchant_id", "M1"),
                ("UTR", "U1"),
                ("Amount", "100"),
                ("Date", "2024-03-01 10:15:00"),
            ]),
            row(&[("Transaction ID", "T2"), ("merchant_id", "M1")]),
        ]);

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount_paise, 10_000);
        assert_eq!(transactions[0].payment_mode, "UPI");
        assert_eq!(transactions[0].status, TransactionStatus::Captured);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].row_index, 1);
    }
}
