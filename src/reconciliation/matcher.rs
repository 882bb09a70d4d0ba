//! UTR-keyed matching of gateway transactions against bank records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tax::rounding::format_paise;
use crate::types::*;

/// Lowest score a candidate needs to be accepted
pub const MIN_ACCEPT_SCORE: u8 = 70;

/// Aggregate figures for one matching run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub total_pg: usize,
    pub total_bank: usize,
    pub matched: usize,
    pub unmatched_pg: usize,
    pub unmatched_bank: usize,
    pub exceptions: usize,
    /// Matched PG transactions as a percentage of all PG transactions
    pub match_rate: f64,
    /// Sum of all PG amounts
    pub total_amount_paise: Paise,
    /// Sum of matched PG amounts
    pub reconciled_amount_paise: Paise,
    pub unmatched_pg_amount_paise: Paise,
    pub unmatched_bank_amount_paise: Paise,
}

/// Every result of a matching run plus its stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub results: Vec<MatchResult>,
    pub stats: MatchStats,
}

impl MatchSummary {
    /// Matched pairs with their confidence
    pub fn matched(&self) -> impl Iterator<Item = (&Transaction, &BankRecord, u8)> {
        self.results.iter().filter_map(|r| match r {
            MatchResult::Matched { pg, bank, confidence } => Some((pg, bank, *confidence)),
            _ => None,
        })
    }

    pub fn unmatched_pg(&self) -> impl Iterator<Item = (&Transaction, UnmatchedReason)> {
        self.results.iter().filter_map(|r| match r {
            MatchResult::UnmatchedPg { pg, reason } => Some((pg, *reason)),
            _ => None,
        })
    }

    pub fn unmatched_bank(&self) -> impl Iterator<Item = &BankRecord> {
        self.results.iter().filter_map(|r| match r {
            MatchResult::UnmatchedBank { bank, .. } => Some(bank),
            _ => None,
        })
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &MatchException> {
        self.results.iter().filter_map(|r| match r {
            MatchResult::Exception(e) => Some(e),
            _ => None,
        })
    }
}

/// Score a bank amount against a PG amount.
///
/// Returns 100 for an exact match, 90 within 1%, 70 within 5% and `None`
/// beyond that. Tolerances are relative to the PG amount and evaluated in
/// integer arithmetic, so exactly 1% scores 90 and exactly 5% scores 70.
pub fn score_amounts(pg_amount: Paise, bank_amount: Paise) -> Option<u8> {
    let pg = pg_amount as i128;
    let diff = (pg - bank_amount as i128).abs();

    if diff == 0 {
        return Some(100);
    }
    if pg <= 0 {
        return None;
    }

    if diff * 100 <= pg {
        Some(90)
    } else if diff * 100 <= pg * 5 {
        Some(70)
    } else {
        None
    }
}

/// Match gateway transactions against bank records.
///
/// Pure and deterministic: results follow PG input order, then unconsumed
/// bank records in input order.
pub fn match_records(pg_transactions: &[Transaction], bank_records: &[BankRecord]) -> MatchSummary {
    let mut bank_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in bank_records.iter().enumerate() {
        if let Some(utr) = record.normalized_utr() {
            bank_index.entry(utr).or_default().push(idx);
        }
    }

    let mut pg_utr_counts: HashMap<String, usize> = HashMap::new();
    for pg in pg_transactions {
        if let Some(utr) = pg.normalized_utr() {
            *pg_utr_counts.entry(utr).or_default() += 1;
        }
    }

    let mut consumed = vec![false; bank_records.len()];
    let mut results = Vec::new();

    for pg in pg_transactions {
        let utr = match pg.normalized_utr() {
            Some(utr) => utr,
            None => {
                results.push(MatchResult::Exception(MatchException {
                    exception_type: ExceptionType::MissingUtr,
                    severity: Severity::Critical,
                    pg: Some(pg.clone()),
                    bank: None,
                    message: format!("Transaction {} missing UTR", pg.id),
                }));
                continue;
            }
        };

        let shared_with = pg_utr_counts.get(&utr).copied().unwrap_or(0);
        if shared_with >= 2 {
            results.push(MatchResult::Exception(MatchException {
                exception_type: ExceptionType::DuplicateUtr,
                severity: Severity::High,
                pg: Some(pg.clone()),
                bank: None,
                message: format!(
                    "UTR {} appears on {} gateway transactions",
                    utr, shared_with
                ),
            }));
        }

        let candidates: Vec<usize> = bank_index
            .get(&utr)
            .map(|indices| indices.iter().copied().filter(|&i| !consumed[i]).collect())
            .unwrap_or_default();

        let mut best: Option<(usize, u8)> = None;
        for &idx in &candidates {
            let bank = &bank_records[idx];
            match score_amounts(pg.amount_paise, bank.amount_paise) {
                Some(score) => {
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((idx, score));
                    }
                }
                None => results.push(MatchResult::Exception(MatchException {
                    exception_type: ExceptionType::AmountMismatch,
                    severity: Severity::High,
                    pg: Some(pg.clone()),
                    bank: Some(bank.clone()),
                    message: format!(
                        "Amount mismatch for UTR {}: PG {} vs bank {}",
                        utr,
                        format_paise(pg.amount_paise),
                        format_paise(bank.amount_paise)
                    ),
                })),
            }
        }

        match best {
            Some((idx, score)) if score >= MIN_ACCEPT_SCORE => {
                consumed[idx] = true;
                results.push(MatchResult::Matched {
                    pg: pg.clone(),
                    bank: bank_records[idx].clone(),
                    confidence: score,
                });
            }
            _ => {
                let reason = if candidates.is_empty() {
                    UnmatchedReason::UtrNotFound
                } else {
                    UnmatchedReason::AmountMismatch
                };
                results.push(MatchResult::UnmatchedPg {
                    pg: pg.clone(),
                    reason,
                });
            }
        }
    }

    for (idx, record) in bank_records.iter().enumerate() {
        if !consumed[idx] {
            results.push(MatchResult::UnmatchedBank {
                bank: record.clone(),
                reason: UnmatchedReason::NoPgTxn,
            });
        }
    }

    let stats = compute_stats(pg_transactions, bank_records, &results);
    MatchSummary { results, stats }
}

fn compute_stats(
    pg_transactions: &[Transaction],
    bank_records: &[BankRecord],
    results: &[MatchResult],
) -> MatchStats {
    let mut stats = MatchStats {
        total_pg: pg_transactions.len(),
        total_bank: bank_records.len(),
        total_amount_paise: pg_transactions.iter().map(|t| t.amount_paise).sum(),
        ..MatchStats::default()
    };

    for result in results {
        match result {
            MatchResult::Matched { pg, .. } => {
                stats.matched += 1;
                stats.reconciled_amount_paise += pg.amount_paise;
            }
            MatchResult::UnmatchedPg { pg, .. } => {
                stats.unmatched_pg += 1;
                stats.unmatched_pg_amount_paise += pg.amount_paise;
            }
            MatchResult::UnmatchedBank { bank, .. } => {
                stats.unmatched_bank += 1;
                stats.unmatched_bank_amount_paise += bank.amount_paise;
            }
            MatchResult::Exception(_) => stats.exceptions += 1,
        }
    }

    stats.match_rate = if stats.total_pg == 0 {
        0.0
    } else {
        stats.matched as f64 / stats.total_pg as f64 * 100.0
    };

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pg(id: &str, utr: &str, amount: Paise) -> Transaction {
        Transaction::new(
            id.to_string(),
            "M001".to_string(),
            amount,
            "UPI".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .with_utr(utr)
    }

    #[test]
    fn test_score_thresholds() {
        let pg_amount = 1_000_000;
        assert_eq!(score_amounts(pg_amount, 1_000_000), Some(100));
        assert_eq!(score_amounts(pg_amount, 1_010_000), Some(90));
        assert_eq!(score_amounts(pg_amount, 990_000), Some(90));
        assert_eq!(score_amounts(pg_amount, 1_050_000), Some(70));
        assert_eq!(score_amounts(pg_amount, 1_050_001), None);
        assert_eq!(score_amounts(pg_amount, 949_999), None);
    }

    #[test]
    fn test_zero_pg_amount_only_matches_exactly() {
        assert_eq!(score_amounts(0, 0), Some(100));
        assert_eq!(score_amounts(0, 1), None);
    }

    #[test]
    fn test_exact_match() {
        let summary = match_records(&[pg("T1", "UTR1", 100_000)], &[BankRecord::new("UTR1", 100_000)]);

        let matched: Vec<_> = summary.matched().collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].2, 100);
        assert_eq!(summary.exceptions().count(), 0);
        assert_eq!(summary.stats.match_rate, 100.0);
        assert_eq!(summary.stats.reconciled_amount_paise, 100_000);
    }

    #[test]
    fn test_missing_utr_excluded() {
        let summary = match_records(&[pg("T1", "", 100_000)], &[]);

        let exceptions: Vec<_> = summary.exceptions().collect();
        assert_eq!(exceptions.len(), 1);
        assert_eq!(exceptions[0].exception_type, ExceptionType::MissingUtr);
        assert_eq!(exceptions[0].severity, Severity::Critical);
        assert_eq!(summary.stats.unmatched_pg, 0);
        assert_eq!(summary.stats.matched, 0);
    }

    #[test]
    fn test_utr_case_insensitive() {
        let summary = match_records(&[pg("T1", " utr9 ", 5_000)], &[BankRecord::new("UTR9", 5_000)]);
        assert_eq!(summary.stats.matched, 1);
    }

    #[test]
    fn test_best_candidate_wins_and_rejected_recorded() {
        let bank = vec![
            BankRecord::new("UTR1", 200_000),
            BankRecord::new("UTR1", 100_500),
            BankRecord::new("UTR1", 100_000),
        ];
        let summary = match_records(&[pg("T1", "UTR1", 100_000)], &bank);

        let matched: Vec<_> = summary.matched().collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].1.amount_paise, 100_000);
        assert_eq!(matched[0].2, 100);

        let mismatches = summary
            .exceptions()
            .filter(|e| e.exception_type == ExceptionType::AmountMismatch)
            .count();
        assert_eq!(mismatches, 1);
        // the two unconsumed records stay unmatched
        assert_eq!(summary.stats.unmatched_bank, 2);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let mut first = BankRecord::new("UTR1", 100_500);
        first.remarks = Some("first".to_string());
        let mut second = BankRecord::new("UTR1", 99_500);
        second.remarks = Some("second".to_string());

        let summary = match_records(&[pg("T1", "UTR1", 100_000)], &[first, second]);
        let matched: Vec<_> = summary.matched().collect();
        assert_eq!(matched[0].1.remarks.as_deref(), Some("first"));
    }

    #[test]
    fn test_bank_record_consumed_once() {
        let summary = match_records(
            &[pg("T1", "UTR1", 100_000), pg("T2", "UTR1", 100_000)],
            &[BankRecord::new("UTR1", 100_000)],
        );

        assert_eq!(summary.stats.matched, 1);
        let unmatched: Vec<_> = summary.unmatched_pg().collect();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].0.id, "T2");
        assert_eq!(unmatched[0].1, UnmatchedReason::UtrNotFound);

        let duplicates = summary
            .exceptions()
            .filter(|e| e.exception_type == ExceptionType::DuplicateUtr)
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn test_unmatched_reasons() {
        let summary = match_records(
            &[pg("T1", "UTR1", 100_000), pg("T2", "UTR2", 100_000)],
            &[BankRecord::new("UTR1", 300_000), BankRecord::new("UTR3", 10)],
        );

        let reasons: HashMap<String, UnmatchedReason> = summary
            .unmatched_pg()
            .map(|(t, r)| (t.id.clone(), r))
            .collect();
        assert_eq!(reasons["T1"], UnmatchedReason::AmountMismatch);
        assert_eq!(reasons["T2"], UnmatchedReason::UtrNotFound);
        assert_eq!(summary.unmatched_bank().count(), 2);
        assert_eq!(summary.stats.match_rate, 0.0);
    }

    #[test]
    fn test_conservation_and_determinism() {
        let pg_set = vec![
            pg("T1", "UTR1", 100_000),
            pg("T2", "", 50_000),
            pg("T3", "UTR3", 70_000),
            pg("T4", "UTR4", 10_000),
            pg("T5", "UTR1", 100_000),
        ];
        let bank_set = vec![
            BankRecord::new("UTR1", 100_000),
            BankRecord::new("UTR3", 69_500),
            BankRecord::new("UTR4", 20_000),
            BankRecord::new("", 1_000),
            BankRecord::new("UTR9", 5_000),
        ];

        let first = match_records(&pg_set, &bank_set);
        let second = match_records(&pg_set, &bank_set);
        assert_eq!(first, second);

        let missing = first
            .exceptions()
            .filter(|e| e.exception_type == ExceptionType::MissingUtr)
            .count();
        assert_eq!(first.stats.matched + first.stats.unmatched_pg + missing, pg_set.len());
        assert_eq!(first.stats.matched + first.stats.unmatched_bank, bank_set.len());
        assert_eq!(first.stats.match_rate, 40.0);
    }

    #[test]
    fn test_empty_input() {
        let summary = match_records(&[], &[]);
        assert!(summary.results.is_empty());
        assert_eq!(summary.stats.match_rate, 0.0);
    }
}
