//! Integration tests for settlement-core

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, Utc};
use settlement_core::{
    match_records,
    utils::{MemoryJobStore, MemoryStorage},
    BankRecord, BankSchemaMapping, BatchOutcome, BatchStatus, CommissionConfig, CommissionResolver,
    CommissionType, ExceptionType, JobParams, LedgerStorage, MatchResult, MerchantConfig,
    MerchantSettlementProfile, PgSchemaMapping, QueueStatus, RawRow, ReserveStatus,
    ResolutionSource, RunOptions, RunStatus, SettlementEngine, SettlementQueueEntry, Transaction,
    TransactionStatus, TriggerType,
};
use std::str::FromStr;

fn cycle() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn pg(id: &str, utr: &str, amount: i64) -> Transaction {
    Transaction::new(id.to_string(), "M1".to_string(), amount, "UPI".to_string(), cycle()).with_utr(utr)
}

async fn onboard_merchant(storage: &MemoryStorage) {
    storage
        .save_merchant(&MerchantConfig::new("M1", "Acme Retail").with_rolling_reserve(dec("5"), 30))
        .await
        .unwrap();
    storage
        .save_commission_config(&CommissionConfig::new(
            "M1",
            "UPI",
            dec("2"),
            CommissionType::Percentage,
            dec("18"),
        ))
        .await
        .unwrap();
    storage
        .save_settlement_profile(&MerchantSettlementProfile::daily("M1"))
        .await
        .unwrap();
}

#[test]
fn test_exact_match_scenario() {
    let summary = match_records(&[pg("T1", "UTR1", 100_000)], &[BankRecord::new("UTR1", 100_000)]);

    let matched: Vec<_> = summary.matched().collect();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].2, 100);
    assert_eq!(summary.stats.exceptions, 0);
    assert_eq!(summary.stats.match_rate, 100.0);
}

#[test]
fn test_missing_utr_scenario() {
    let summary = match_records(&[pg("T1", "", 100_000)], &[]);

    assert_eq!(summary.results.len(), 1);
    match &summary.results[0] {
        MatchResult::Exception(e) => assert_eq!(e.exception_type, ExceptionType::MissingUtr),
        other => panic!("expected exception, got {:?}", other),
    }
    assert_eq!(summary.stats.unmatched_pg, 0);
}

#[tokio::test]
async fn test_statement_to_settlement_workflow() {
    let storage = MemoryStorage::new();
    onboard_merchant(&storage).await;
    let engine = SettlementEngine::new(storage.clone(), MemoryJobStore::new());

    // Ingest the gateway export and the bank statement
    let skipped = engine
        .ingest_pg_rows(
            &PgSchemaMapping::standard_pg(),
            &[
                row(&[
                    ("Transaction ID", "T1"),
                    ("Merchant ID", "M1"),
                    ("UTR", "UTR1"),
                    ("Amount", "1000.00"),
                    ("Date", "2024-03-01"),
                ]),
                row(&[
                    ("Transaction ID", "T2"),
                    ("Merchant ID", "M1"),
                    ("UTR", ""),
                    ("Amount", "250.00"),
                    ("Date", "2024-03-01"),
                ]),
                row(&[("Transaction ID", "T3"), ("Amount", "10.00")]),
            ],
        )
        .await
        .unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].row_index, 2);

    let records = engine
        .ingest_bank_statement(
            cycle(),
            &BankSchemaMapping::axis_bank(),
            &[row(&[
                ("UTR Number", " utr1 "),
                ("Amount", "1,000.00"),
                ("Transaction Date", "01/03/2024"),
            ])],
        )
        .await
        .unwrap();
    assert_eq!(records, 1);

    // Reconcile the cycle
    let outcome = engine
        .reconcile(cycle() + Duration::days(1), JobParams { cycle_date: cycle(), dry_run: false })
        .await
        .unwrap();
    assert_eq!(outcome.job.counters.matched, 1);
    assert_eq!(outcome.job.counters.exceptions, 1);
    assert_eq!(outcome.queued, 1);

    // The queue settles once the batch window has passed
    let later = Utc::now().naive_utc() + Duration::minutes(10);
    let outcomes = engine.process_queue(later).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    let batch_id = match &outcomes[0] {
        BatchOutcome::Settled {
            batch_id,
            transactions,
            net_paise,
            status,
            ..
        } => {
            assert_eq!(*transactions, 1);
            assert_eq!(*net_paise, 92_758);
            assert_eq!(*status, Some(BatchStatus::Approved));
            *batch_id
        }
        other => panic!("expected settled batch, got {:?}", other),
    };

    let batch = storage.get_batch(batch_id).await.unwrap().unwrap();
    assert_eq!(batch.gross_amount_paise, 100_000);
    assert_eq!(batch.total_commission_paise, 2_000);
    assert_eq!(batch.total_gst_paise, 360);
    assert_eq!(batch.total_reserve_paise, 4_882);
    assert!(batch.verify_totals().is_ok());

    let t1 = storage.get_transaction("T1").await.unwrap().unwrap();
    assert_eq!(t1.status, TransactionStatus::Settled);
    assert_eq!(t1.settlement_batch_id, Some(batch_id));
    let t2 = storage.get_transaction("T2").await.unwrap().unwrap();
    assert_eq!(t2.status, TransactionStatus::Captured);

    let reserves = engine.list_reserve_entries("M1").await.unwrap();
    assert_eq!(reserves.len(), 1);
    assert_eq!(reserves[0].reserve_amount_paise, 4_882);
    assert_eq!(reserves[0].status, ReserveStatus::Held);

    let processed = storage
        .list_queue_entries(Some(QueueStatus::Processed))
        .await
        .unwrap();
    assert_eq!(processed.len(), 1);

    let counts = engine.pipeline_counts(cycle(), cycle()).await.unwrap();
    assert_eq!(counts.captured.count, 2);
    assert_eq!(counts.in_settlement.count, 1);
    assert_eq!(counts.unsettled.amount_paise, 25_000);

    // Nothing left for the scheduler
    let run = engine
        .run_settlement(cycle() + Duration::days(1), TriggerType::Manual, "ops", &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.batches_created, 0);
}

#[tokio::test]
async fn test_scheduler_is_idempotent_per_cycle_date() {
    let storage = MemoryStorage::new();
    onboard_merchant(&storage).await;
    for t in [pg("T1", "UTR1", 100_000), pg("T2", "UTR2", 50_000)] {
        storage
            .save_transaction(&t.with_status(TransactionStatus::Reconciled))
            .await
            .unwrap();
    }
    let engine = SettlementEngine::new(storage.clone(), MemoryJobStore::new());
    let today = cycle() + Duration::days(1);

    let first = engine
        .run_settlement(today, TriggerType::Cron, "system", &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(first.batches_created, 1);

    // A late transaction for the same date cannot open a second batch
    storage
        .save_transaction(&pg("T3", "UTR3", 10_000).with_status(TransactionStatus::Reconciled))
        .await
        .unwrap();
    let second = engine
        .run_settlement(today, TriggerType::Cron, "system", &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(second.batches_created, 0);
    assert_eq!(second.status, RunStatus::Partial);
    assert_eq!(second.error_details[0].detail.code, "DUPLICATE_BATCH");

    assert_eq!(engine.list_batches(Some("M1")).await.unwrap().len(), 1);
    let t3 = storage.get_transaction("T3").await.unwrap().unwrap();
    assert!(t3.settlement_batch_id.is_none());
}

#[tokio::test]
async fn test_commission_falls_back_to_payment_mode_row() {
    let storage = MemoryStorage::new();
    storage
        .save_commission_config(
            &CommissionConfig::new("M1", "UPI", dec("1.5"), CommissionType::Percentage, dec("18"))
                .for_bank("HDFC"),
        )
        .await
        .unwrap();
    storage
        .save_commission_config(&CommissionConfig::new(
            "M1",
            "UPI",
            dec("1.8"),
            CommissionType::Percentage,
            dec("18"),
        ))
        .await
        .unwrap();

    let resolver = CommissionResolver::new(storage.clone());
    let exact = resolver.resolve("M1", "UPI", Some("HDFC")).await.unwrap();
    assert_eq!(exact.source, ResolutionSource::Exact);
    assert_eq!(exact.value, dec("1.5"));

    // Without an exact row the (merchant, mode) row applies, not the default
    let other_bank = resolver.resolve("M1", "UPI", Some("ICICI")).await.unwrap();
    assert_eq!(other_bank.source, ResolutionSource::PaymentMode);
    assert_eq!(other_bank.value, dec("1.8"));
    assert_eq!(resolver.default_fallbacks(), 0);

    let unknown = resolver.resolve("M9", "CARD", None).await.unwrap();
    assert_eq!(unknown.source, ResolutionSource::Default);
    assert_eq!(resolver.default_fallbacks(), 1);
}

#[tokio::test]
async fn test_concurrent_claims_have_one_winner() {
    let storage = MemoryStorage::new();
    let t = pg("T1", "UTR1", 100_000).with_status(TransactionStatus::Reconciled);
    storage.save_transaction(&t).await.unwrap();
    let entry = SettlementQueueEntry::pending(&t, Utc::now().naive_utc());
    storage.enqueue_settlement(&entry).await.unwrap();

    let ids = vec![entry.id];
    let now = Utc::now().naive_utc();
    let (a, b) = (storage.clone(), storage.clone());
    let (ids_a, ids_b) = (ids.clone(), ids.clone());
    let first = tokio::spawn(async move { a.claim_queue_entries(&ids_a, now).await.unwrap() });
    let second = tokio::spawn(async move { b.claim_queue_entries(&ids_b, now).await.unwrap() });

    let claimed = [first.await.unwrap().len(), second.await.unwrap().len()];
    assert_eq!(claimed.iter().sum::<usize>(), 1);
    assert!(claimed.contains(&0));

    let processing = storage
        .list_queue_entries(Some(QueueStatus::Processing))
        .await
        .unwrap();
    assert_eq!(processing.len(), 1);
}

#[tokio::test]
async fn test_weekly_merchant_waits_for_its_day() {
    let storage = MemoryStorage::new();
    onboard_merchant(&storage).await;
    let mut weekly = MerchantSettlementProfile::daily("M1");
    weekly.frequency = settlement_core::SettlementFrequency::Weekly;
    // Friday
    weekly.settlement_day = Some(5);
    storage.save_settlement_profile(&weekly).await.unwrap();
    storage
        .save_transaction(&pg("T1", "UTR1", 100_000).with_status(TransactionStatus::Reconciled))
        .await
        .unwrap();
    let engine = SettlementEngine::new(storage.clone(), MemoryJobStore::new());

    // 2024-03-07 is a Thursday, 2024-03-08 a Friday
    let thursday = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    let run = engine
        .run_settlement(thursday, TriggerType::Cron, "system", &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(run.merchants_processed, 0);

    let run = engine
        .run_settlement(thursday + Duration::days(1), TriggerType::Cron, "system", &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(run.merchants_processed, 1);
    assert_eq!(run.batches_created, 1);
}
