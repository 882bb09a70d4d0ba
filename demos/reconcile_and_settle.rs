//! Reconcile a day's gateway export against a bank statement and settle it
//!
//! Run with `RUST_LOG=settlement_core=debug` for the engine's own logs.

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, Utc};
use settlement_core::{
    format_paise,
    utils::{MemoryJobStore, MemoryStorage},
    BankSchemaMapping, BatchOutcome, CommissionConfig, CommissionType, EngineConfig, JobParams,
    LedgerStorage, MerchantConfig, MerchantSettlementProfile, PgSchemaMapping, RawRow,
    SettlementEngine,
};
use tracing_subscriber::EnvFilter;

fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Settlement Core - Reconcile and Settle\n");

    let storage = MemoryStorage::new();
    storage
        .save_merchant(&MerchantConfig::new("M1", "Acme Retail").with_rolling_reserve(BigDecimal::from(5), 30))
        .await?;
    storage
        .save_commission_config(&CommissionConfig::new(
            "M1",
            "UPI",
            BigDecimal::from(2),
            CommissionType::Percentage,
            BigDecimal::from(18),
        ))
        .await?;
    storage
        .save_settlement_profile(&MerchantSettlementProfile::daily("M1"))
        .await?;

    let config = EngineConfig::from_env();
    let engine = SettlementEngine::with_config(
        storage,
        MemoryJobStore::with_log_capacity(config.recon.job_log_capacity),
        &config,
    );
    let cycle_date = NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("invalid date")?;

    let skipped = engine
        .ingest_pg_rows(
            &PgSchemaMapping::standard_pg(),
            &[
                row(&[("txn_id", "T1"), ("merchant_id", "M1"), ("utr", "UTR1001"), ("amount", "1000.00"), ("date", "2024-03-01")]),
                row(&[("txn_id", "T2"), ("merchant_id", "M1"), ("utr", "UTR1002"), ("amount", "499.00"), ("date", "2024-03-01")]),
                row(&[("txn_id", "T3"), ("merchant_id", "M1"), ("utr", "UTR1003"), ("amount", "250.00"), ("date", "2024-03-01")]),
                row(&[("txn_id", "T4"), ("merchant_id", "M1"), ("utr", ""), ("amount", "75.00"), ("date", "2024-03-01")]),
            ],
        )
        .await?;
    println!("Gateway rows skipped: {}", skipped.len());

    engine
        .ingest_bank_statement(
            cycle_date,
            &BankSchemaMapping::axis_bank(),
            &[
                row(&[("UTR Number", "utr1001"), ("Amount", "1,000.00"), ("Transaction Date", "01/03/2024")]),
                row(&[("UTR Number", "UTR1002"), ("Amount", "500.00"), ("Transaction Date", "01/03/2024")]),
                row(&[("UTR Number", "UTR9999"), ("Amount", "120.00"), ("Transaction Date", "01/03/2024")]),
            ],
        )
        .await?;

    let outcome = engine
        .reconcile(cycle_date + Duration::days(1), JobParams { cycle_date, dry_run: false })
        .await?;
    let stats = &outcome.summary.stats;
    println!("\nReconciliation {}", outcome.job.id);
    println!("  Matched:        {}", stats.matched);
    println!("  Unmatched PG:   {}", stats.unmatched_pg);
    println!("  Unmatched bank: {}", stats.unmatched_bank);
    println!("  Exceptions:     {}", stats.exceptions);
    println!("  Match rate:     {:.1}%", stats.match_rate);
    for (pg, bank, confidence) in outcome.summary.matched() {
        println!("    {} <-> {} ({}%)", pg.id, bank.utr, confidence);
    }

    let later = Utc::now().naive_utc() + config.queue.batch_window() + Duration::minutes(1);
    for result in engine.process_queue(later).await? {
        if let BatchOutcome::Settled { batch_id, transactions, net_paise, status, .. } = result {
            println!(
                "\nBatch {}: {} transactions, net {} ({:?})",
                batch_id,
                transactions,
                format_paise(net_paise),
                status
            );
        }
    }

    for entry in engine.list_reserve_entries("M1").await? {
        println!(
            "Reserve held: {} until {}",
            format_paise(entry.reserve_amount_paise),
            entry.release_date
        );
    }

    let counts = engine.pipeline_counts(cycle_date, cycle_date).await?;
    println!(
        "\nPipeline: captured {} / in settlement {} / unsettled {}",
        counts.captured.count, counts.in_settlement.count, counts.unsettled.count
    );
    Ok(())
}
