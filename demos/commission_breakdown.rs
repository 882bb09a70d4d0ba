//! Commission, GST and reserve breakdown for a few transactions

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use settlement_core::{
    format_paise, utils::MemoryStorage, CommissionConfig, CommissionType, FeeBearerConfig,
    LedgerStorage, MerchantConfig, SettlementCalculator, Transaction,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Settlement Core - Commission Breakdown\n");

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
        .save_commission_config(&CommissionConfig::new(
            "M1",
            "CARD",
            BigDecimal::from(15),
            CommissionType::Fixed,
            BigDecimal::from(18),
        ))
        .await?;
    // Payer bears fees on card payments
    storage
        .save_fee_bearer_config(&FeeBearerConfig {
            merchant_id: "M1".to_string(),
            payment_mode_id: "1".to_string(),
            fee_bearer_code: "3".to_string(),
            is_active: true,
        })
        .await?;

    let calculator = SettlementCalculator::new(storage.clone());
    let merchant = calculator.merchant_config("M1").await?;
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("invalid date")?;

    let transactions = [
        Transaction::new("T1".to_string(), "M1".to_string(), 100_000, "UPI".to_string(), date),
        Transaction::new("T2".to_string(), "M1".to_string(), 250_000, "CARD".to_string(), date)
            .with_payment_mode_id("1"),
        Transaction::new("T3".to_string(), "M1".to_string(), 75_000, "NETBANKING".to_string(), date),
    ];

    for transaction in &transactions {
        let item = calculator.calculate_item(&merchant, transaction).await?;
        println!("{} ({})", item.transaction_id, item.payment_mode);
        println!("  Amount:     {}", format_paise(item.amount_paise));
        println!(
            "  Commission: {} ({} {})",
            format_paise(item.commission_paise),
            item.commission_rate,
            item.commission_type
        );
        println!(
            "  GST:        {} (CGST {} + SGST {})",
            format_paise(item.gst_paise),
            format_paise(item.cgst_paise),
            format_paise(item.sgst_paise)
        );
        println!("  Reserve:    {}", format_paise(item.reserve_paise));
        println!(
            "  Net:        {} (fee bearer {})\n",
            format_paise(item.net_paise),
            item.fee_bearer_code
        );
    }

    println!(
        "Resolutions using the default commission: {}",
        calculator.resolver().default_fallbacks()
    );
    Ok(())
}
