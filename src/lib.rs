//! # Settlement Core
//!
//! Payment gateway to bank reconciliation and merchant settlement for Indian
//! payment flows.
//!
//! ## Features
//!
//! - **Reconciliation**: UTR and amount matching of PG transactions against bank statements
//! - **Commission**: Tiered commission resolution with GST and fee-bearer handling
//! - **Settlement batches**: Per merchant, per cycle date, with rolling reserve holds
//! - **Settlement queue**: Batching of reconciled transactions by size or age
//! - **Scheduler**: Daily, weekly, monthly and on-demand settlement runs
//! - **Storage abstraction**: Database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use settlement_core::{match_records, BankRecord, Transaction};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let pg = vec![
//!     Transaction::new("T1".to_string(), "M1".to_string(), 100_000, "UPI".to_string(), date)
//!         .with_utr("UTR123"),
//! ];
//! let bank = vec![BankRecord::new("utr123", 100_000)];
//!
//! let summary = match_records(&pg, &bank);
//! assert_eq!(summary.stats.matched, 1);
//! ```

pub mod config;
pub mod engine;
pub mod pipeline;
pub mod reconciliation;
pub mod settlement;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use engine::*;
pub use pipeline::*;
pub use reconciliation::*;
pub use settlement::*;
pub use tax::*;
pub use traits::*;
pub use types::*;
