//! PG-to-bank reconciliation
//!
//! Bank statement rows are mapped into [`BankRecord`](crate::types::BankRecord)s
//! by a [`schema::BankSchemaMapping`], matched against captured PG
//! transactions by UTR and amount, and persisted by a job runner that queues
//! matched transactions for settlement.

pub mod job;
pub mod matcher;
pub mod schema;

pub use job::*;
pub use matcher::*;
pub use schema::*;
