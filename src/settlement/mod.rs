//! Settlement batches, commission, reserves and payouts

pub mod calculator;
pub mod commission;
pub mod queue;
pub mod scheduler;
pub mod transfer;

pub use calculator::*;
pub use commission::*;
pub use queue::*;
pub use scheduler::*;
pub use transfer::*;
