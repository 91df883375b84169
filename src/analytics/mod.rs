//! Read-only analytics over the transaction ledger.
//!
//! Every entry point re-reads the matching rows into a [`ledger::LedgerView`]
//! and computes in memory; nothing here caches or mutates stored data.
//! Computation lives in pure functions over the view so it can be tested
//! without a database; the thin async wrappers do the reads.

pub mod advisor;
pub mod alerts;
pub mod anomalies;
pub mod ledger;
pub mod patterns;
pub mod trends;

pub use advisor::savings_opportunities;
pub use alerts::budget_alerts;
pub use anomalies::unusual_transactions;
pub use ledger::{read_ledger, LedgerRow, LedgerView};
