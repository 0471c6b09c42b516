//! # Ledger Reconcile
//!
//! Reconciles two independently kept ledgers that record the same transfers
//! from opposite sides, and isolates the rows a reviewer has to look at.
//!
//! ## Features
//!
//! - **Exact matching**: same date, same amount, one-to-one
//! - **Tolerance window matching**: same amount within a configurable number of days
//! - **Aggregate balance clearing**: whole dates whose totals cancel out across ledgers
//! - **Residual reporting**: four unmatched sets plus totals and per-date gaps
//! - **Collaborator abstraction**: trait-based ledger sources and residual sinks,
//!   with CSV and in-memory implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_reconcile::{Ledger, LedgerSide, ReconciliationEngine, Transaction};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
//! let first = Ledger::new(
//!     LedgerSide::First,
//!     vec![Transaction::credit(LedgerSide::First, 0, date, BigDecimal::from(100))],
//! );
//! let second = Ledger::new(
//!     LedgerSide::Second,
//!     vec![Transaction::debit(LedgerSide::Second, 0, date, BigDecimal::from(100))],
//! );
//!
//! let report = ReconciliationEngine::default().reconcile(&first, &second);
//! assert!(report.is_fully_reconciled());
//! ```

pub mod config;
pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
