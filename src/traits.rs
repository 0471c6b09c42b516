//! Traits for the input and output collaborators of the pipeline

use async_trait::async_trait;

use crate::ledger::RawRecord;
use crate::reconciliation::ReconciliationReport;
use crate::types::*;

/// Where ledger rows come from
///
/// Implementations hand back every row of a ledger in source order. A ledger
/// that cannot be read is an error ([`ReconcileError::LedgerLoad`]), never an
/// empty result.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Load all rows of one ledger
    async fn load_records(&self, side: LedgerSide) -> ReconcileResult<Vec<RawRecord>>;
}

/// Where the residual report goes
#[async_trait]
pub trait ResidualSink: Send + Sync {
    /// Persist the four residual sets and their summary
    async fn write_report(&mut self, report: &ReconciliationReport) -> ReconcileResult<()>;
}
