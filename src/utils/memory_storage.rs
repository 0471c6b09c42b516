//! In-memory source and sink implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ledger::RawRecord;
use crate::reconciliation::ReconciliationReport;
use crate::traits::*;
use crate::types::*;

/// In-memory ledger rows and report storage for testing and embedding
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<LedgerSide, Vec<RawRecord>>>>,
    reports: Arc<RwLock<Vec<ReconciliationReport>>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            reports: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Replace the rows of one ledger
    pub fn insert_records(&self, side: LedgerSide, records: Vec<RawRecord>) -> ReconcileResult<()> {
        self.records
            .write()
            .map_err(|e| ReconcileError::Storage(e.to_string()))?
            .insert(side, records);
        Ok(())
    }

    /// Most recently written report, if any
    pub fn last_report(&self) -> ReconcileResult<Option<ReconciliationReport>> {
        Ok(self
            .reports
            .read()
            .map_err(|e| ReconcileError::Storage(e.to_string()))?
            .last()
            .cloned())
    }

    /// Number of reports written so far
    pub fn report_count(&self) -> ReconcileResult<usize> {
        Ok(self
            .reports
            .read()
            .map_err(|e| ReconcileError::Storage(e.to_string()))?
            .len())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconcileResult<()> {
        self.records
            .write()
            .map_err(|e| ReconcileError::Storage(e.to_string()))?
            .clear();
        self.reports
            .write()
            .map_err(|e| ReconcileError::Storage(e.to_string()))?
            .clear();
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerSource for MemoryStore {
    async fn load_records(&self, side: LedgerSide) -> ReconcileResult<Vec<RawRecord>> {
        self.records
            .read()
            .map_err(|e| ReconcileError::Storage(e.to_string()))?
            .get(&side)
            .cloned()
            .ok_or_else(|| ReconcileError::LedgerLoad {
                side,
                reason: "no rows were provided for this ledger".to_string(),
            })
    }
}

#[async_trait]
impl ResidualSink for MemoryStore {
    async fn write_report(&mut self, report: &ReconciliationReport) -> ReconcileResult<()> {
        self.reports
            .write()
            .map_err(|e| ReconcileError::Storage(e.to_string()))?
            .push(report.clone());
        Ok(())
    }
}
