//! CSV ledger source and residual sink

use async_trait::async_trait;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::config::ReconcileConfig;
use crate::ledger::{DroppedRecord, RawRecord};
use crate::reconciliation::{DateDiscrepancy, PhaseStats, ReconciliationReport, TotalsComparison};
use crate::traits::*;
use crate::types::*;

/// Zero-based column positions of the six fields in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub description: usize,
    pub date: usize,
    pub voucher_number: usize,
    pub voucher: usize,
    pub credit: usize,
    pub debit: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            description: 27,
            date: 28,
            voucher_number: 29,
            voucher: 30,
            credit: 32,
            debit: 33,
        }
    }
}

impl fmt::Display for ColumnLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.description, self.date, self.voucher_number, self.voucher, self.credit, self.debit
        )
    }
}

/// Six comma-separated positions in field order:
/// description, date, voucher number, voucher, credit, debit
impl FromStr for ColumnLayout {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let positions = s
            .split(',')
            .map(|cell| cell.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReconcileError::Config(format!("invalid column layout '{}': {}", s, e)))?;

        match positions[..] {
            [description, date, voucher_number, voucher, credit, debit] => Ok(Self {
                description,
                date,
                voucher_number,
                voucher,
                credit,
                debit,
            }),
            _ => Err(ReconcileError::Config(format!(
                "column layout '{}' must list 6 positions, got {}",
                s,
                positions.len()
            ))),
        }
    }
}

impl ColumnLayout {
    /// Pick the six fields out of a row; cells past the end read as empty
    pub fn extract(&self, row: &StringRecord) -> RawRecord {
        let cell = |position: usize| row.get(position).unwrap_or("").to_string();
        RawRecord {
            description: cell(self.description),
            date: cell(self.date),
            voucher_number: cell(self.voucher_number),
            voucher: cell(self.voucher),
            credit: cell(self.credit),
            debit: cell(self.debit),
        }
    }
}

/// Reads each ledger from its own delimited file
#[derive(Debug, Clone)]
pub struct CsvLedgerSource {
    first: PathBuf,
    second: PathBuf,
    first_layout: ColumnLayout,
    second_layout: ColumnLayout,
    has_headers: bool,
}

impl CsvLedgerSource {
    /// Headerless files, both using the default column layout
    pub fn new(first: impl Into<PathBuf>, second: impl Into<PathBuf>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            first_layout: ColumnLayout::default(),
            second_layout: ColumnLayout::default(),
            has_headers: false,
        }
    }

    /// Column positions of one ledger's file
    pub fn with_layout(mut self, side: LedgerSide, layout: ColumnLayout) -> Self {
        match side {
            LedgerSide::First => self.first_layout = layout,
            LedgerSide::Second => self.second_layout = layout,
        }
        self
    }

    pub fn layout(&self, side: LedgerSide) -> &ColumnLayout {
        match side {
            LedgerSide::First => &self.first_layout,
            LedgerSide::Second => &self.second_layout,
        }
    }

    /// Skip the first row of each file
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn path(&self, side: LedgerSide) -> &Path {
        match side {
            LedgerSide::First => &self.first,
            LedgerSide::Second => &self.second,
        }
    }

    fn read(&self, side: LedgerSide) -> Result<Vec<RawRecord>, String> {
        let path = self.path(side);
        let layout = self.layout(side);
        let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .from_reader(file);

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| format!("{}: {}", path.display(), e))?;
            records.push(layout.extract(&row));
        }

        info!(
            "Loaded {} row(s) for {} ledger from {:?}",
            records.len(),
            side,
            path
        );
        Ok(records)
    }
}

#[async_trait]
impl LedgerSource for CsvLedgerSource {
    async fn load_records(&self, side: LedgerSide) -> ReconcileResult<Vec<RawRecord>> {
        self.read(side)
            .map_err(|reason| ReconcileError::LedgerLoad { side, reason })
    }
}

const RESIDUAL_HEADER: [&str; 7] = [
    "description",
    "date",
    "voucher_number",
    "voucher",
    "credit",
    "debit",
    "origin_index",
];

/// One residual row as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualRow {
    pub description: String,
    pub date: String,
    pub voucher_number: String,
    pub voucher: String,
    pub credit: String,
    pub debit: String,
    pub origin_index: usize,
}

impl ResidualRow {
    pub fn from_transaction(transaction: &Transaction, date_format: &str) -> Self {
        Self {
            description: transaction.reference.description.clone(),
            date: transaction.date.format(date_format).to_string(),
            voucher_number: transaction.reference.voucher_number.clone(),
            voucher: transaction.reference.voucher.clone(),
            credit: transaction.amount_credit.to_string(),
            debit: transaction.amount_debit.to_string(),
            origin_index: transaction.origin_index,
        }
    }
}

/// Run summary written next to the residual files
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    run_id: Uuid,
    generated_at: NaiveDateTime,
    config: &'a ReconcileConfig,
    totals: &'a TotalsComparison,
    credits_balance: bool,
    debits_balance: bool,
    dropped: &'a [DroppedRecord],
    pairs: Vec<PairSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct PairSummary<'a> {
    credit_ledger: &'a str,
    debit_ledger: &'a str,
    stats: &'a [PhaseStats],
    cleared_dates: usize,
    discrepancies: &'a [DateDiscrepancy],
}

/// Writes the four residual sets as CSV files plus a JSON summary
#[derive(Debug, Clone)]
pub struct CsvResidualSink {
    output_dir: PathBuf,
}

impl CsvResidualSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// File holding the unmatched rows of one ledger in one direction
    pub fn residual_path(&self, ledger_name: &str, direction: Direction) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}_unmatched.csv", ledger_name, direction))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join("summary.json")
    }

    fn write_rows(
        &self,
        path: &Path,
        rows: &[Transaction],
        date_format: &str,
    ) -> ReconcileResult<()> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        if rows.is_empty() {
            writer.write_record(RESIDUAL_HEADER)?;
        }
        for transaction in rows {
            writer.serialize(ResidualRow::from_transaction(transaction, date_format))?;
        }
        writer.flush()?;
        info!("Wrote {} residual row(s) to {:?}", rows.len(), path);
        Ok(())
    }

    fn write_summary(&self, report: &ReconciliationReport) -> ReconcileResult<()> {
        let pairs = report
            .pairs()
            .into_iter()
            .map(|pair| PairSummary {
                credit_ledger: report.config.name_of(pair.credit_side),
                debit_ledger: report.config.name_of(pair.debit_side),
                stats: &pair.stats,
                cleared_dates: pair.clearings.len(),
                discrepancies: &pair.discrepancies,
            })
            .collect();

        let summary = RunSummary {
            run_id: report.run_id,
            generated_at: report.generated_at,
            config: &report.config,
            totals: &report.totals,
            credits_balance: report.totals.credits_balance(),
            debits_balance: report.totals.debits_balance(),
            dropped: &report.dropped,
            pairs,
        };

        fs::write(self.summary_path(), serde_json::to_string_pretty(&summary)?)?;
        Ok(())
    }
}

#[async_trait]
impl ResidualSink for CsvResidualSink {
    async fn write_report(&mut self, report: &ReconciliationReport) -> ReconcileResult<()> {
        fs::create_dir_all(&self.output_dir)?;

        let residuals = report.residuals();
        let date_format = &report.config.date_format;
        for side in [LedgerSide::First, LedgerSide::Second] {
            for direction in [Direction::Credit, Direction::Debit] {
                let path = self.residual_path(report.config.name_of(side), direction);
                self.write_rows(&path, residuals.get(side, direction), date_format)?;
            }
        }

        self.write_summary(report)?;
        info!("Run {} written to {:?}", report.run_id, self.output_dir);
        Ok(())
    }
}
