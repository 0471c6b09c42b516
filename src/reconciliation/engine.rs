//! Orchestrates the matching phases over both cross pairs

use tracing::{info, warn};
use uuid::Uuid;

use super::aggregate::clear_balanced_dates;
use super::exact::match_exact;
use super::report::*;
use super::window::match_within_window;
use crate::config::ReconcileConfig;
use crate::ledger::{cross_pair, split_by_direction, DroppedRecord, Normalizer, RawRecord};
use crate::traits::{LedgerSource, ResidualSink};
use crate::types::*;
use crate::utils::ledger_issues;

/// Runs exact, window and aggregate matching in sequence
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    config: ReconcileConfig,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self {
            config: ReconcileConfig::default(),
        }
    }
}

impl ReconciliationEngine {
    /// Create an engine with a validated configuration
    pub fn new(config: ReconcileConfig) -> ReconcileResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Run the three phases on one cross pair
    pub fn reconcile_pair(
        &self,
        credit_side: LedgerSide,
        debit_side: LedgerSide,
        pair: CrossPair,
    ) -> PairReport {
        let exact = match_exact(&pair);
        let exact_stats = PhaseStats::new(
            Phase::Exact,
            &pair,
            exact.matched_credit(),
            exact.matched_debit(),
            &exact.residual,
        );

        let window = match_within_window(
            &exact.residual,
            self.config.tolerance_days,
            self.config.window_policy,
        );
        let window_stats = PhaseStats::new(
            Phase::Window,
            &exact.residual,
            window.matched_credit(),
            window.matched_debit(),
            &window.residual,
        );

        let clearing = clear_balanced_dates(&window.residual);
        let clearing_stats = PhaseStats::new(
            Phase::Aggregate,
            &window.residual,
            clearing.matched_credit(),
            clearing.matched_debit(),
            &clearing.residual,
        );

        let discrepancies = date_discrepancies(&clearing.residual);
        let mut matches = exact.matches;
        matches.extend(window.matches);

        info!(
            "{} credit vs {} debit: {} credit and {} debit row(s) left unmatched",
            credit_side,
            debit_side,
            clearing.residual.credit.len(),
            clearing.residual.debit.len()
        );

        PairReport {
            credit_side,
            debit_side,
            stats: vec![exact_stats, window_stats, clearing_stats],
            matches,
            clearings: clearing.clearings,
            residual: clearing.residual,
            discrepancies,
        }
    }

    /// Reconcile two normalized ledgers
    pub fn reconcile(&self, first: &Ledger, second: &Ledger) -> ReconciliationReport {
        self.reconcile_with_dropped(first, second, Vec::new())
    }

    /// Normalize raw rows and reconcile them
    pub fn reconcile_records(
        &self,
        first: &[RawRecord],
        second: &[RawRecord],
    ) -> ReconciliationReport {
        let normalizer = Normalizer::from_config(&self.config);
        let first = normalizer.normalize(LedgerSide::First, first);
        let second = normalizer.normalize(LedgerSide::Second, second);

        let mut dropped = first.dropped;
        dropped.extend(second.dropped);
        if !dropped.is_empty() {
            warn!("{} row(s) dropped for unreadable dates", dropped.len());
        }

        self.reconcile_with_dropped(&first.ledger, &second.ledger, dropped)
    }

    fn reconcile_with_dropped(
        &self,
        first: &Ledger,
        second: &Ledger,
        dropped: Vec<DroppedRecord>,
    ) -> ReconciliationReport {
        info!(
            "Reconciling '{}' ({} rows) against '{}' ({} rows)",
            self.config.first_name,
            first.len(),
            self.config.second_name,
            second.len()
        );

        let mut issues = ledger_issues(first);
        issues.extend(ledger_issues(second));
        if !issues.is_empty() {
            warn!("{} malformed row(s) found in the input ledgers", issues.len());
        }

        let first_split = split_by_direction(first);
        let second_split = split_by_direction(second);

        let first_credit_pair = self.reconcile_pair(
            LedgerSide::First,
            LedgerSide::Second,
            cross_pair(&first_split, &second_split),
        );
        let second_credit_pair = self.reconcile_pair(
            LedgerSide::Second,
            LedgerSide::First,
            cross_pair(&second_split, &first_split),
        );

        ReconciliationReport {
            run_id: Uuid::new_v4(),
            generated_at: chrono::Utc::now().naive_utc(),
            config: self.config.clone(),
            totals: TotalsComparison::from_ledgers(first, second),
            dropped,
            issues,
            first_credit_pair,
            second_credit_pair,
        }
    }

    /// Load both ledgers, reconcile them and hand the report to `sink`.
    ///
    /// A ledger that fails to load aborts the run before anything is written.
    pub async fn run<S, K>(&self, source: &S, sink: &mut K) -> ReconcileResult<ReconciliationReport>
    where
        S: LedgerSource + ?Sized,
        K: ResidualSink + ?Sized,
    {
        let first = source.load_records(LedgerSide::First).await?;
        let second = source.load_records(LedgerSide::Second).await?;

        let report = self.reconcile_records(&first, &second);
        sink.write_report(&report).await?;

        info!(
            "Run {} finished: {} residual row(s)",
            report.run_id,
            report.residuals().len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryStore;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn amount(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    fn engine(tolerance_days: u32) -> ReconciliationEngine {
        ReconciliationEngine::new(ReconcileConfig {
            tolerance_days,
            ..ReconcileConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_phases_run_in_sequence() {
        let first = Ledger::new(
            LedgerSide::First,
            vec![
                Transaction::credit(LedgerSide::First, 0, day(2), amount("100")),
                Transaction::credit(LedgerSide::First, 1, day(3), amount("55")),
                Transaction::credit(LedgerSide::First, 2, day(9), amount("50")),
                Transaction::credit(LedgerSide::First, 3, day(9), amount("30")),
                Transaction::credit(LedgerSide::First, 4, day(20), amount("999")),
            ],
        );
        let second = Ledger::new(
            LedgerSide::Second,
            vec![
                Transaction::debit(LedgerSide::Second, 0, day(2), amount("100")),
                Transaction::debit(LedgerSide::Second, 1, day(5), amount("55")),
                Transaction::debit(LedgerSide::Second, 2, day(9), amount("80")),
            ],
        );

        let report = engine(2).reconcile(&first, &second);
        let pair = &report.first_credit_pair;

        assert_eq!(pair.stats[0].credit_matched, 1);
        assert_eq!(pair.stats[1].credit_matched, 1);
        assert_eq!(pair.stats[2].credit_matched, 2);
        assert_eq!(pair.stats[2].debit_matched, 1);
        assert_eq!(pair.clearings.len(), 1);

        let residuals = report.residuals();
        assert_eq!(residuals.first_credit.len(), 1);
        assert_eq!(residuals.first_credit[0].origin_index, 4);
        assert!(residuals.second_debit.is_empty());
        assert!(report.is_conserved());
        assert_eq!(pair.discrepancies.len(), 1);
        assert_eq!(pair.discrepancies[0].difference, amount("999"));
    }

    #[test]
    fn test_mirror_pair_scans_second_ledger_credits() {
        let first = Ledger::new(
            LedgerSide::First,
            vec![Transaction::debit(LedgerSide::First, 0, day(4), amount("12.5"))],
        );
        let second = Ledger::new(
            LedgerSide::Second,
            vec![Transaction::credit(LedgerSide::Second, 0, day(4), amount("12.50"))],
        );

        let report = engine(0).reconcile(&first, &second);

        assert_eq!(report.second_credit_pair.credit_side, LedgerSide::Second);
        assert_eq!(report.second_credit_pair.matches.len(), 1);
        assert_eq!(report.second_credit_pair.matches[0].kind, MatchKind::Exact);
        assert!(report.is_fully_reconciled());
    }

    #[test]
    fn test_empty_ledgers_reconcile_to_nothing() {
        let report = engine(4).reconcile(
            &Ledger::empty(LedgerSide::First),
            &Ledger::empty(LedgerSide::Second),
        );
        assert!(report.residuals().is_empty());
        assert!(report.first_credit_pair.matches.is_empty());
        assert!(report.is_conserved());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ReconcileConfig {
            first_name: String::new(),
            ..ReconcileConfig::default()
        };
        assert!(ReconciliationEngine::new(config).is_err());
    }

    #[tokio::test]
    async fn test_run_surfaces_load_failure() {
        let source = MemoryStore::new();
        source
            .insert_records(LedgerSide::First, vec![RawRecord::new("01/01/2024", "5", "")])
            .unwrap();
        let mut sink = MemoryStore::new();

        let result = engine(4).run(&source, &mut sink).await;

        assert!(matches!(
            result,
            Err(ReconcileError::LedgerLoad {
                side: LedgerSide::Second,
                ..
            })
        ));
        assert!(sink.last_report().unwrap().is_none());
    }
}
