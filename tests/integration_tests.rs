//! Integration tests for ledger-reconcile

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use ledger_reconcile::{
    clear_balanced_dates, match_exact, match_within_window, split_by_direction,
    utils::MemoryStore, CrossPair, Direction, Ledger, LedgerSide, MatchKind, Normalizer,
    RawRecord, ReconcileConfig, ReconcileError, ReconciliationEngine, Transaction, WindowPolicy,
};
use std::collections::HashSet;
use std::str::FromStr;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn amount(text: &str) -> BigDecimal {
    BigDecimal::from_str(text).unwrap()
}

fn engine_with(tolerance_days: u32, window_policy: WindowPolicy) -> ReconciliationEngine {
    ReconciliationEngine::new(ReconcileConfig {
        first_name: "bank".to_string(),
        second_name: "books".to_string(),
        tolerance_days,
        window_policy,
        ..ReconcileConfig::default()
    })
    .unwrap()
}

fn keys(transactions: &[Transaction]) -> HashSet<(LedgerSide, usize)> {
    transactions.iter().map(Transaction::key).collect()
}

#[test]
fn test_one_day_shift_needs_tolerance() {
    let first = Ledger::new(
        LedgerSide::First,
        vec![Transaction::credit(LedgerSide::First, 0, date(2024, 1, 5), amount("100.00"))],
    );
    let second = Ledger::new(
        LedgerSide::Second,
        vec![Transaction::debit(LedgerSide::Second, 0, date(2024, 1, 6), amount("100.00"))],
    );

    let strict = engine_with(0, WindowPolicy::Sweep).reconcile(&first, &second);
    assert_eq!(strict.residuals().first_credit.len(), 1);
    assert_eq!(strict.residuals().second_debit.len(), 1);

    let loose = engine_with(1, WindowPolicy::Sweep).reconcile(&first, &second);
    assert!(loose.is_fully_reconciled());
    assert_eq!(
        loose.first_credit_pair.matches[0].kind,
        MatchKind::Window { tolerance_days: 1 }
    );
}

#[test]
fn test_split_payment_cleared_by_date_totals() {
    let first = Ledger::new(
        LedgerSide::First,
        vec![
            Transaction::credit(LedgerSide::First, 0, date(2024, 2, 1), amount("50.00")),
            Transaction::credit(LedgerSide::First, 1, date(2024, 2, 1), amount("30.00")),
        ],
    );
    let second = Ledger::new(
        LedgerSide::Second,
        vec![Transaction::debit(LedgerSide::Second, 0, date(2024, 2, 1), amount("80.00"))],
    );

    let report = engine_with(4, WindowPolicy::Sweep).reconcile(&first, &second);

    let pair = &report.first_credit_pair;
    assert!(pair.matches.is_empty());
    assert_eq!(pair.clearings.len(), 1);
    assert_eq!(pair.clearings[0].consumed(), 3);
    assert!(report.residuals().is_empty());
}

#[test]
fn test_full_pipeline_from_raw_rows() {
    let bank = vec![
        RawRecord::new("01/03/2024", "1,250.00", "").with_description("Invoice 17"),
        RawRecord::new("02/03/2024", "N/A", "300"),
        RawRecord::new("03/03/2024", "75.25", ""),
        RawRecord::new("bad date", "10", ""),
        RawRecord::new("10/03/2024", "20", ""),
        RawRecord::new("10/03/2024", "20", ""),
        RawRecord::new("15/03/2024", "5,000", ""),
    ];
    let books = vec![
        RawRecord::new("01/03/2024", "", "1250"),
        RawRecord::new("04/03/2024", "300.00", ""),
        RawRecord::new("06/03/2024", "", "75.25"),
        RawRecord::new("10/03/2024", "", "40"),
        RawRecord::new("16/03/2024", "", "4,999"),
    ];

    let report = engine_with(4, WindowPolicy::Sweep).reconcile_records(&bank, &books);

    // Exact: invoice 17. Window: 75.25 three days apart, 300 two days apart.
    // Aggregate: 20 + 20 against 40 on the 10th.
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].origin_index, 3);

    let residuals = report.residuals();
    assert_eq!(residuals.first_credit.len(), 1);
    assert_eq!(residuals.first_credit[0].origin_index, 6);
    assert_eq!(residuals.second_debit.len(), 1);
    assert_eq!(residuals.second_debit[0].amount_debit, amount("4999"));
    assert!(residuals.first_debit.is_empty());
    assert!(residuals.second_credit.is_empty());

    let exact = &report.first_credit_pair.matches[0];
    assert_eq!(exact.kind, MatchKind::Exact);
    assert_eq!(exact.credit.reference.description, "Invoice 17");

    assert_eq!(report.second_credit_pair.matches.len(), 1);
    assert!(report.is_conserved());

    let gaps = &report.first_credit_pair.discrepancies;
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0].difference, amount("5000"));
    assert_eq!(gaps[1].difference, amount("-4999"));

    assert_eq!(report.totals.first_credit, amount("6365.25"));
    assert!(!report.totals.credits_balance());
    assert!(report.totals.debits_balance());
}

#[test]
fn test_fallback_amount_is_configurable() {
    let zero = Normalizer::default().normalize(
        LedgerSide::First,
        &[RawRecord::new("01/01/2024", "N/A", "")],
    );
    let split = split_by_direction(&zero.ledger);
    assert!(split.credit.is_empty());

    let tenth = Normalizer::new(amount("0.1"), "%d/%m/%Y").normalize(
        LedgerSide::First,
        &[RawRecord::new("01/01/2024", "N/A", "12")],
    );
    let txn = &tenth.ledger.transactions()[0];
    assert_eq!(txn.amount(Direction::Credit), &amount("0.1"));
    assert_eq!(txn.amount(Direction::Debit), &amount("12"));
}

#[test]
fn test_every_phase_conserves_rows() {
    let credit: Vec<Transaction> = (0..40)
        .map(|i| {
            Transaction::credit(
                LedgerSide::First,
                i,
                date(2024, 4, 1 + (i as u32 % 20)),
                BigDecimal::from((i % 7) as i64 + 1),
            )
        })
        .collect();
    let debit: Vec<Transaction> = (0..35)
        .map(|i| {
            Transaction::debit(
                LedgerSide::Second,
                i,
                date(2024, 4, 1 + (i as u32 * 3 % 25)),
                BigDecimal::from((i % 5) as i64 + 1),
            )
        })
        .collect();
    let pair = CrossPair::new(credit, debit);

    let exact = match_exact(&pair);
    let window = match_within_window(&exact.residual, 2, WindowPolicy::Sweep);
    let cleared = clear_balanced_dates(&window.residual);

    let mut matched_credit = HashSet::new();
    let mut matched_debit = HashSet::new();
    for m in exact.matches.iter().chain(window.matches.iter()) {
        assert!(matched_credit.insert(m.credit.key()), "credit row matched twice");
        for d in &m.debits {
            assert!(matched_debit.insert(d.key()), "debit row matched twice");
        }
    }
    for c in &cleared.clearings {
        for t in &c.removed_credit {
            assert!(matched_credit.insert(t.key()));
        }
        for t in &c.removed_debit {
            assert!(matched_debit.insert(t.key()));
        }
    }

    let residual_credit = keys(&cleared.residual.credit);
    let residual_debit = keys(&cleared.residual.debit);
    assert!(matched_credit.is_disjoint(&residual_credit));
    assert!(matched_debit.is_disjoint(&residual_debit));
    assert_eq!(matched_credit.len() + residual_credit.len(), pair.credit.len());
    assert_eq!(matched_debit.len() + residual_debit.len(), pair.debit.len());
    assert!(residual_credit.is_subset(&keys(&pair.credit)));
    assert!(residual_debit.is_subset(&keys(&pair.debit)));
}

#[test]
fn test_reruns_are_deterministic() {
    let rows = |side: LedgerSide, credit: bool| -> Vec<Transaction> {
        (0..12)
            .map(|i| {
                let day = date(2024, 7, 1 + (i as u32 % 4));
                let value = BigDecimal::from(10 + (i % 3) as i64);
                if credit {
                    Transaction::credit(side, i, day, value)
                } else {
                    Transaction::debit(side, i, day, value)
                }
            })
            .collect()
    };
    let first = Ledger::new(LedgerSide::First, rows(LedgerSide::First, true));
    let second = Ledger::new(LedgerSide::Second, rows(LedgerSide::Second, false));

    for policy in [WindowPolicy::Sweep, WindowPolicy::Nearest] {
        let engine = engine_with(1, policy);
        let a = engine.reconcile(&first, &second);
        let b = engine.reconcile(&first, &second);
        assert_eq!(a.first_credit_pair, b.first_credit_pair);
        assert_eq!(a.second_credit_pair, b.second_credit_pair);
        assert_ne!(a.run_id, b.run_id);
    }
}

#[test]
fn test_exact_matching_is_idempotent() {
    let pair = CrossPair::new(
        vec![
            Transaction::credit(LedgerSide::Second, 0, date(2024, 8, 1), amount("9.99")),
            Transaction::credit(LedgerSide::Second, 1, date(2024, 8, 1), amount("9.99")),
            Transaction::credit(LedgerSide::Second, 2, date(2024, 8, 2), amount("1")),
        ],
        vec![
            Transaction::debit(LedgerSide::First, 0, date(2024, 8, 1), amount("9.990")),
            Transaction::debit(LedgerSide::First, 1, date(2024, 8, 3), amount("1")),
        ],
    );

    let once = match_exact(&pair);
    assert_eq!(once.matches.len(), 1);
    assert!(match_exact(&once.residual).matches.is_empty());
}

#[tokio::test]
async fn test_run_through_memory_store() {
    let store = MemoryStore::new();
    store
        .insert_records(
            LedgerSide::First,
            vec![
                RawRecord::new("05/01/2024", "100.00", ""),
                RawRecord::new("09/01/2024", "", "64"),
            ],
        )
        .unwrap();
    store
        .insert_records(
            LedgerSide::Second,
            vec![
                RawRecord::new("06/01/2024", "", "100.00"),
                RawRecord::new("12/01/2024", "64", ""),
            ],
        )
        .unwrap();

    let mut sink = store.clone();
    let report = engine_with(4, WindowPolicy::Sweep)
        .run(&store, &mut sink)
        .await
        .unwrap();

    assert!(report.is_fully_reconciled());
    let stored = store.last_report().unwrap().unwrap();
    assert_eq!(stored.run_id, report.run_id);
    assert_eq!(stored.config.first_name, "bank");
}

#[tokio::test]
async fn test_missing_ledger_aborts_run() {
    let store = MemoryStore::new();
    store.insert_records(LedgerSide::Second, Vec::new()).unwrap();
    let mut sink = MemoryStore::new();

    let err = engine_with(4, WindowPolicy::Sweep)
        .run(&store, &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::LedgerLoad {
            side: LedgerSide::First,
            ..
        }
    ));
    assert_eq!(sink.report_count().unwrap(), 0);
}

#[test]
fn test_report_serializes() {
    let report = engine_with(2, WindowPolicy::Nearest).reconcile_records(
        &[RawRecord::new("01/01/2024", "7", "")],
        &[RawRecord::new("02/01/2024", "", "7")],
    );
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["config"]["window_policy"], "nearest");
    assert_eq!(json["first_credit_pair"]["stats"].as_array().unwrap().len(), 3);
}
