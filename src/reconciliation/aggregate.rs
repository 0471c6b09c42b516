//! Per-date aggregate balance clearing

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::types::*;

/// Largest absolute difference, exclusive, at which two totals still balance: `0.01`
pub fn balance_epsilon() -> BigDecimal {
    BigDecimal::new(1.into(), 2)
}

/// Credit and debit sums of one side on one date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateTotals {
    pub credit: BigDecimal,
    pub debit: BigDecimal,
    pub count: usize,
}

/// Group transactions by date, summing both columns independently
pub fn totals_by_date(transactions: &[Transaction]) -> BTreeMap<NaiveDate, DateTotals> {
    let mut totals: BTreeMap<NaiveDate, DateTotals> = BTreeMap::new();
    for transaction in transactions {
        let entry = totals.entry(transaction.date).or_default();
        entry.credit += &transaction.amount_credit;
        entry.debit += &transaction.amount_debit;
        entry.count += 1;
    }
    totals
}

/// Whether two sides' totals for a date cancel out:
/// `|c1 - d2| < ε` and `|c2 - d1| < ε`
pub fn is_balanced(credit_side: &DateTotals, debit_side: &DateTotals, epsilon: &BigDecimal) -> bool {
    (&credit_side.credit - &debit_side.debit).abs() < *epsilon
        && (&debit_side.credit - &credit_side.debit).abs() < *epsilon
}

/// Remove every transaction dated on a day whose totals balance across the pair.
///
/// Only dates present on both sides are considered. Individual pairing is
/// irrelevant here: many small rows on one side may net to a single row on
/// the other.
pub fn clear_balanced_dates(pair: &CrossPair) -> ClearingOutcome {
    let epsilon = balance_epsilon();
    let credit_totals = totals_by_date(&pair.credit);
    let debit_totals = totals_by_date(&pair.debit);

    let balanced: BTreeSet<NaiveDate> = credit_totals
        .iter()
        .filter_map(|(date, credit_side)| {
            let debit_side = debit_totals.get(date)?;
            is_balanced(credit_side, debit_side, &epsilon).then_some(*date)
        })
        .collect();

    let mut clearings: Vec<DateClearing> = balanced
        .iter()
        .map(|date| {
            let credit_side = &credit_totals[date];
            let debit_side = &debit_totals[date];
            DateClearing {
                date: *date,
                credit_side_credit: credit_side.credit.clone(),
                credit_side_debit: credit_side.debit.clone(),
                debit_side_credit: debit_side.credit.clone(),
                debit_side_debit: debit_side.debit.clone(),
                removed_credit: Vec::new(),
                removed_debit: Vec::new(),
            }
        })
        .collect();

    let slot: BTreeMap<NaiveDate, usize> = balanced
        .iter()
        .enumerate()
        .map(|(position, date)| (*date, position))
        .collect();

    let mut credit_residual = Vec::new();
    for transaction in &pair.credit {
        match slot.get(&transaction.date) {
            Some(&position) => clearings[position].removed_credit.push(transaction.clone()),
            None => credit_residual.push(transaction.clone()),
        }
    }

    let mut debit_residual = Vec::new();
    for transaction in &pair.debit {
        match slot.get(&transaction.date) {
            Some(&position) => clearings[position].removed_debit.push(transaction.clone()),
            None => debit_residual.push(transaction.clone()),
        }
    }

    for clearing in &clearings {
        debug!(
            "Cleared {}: credit {} vs debit {}, {} row(s) removed",
            clearing.date,
            clearing.credit_side_credit,
            clearing.debit_side_debit,
            clearing.consumed()
        );
    }

    info!(
        "Aggregate clearing balanced {} date(s) out of {} shared",
        clearings.len(),
        credit_totals
            .keys()
            .filter(|date| debit_totals.contains_key(date))
            .count()
    );

    ClearingOutcome {
        clearings,
        residual: CrossPair::new(credit_residual, debit_residual),
    }
}
