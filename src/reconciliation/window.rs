//! Same-amount matching within a date tolerance window

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use super::index::{scan_order, unconsumed, DateIndex};
use crate::config::WindowPolicy;
use crate::types::*;

/// Closed interval `[date - tolerance_days, date + tolerance_days]`,
/// clamped to the representable calendar
pub fn tolerance_window(date: NaiveDate, tolerance_days: u32) -> (NaiveDate, NaiveDate) {
    let span = Days::new(u64::from(tolerance_days));
    let start = date.checked_sub_days(span).unwrap_or(NaiveDate::MIN);
    let end = date.checked_add_days(span).unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Match credit-side transactions against debit-side transactions carrying
/// the same amount and dated inside the credit row's tolerance window.
///
/// Under [`WindowPolicy::Sweep`] a credit row that finds any candidate
/// consumes every unconsumed candidate in its window. Under
/// [`WindowPolicy::Nearest`] it consumes only the candidate closest in date,
/// the smallest `origin_index` breaking ties.
pub fn match_within_window(
    pair: &CrossPair,
    tolerance_days: u32,
    policy: WindowPolicy,
) -> PhaseOutcome {
    let index = DateIndex::build(&pair.debit);
    let mut credit_used = vec![false; pair.credit.len()];
    let mut debit_used = vec![false; pair.debit.len()];
    let mut matches = Vec::new();

    for position in scan_order(&pair.credit) {
        let credit = &pair.credit[position];
        let (start, end) = tolerance_window(credit.date, tolerance_days);

        let mut candidates: Vec<usize> = index
            .within(start, end)
            .filter(|&candidate| {
                !debit_used[candidate]
                    && pair.debit[candidate].amount_debit == credit.amount_credit
            })
            .collect();

        if candidates.is_empty() {
            continue;
        }

        match policy {
            WindowPolicy::Sweep => {
                candidates.sort_by_key(|&candidate| pair.debit[candidate].origin_index);
            }
            WindowPolicy::Nearest => {
                let nearest = candidates.iter().copied().min_by_key(|&candidate| {
                    let debit = &pair.debit[candidate];
                    ((debit.date - credit.date).num_days().abs(), debit.origin_index)
                });
                candidates = nearest.into_iter().collect();
            }
        }

        credit_used[position] = true;
        for &candidate in &candidates {
            debit_used[candidate] = true;
        }

        debug!(
            "Window match for {} row {} on {} ({}): {} debit row(s) within {} day(s)",
            credit.source,
            credit.origin_index,
            credit.date,
            credit.amount_credit,
            candidates.len(),
            tolerance_days
        );

        matches.push(TransactionMatch {
            kind: MatchKind::Window { tolerance_days },
            credit: credit.clone(),
            debits: candidates
                .iter()
                .map(|&candidate| pair.debit[candidate].clone())
                .collect(),
        });
    }

    let credit_residual = unconsumed(&pair.credit, &credit_used);
    let debit_residual = unconsumed(&pair.debit, &debit_used);

    info!(
        "Window matching ({:?}, ±{} days) cleared {} credit and {} debit rows",
        policy,
        tolerance_days,
        matches.len(),
        pair.debit.len() - debit_residual.len()
    );

    PhaseOutcome {
        matches,
        residual: CrossPair::new(credit_residual, debit_residual),
    }
}
