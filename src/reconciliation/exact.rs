//! Same-date, same-amount matching

use tracing::{debug, info};

use super::index::{scan_order, unconsumed, DateIndex};
use crate::types::*;

/// Pair each credit-side transaction with the first unconsumed debit-side
/// transaction on the same date carrying the same amount.
///
/// Credit-side rows are visited in ascending `origin_index`; among several
/// candidates the one with the smallest `origin_index` wins. Each debit-side
/// row is consumed at most once. The input is left untouched.
pub fn match_exact(pair: &CrossPair) -> PhaseOutcome {
    let index = DateIndex::build(&pair.debit);
    let mut credit_used = vec![false; pair.credit.len()];
    let mut debit_used = vec![false; pair.debit.len()];
    let mut matches = Vec::new();

    for position in scan_order(&pair.credit) {
        let credit = &pair.credit[position];
        let found = index.on(credit.date).iter().copied().find(|&candidate| {
            !debit_used[candidate] && pair.debit[candidate].amount_debit == credit.amount_credit
        });

        if let Some(candidate) = found {
            credit_used[position] = true;
            debit_used[candidate] = true;
            debug!(
                "Exact match on {}: {} row {} <-> {} row {} ({})",
                credit.date,
                credit.source,
                credit.origin_index,
                pair.debit[candidate].source,
                pair.debit[candidate].origin_index,
                credit.amount_credit
            );
            matches.push(TransactionMatch {
                kind: MatchKind::Exact,
                credit: credit.clone(),
                debits: vec![pair.debit[candidate].clone()],
            });
        }
    }

    let credit_residual = unconsumed(&pair.credit, &credit_used);
    let debit_residual = unconsumed(&pair.debit, &debit_used);

    info!(
        "Exact matching paired {} of {} credit rows against {} debit rows",
        matches.len(),
        pair.credit.len(),
        pair.debit.len()
    );

    PhaseOutcome {
        matches,
        residual: CrossPair::new(credit_residual, debit_residual),
    }
}
