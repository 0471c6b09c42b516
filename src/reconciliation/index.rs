//! Date-bucketed lookup over a candidate side

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::types::Transaction;

/// Positions of candidate transactions grouped by date.
///
/// Within a bucket, positions are ordered by `origin_index`, so the first
/// usable entry of a bucket is the first-found candidate of a linear scan.
#[derive(Debug, Clone, Default)]
pub(crate) struct DateIndex {
    buckets: BTreeMap<NaiveDate, Vec<usize>>,
}

impl DateIndex {
    pub(crate) fn build(transactions: &[Transaction]) -> Self {
        let mut buckets: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        for position in scan_order(transactions) {
            buckets
                .entry(transactions[position].date)
                .or_default()
                .push(position);
        }
        Self { buckets }
    }

    /// Positions dated exactly `date`
    pub(crate) fn on(&self, date: NaiveDate) -> &[usize] {
        self.buckets.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positions dated within `[start, end]`, by date then `origin_index`
    pub(crate) fn within(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = usize> + '_ {
        self.buckets
            .range(start..=end)
            .flat_map(|(_, positions)| positions.iter().copied())
    }
}

/// Positions of `transactions` in ascending `origin_index` order
pub(crate) fn scan_order(transactions: &[Transaction]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..transactions.len()).collect();
    order.sort_by_key(|&position| transactions[position].origin_index);
    order
}

/// Rows of `transactions` not flagged in `consumed`, in input order
pub(crate) fn unconsumed(transactions: &[Transaction], consumed: &[bool]) -> Vec<Transaction> {
    transactions
        .iter()
        .zip(consumed)
        .filter_map(|(transaction, used)| (!*used).then(|| transaction.clone()))
        .collect()
}
