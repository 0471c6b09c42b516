//! Basic reconciliation example

use ledger_reconcile::utils::MemoryStore;
use ledger_reconcile::{LedgerSide, RawRecord, ReconcileConfig, ReconciliationEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Ledger Reconcile - Basic Example\n");

    let store = MemoryStore::new();

    // The bank records receipts as credits
    store.insert_records(
        LedgerSide::First,
        vec![
            RawRecord::new("01/03/2024", "1,250.00", "").with_description("Invoice 17"),
            RawRecord::new("03/03/2024", "75.25", "").with_description("Invoice 18"),
            RawRecord::new("10/03/2024", "20", "").with_description("Card batch 1"),
            RawRecord::new("10/03/2024", "20", "").with_description("Card batch 2"),
            RawRecord::new("15/03/2024", "5,000", "").with_description("Wire"),
        ],
    )?;

    // The books record the same transfers as debits
    store.insert_records(
        LedgerSide::Second,
        vec![
            RawRecord::new("01/03/2024", "", "1250").with_description("INV-17"),
            RawRecord::new("06/03/2024", "", "75.25").with_description("INV-18"),
            RawRecord::new("10/03/2024", "", "40").with_description("Card settlement"),
            RawRecord::new("16/03/2024", "", "4,999").with_description("Wire"),
        ],
    )?;

    let engine = ReconciliationEngine::new(ReconcileConfig {
        first_name: "bank".to_string(),
        second_name: "books".to_string(),
        ..ReconcileConfig::default()
    })?;

    let mut sink = store.clone();
    let report = engine.run(&store, &mut sink).await?;

    for pair in report.pairs() {
        println!(
            "{} credit vs {} debit",
            engine.config().name_of(pair.credit_side),
            engine.config().name_of(pair.debit_side)
        );
        for stats in &pair.stats {
            println!(
                "  {:?}: {} credit / {} debit matched",
                stats.phase, stats.credit_matched, stats.debit_matched
            );
        }
        for gap in &pair.discrepancies {
            println!("  gap on {}: {}", gap.date, gap.difference);
        }
    }

    let residuals = report.residuals();
    println!("\nUnmatched bank credits:");
    for txn in residuals.first_credit {
        println!("  {} {} {}", txn.date, txn.amount_credit, txn.reference.description);
    }
    println!("Unmatched books debits:");
    for txn in residuals.second_debit {
        println!("  {} {} {}", txn.date, txn.amount_debit, txn.reference.description);
    }

    Ok(())
}
