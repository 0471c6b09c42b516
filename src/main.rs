//! ledger-reconcile CLI - reconcile two CSV ledgers and write the residuals

use bigdecimal::BigDecimal;
use clap::Parser;
use ledger_reconcile::utils::{ColumnLayout, CsvLedgerSource, CsvResidualSink};
use ledger_reconcile::{LedgerSide, ReconcileConfig, ReconciliationEngine, WindowPolicy};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ledger-reconcile")]
#[command(about = "Match credit/debit transactions across two ledgers and report what is left")]
#[command(version)]
struct Cli {
    /// CSV file of the first ledger
    #[arg(long, env = "RECONCILE_FIRST")]
    first: PathBuf,

    /// CSV file of the second ledger
    #[arg(long, env = "RECONCILE_SECOND")]
    second: PathBuf,

    /// Name of the first ledger, used in output file names
    #[arg(long, env = "RECONCILE_FIRST_NAME", default_value = "first")]
    first_name: String,

    /// Name of the second ledger
    #[arg(long, env = "RECONCILE_SECOND_NAME", default_value = "second")]
    second_name: String,

    /// Directory the residual files are written to
    #[arg(short, long, env = "RECONCILE_OUTPUT_DIR", default_value = "./residuals")]
    output_dir: PathBuf,

    /// Days either side of a date a same-amount counterpart may fall on
    #[arg(long, env = "RECONCILE_TOLERANCE_DAYS", default_value_t = ledger_reconcile::DEFAULT_TOLERANCE_DAYS)]
    tolerance_days: u32,

    /// Amount used when a credit/debit cell is not numeric
    #[arg(long, env = "RECONCILE_FALLBACK_AMOUNT", default_value = "0")]
    fallback_amount: BigDecimal,

    /// sweep: clear every candidate in the window; nearest: clear only the closest
    #[arg(long, env = "RECONCILE_WINDOW_POLICY", default_value = "sweep")]
    window_policy: WindowPolicy,

    /// chrono format of the date column
    #[arg(long, env = "RECONCILE_DATE_FORMAT", default_value = ledger_reconcile::DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Zero-based positions of description, date, voucher number, voucher,
    /// credit and debit in the first ledger's file
    #[arg(long, env = "RECONCILE_FIRST_COLUMNS", default_value = "27,28,29,30,32,33")]
    first_columns: ColumnLayout,

    /// Column positions in the second ledger's file
    #[arg(long, env = "RECONCILE_SECOND_COLUMNS", default_value = "27,28,29,30,32,33")]
    second_columns: ColumnLayout,

    /// Treat the first row of each file as a header
    #[arg(long)]
    headers: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = ReconcileConfig {
        first_name: cli.first_name,
        second_name: cli.second_name,
        tolerance_days: cli.tolerance_days,
        fallback_amount: cli.fallback_amount,
        window_policy: cli.window_policy,
        date_format: cli.date_format,
    };
    let engine = ReconciliationEngine::new(config)?;

    let source = CsvLedgerSource::new(cli.first, cli.second)
        .with_layout(LedgerSide::First, cli.first_columns)
        .with_layout(LedgerSide::Second, cli.second_columns)
        .with_headers(cli.headers);
    let mut sink = CsvResidualSink::new(&cli.output_dir);

    let report = engine.run(&source, &mut sink).await?;

    let residuals = report.residuals();
    info!(
        "Unmatched: {} {} credit, {} {} debit, {} {} debit, {} {} credit",
        residuals.first_credit.len(),
        engine.config().first_name,
        residuals.second_debit.len(),
        engine.config().second_name,
        residuals.first_debit.len(),
        engine.config().first_name,
        residuals.second_credit.len(),
        engine.config().second_name,
    );
    if !report.dropped.is_empty() {
        info!("{} row(s) skipped for unreadable dates", report.dropped.len());
    }
    info!("Residuals written to {:?}", cli.output_dir);

    Ok(())
}
