//! Ledger ingest CLI
//!
//! Parses transaction CSV files, appends them to a JSON-lines store and
//! prints a summary message for every file that has a delivery address.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --account-id acc-1 --email owner@example.com txns.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info` or `debug` to control logging verbosity
//! - `LEDGER_ACCOUNT_ID`, `LEDGER_NOTIFY_EMAIL`, `LEDGER_STORE_PATH`: defaults for the matching flags

use clap::Parser;
use ledger_ingest::{
    CancelToken, IngestError, JsonLinesStore, JsonNotifier, Pipeline, Result, SourceFile,
    TransactionParser,
};
use log::{error, info};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug, Parser)]
#[command(name = "ledger-ingest", version, about = "Ingest transaction CSV files")]
struct Cli {
    /// CSV files to ingest, each processed independently
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Account id for every file (defaults to the file stem)
    #[arg(long, env = "LEDGER_ACCOUNT_ID")]
    account_id: Option<String>,

    /// Address that receives each file's summary
    #[arg(long, env = "LEDGER_NOTIFY_EMAIL")]
    email: Option<String>,

    /// JSON-lines file that persisted transactions are appended to
    #[arg(long, env = "LEDGER_STORE_PATH", default_value = "transactions.jsonl")]
    store: PathBuf,

    /// Year used for dates written as M/D (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(0) => {}
        Ok(failed) => {
            eprintln!("Error: {} of {} files failed", failed, cli.files.len());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Processes every file and returns how many failed.
fn run(cli: &Cli) -> Result<usize> {
    let parser = match cli.year {
        Some(year) => TransactionParser::new(year),
        None => TransactionParser::from_clock(),
    };
    let store = JsonLinesStore::open(&cli.store)?;
    info!("Appending transactions to {}", store.path().display());
    let stdout = io::stdout();
    let mut pipeline = Pipeline::new(parser, store, JsonNotifier::new(stdout.lock()));

    let mut failed = 0;
    for path in &cli.files {
        let source = SourceFile::new(account_id_for(cli, path), cli.email.clone());
        let outcome = File::open(path).map_err(IngestError::from).and_then(|file| {
            pipeline.process(BufReader::new(file), &source, &CancelToken::new())
        });

        match outcome {
            Ok(report) => info!(
                "{}: stored {} transactions for account {}",
                path.display(),
                report.transaction_count,
                report.account_id
            ),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                eprintln!("Error: {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    Ok(failed)
}

fn account_id_for(cli: &Cli, path: &Path) -> String {
    cli.account_id.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}
