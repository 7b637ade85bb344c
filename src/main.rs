use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roster_reconcile::column::ColumnRef;
use roster_reconcile::matcher::{MatchColumns, MatchOptions};
use roster_reconcile::sync::{self, RunConfig, RunReport};
use roster_reconcile::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Match(args) => execute_match(args),
    }
}

fn execute_match(args: MatchArgs) -> Result<()> {
    init_logging(args.verbose)?;

    let config = RunConfig {
        master: args.master,
        candidates: args.candidates,
        columns: MatchColumns {
            master_name: args.master_name,
            master_surname: args.master_surname,
            candidate_name: args.candidate_name,
        },
        options: MatchOptions {
            join_empty_keys: args.join_empty_keys,
        },
        output: args.output,
    };

    let report = sync::run_match(&config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn print_summary(report: &RunReport) {
    let summary = &report.summary;
    let rule = "=".repeat(50);
    println!("{rule}");
    println!("Checked:   {}", summary.total);
    println!("Matched:   {}", summary.matched);
    println!("Unmatched: {}", summary.unmatched);
    println!("Ratio:     {}", summary.ratio_percent());
    println!("{rule}");
    let action = if report.appended { "appended to" } else { "written to" };
    println!("Report {action} {}", report.report_path.display());
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile a list of names against a master list."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Match candidate names against the master list and write a report.
    Match(MatchArgs),
}

#[derive(clap::Args)]
struct MatchArgs {
    /// Master workbook holding the authoritative names.
    #[arg(long)]
    master: PathBuf,

    /// Workbook holding the names to check.
    #[arg(long)]
    candidates: PathBuf,

    /// Master column holding first names.
    #[arg(long, default_value = "A", value_parser = parse_column)]
    master_name: ColumnRef,

    /// Master column holding surnames.
    #[arg(long, default_value = "B", value_parser = parse_column)]
    master_surname: ColumnRef,

    /// Candidate column holding full names.
    #[arg(long, default_value = "E", value_parser = parse_column)]
    candidate_name: ColumnRef,

    /// Report path. Defaults to match_report.xlsx next to the master workbook.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Let candidates whose name reduces to nothing match master rows that
    /// also reduce to nothing.
    #[arg(long)]
    join_empty_keys: bool,

    /// Print the run report (path, columns, summary) as JSON.
    #[arg(long)]
    json: bool,

    /// Enable debug logging unless RUST_LOG is set.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_column(label: &str) -> std::result::Result<ColumnRef, String> {
    label.parse().map_err(|err: ToolError| err.to_string())
}
