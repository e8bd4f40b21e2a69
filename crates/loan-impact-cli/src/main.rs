mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::impacts::ImpactsArgs;
use commands::portfolio::PortfolioArgs;
use commands::schedule::ScheduleArgs;

/// Loan amortization schedules and contributor impact analysis
#[derive(Parser)]
#[command(
    name = "loanimpact",
    version,
    about = "Loan amortization schedules and contributor impact analysis",
    long_about = "Computes payment-by-payment amortization schedules for one or more loans \
                  with decimal precision, aggregates them into a portfolio timeline, and \
                  measures how much interest and time each contributor's extra payments save."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Round decimal results to this many places (full precision if omitted)
    #[arg(long, global = true)]
    precision: Option<u32>,

    /// Enable debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule for a single loan
    Schedule(ScheduleArgs),
    /// Per-loan schedules and their combined portfolio schedule
    Portfolio(PortfolioArgs),
    /// Interest and duration impact of each contributor
    Impacts(ImpactsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::Impacts(args) => commands::impacts::run_impacts(args),
        Commands::Version => {
            println!("loanimpact {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(mut value) => {
            if let Some(dp) = cli.precision {
                debug!(precision = dp, "rounding output");
                output::round_decimals(&mut value, dp);
            }
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
