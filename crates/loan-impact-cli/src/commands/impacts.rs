use clap::Args;
use serde_json::Value;

use loan_impact_core::impacts::analyzer::{self, ImpactInput};

use crate::input;

/// Arguments for contributor impact analysis
#[derive(Args)]
pub struct ImpactsArgs {
    /// Path to JSON file: {"loans": [...], "contributions": [[{name, amount}, ...], ...]}
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated contributors to amortize on their own (e.g. "A,C")
    #[arg(long, value_delimiter = ',')]
    pub selected: Option<Vec<String>>,

    /// Drop contributors who pay nothing toward any loan
    #[arg(long)]
    pub prune_idle: bool,
}

pub fn run_impacts(args: ImpactsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut impact_input: ImpactInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--input <file.json> or stdin required for impact analysis".into());
    };

    if args.selected.is_some() {
        impact_input.selected = args.selected;
    }
    if args.prune_idle {
        impact_input.prune_idle_contributors = true;
    }

    let result = analyzer::analyze_contribution_impacts(&impact_input)?;
    Ok(serde_json::to_value(result)?)
}
