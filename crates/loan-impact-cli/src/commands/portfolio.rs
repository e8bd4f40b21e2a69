use clap::Args;
use serde_json::Value;

use loan_impact_core::portfolio::aggregate::{self, AmortizationInput};

use crate::input;

/// Arguments for multi-loan portfolio amortization
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON file: {"loans": [{principal, rate, payment, extra_payment}, ...]}
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let portfolio_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--input <file.json> or stdin required for portfolio amortization".into());
    };
    let result = aggregate::amortize(&portfolio_input)?;
    Ok(serde_json::to_value(result)?)
}
