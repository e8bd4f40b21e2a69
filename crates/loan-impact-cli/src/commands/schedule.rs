use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_impact_core::amortization::schedule::{self, LoanTerms};

use crate::input;

/// Arguments for a single-loan amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual nominal rate as a percentage (e.g. 6.0 for 6%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Contracted monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Extra monthly principal payment
    #[arg(long, default_value = "0")]
    pub extra_payment: Decimal,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        LoanTerms {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            rate: args.rate
                .ok_or("--rate is required (or provide --input)")?,
            payment: args.payment
                .ok_or("--payment is required (or provide --input)")?,
            extra_payment: args.extra_payment,
        }
    };

    let result = schedule::model_loan_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}
