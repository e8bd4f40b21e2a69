//! Combine several loan schedules into one repayment timeline.
//!
//! Records are aligned by payment number: the portfolio record for payment
//! `k` is the field-wise sum of every loan's record `k`. Loans that have
//! already terminated simply stop contributing, so the combined schedule is as
//! long as the longest loan.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::amortization::schedule::{
    compute_schedule, overflow, LoanSchedule, LoanTerms, PaymentRecord,
};
use crate::error::LoanImpactError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanImpactResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A set of loans, each carrying its own computed schedule.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    loans: Vec<LoanSchedule>,
}

/// Combined schedule and totals for a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub records: Vec<PaymentRecord>,
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
    /// Length of the longest loan, `None` when the portfolio is empty.
    pub time_to_termination: Option<u32>,
}

/// Input for amortizing several loans at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub loans: Vec<LoanTerms>,
}

/// Per-loan schedules alongside their portfolio aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub loans: Vec<LoanSchedule>,
    pub portfolio: AggregateResult,
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute a schedule for every set of terms and collect them.
    pub fn from_terms(terms: &[LoanTerms]) -> LoanImpactResult<Self> {
        let mut portfolio = Self::new();
        for loan in terms {
            portfolio.add_loan(compute_schedule(loan)?);
        }
        Ok(portfolio)
    }

    pub fn add_loan(&mut self, schedule: LoanSchedule) {
        self.loans.push(schedule);
    }

    pub fn remove_last_loan(&mut self) -> Option<LoanSchedule> {
        self.loans.pop()
    }

    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn loans(&self) -> &[LoanSchedule] {
        &self.loans
    }

    /// Sum all loan schedules into one. Recomputed from scratch on every call.
    pub fn aggregate(&self) -> LoanImpactResult<AggregateResult> {
        let mut records: Vec<PaymentRecord> = Vec::new();
        let mut total_principal_paid = Decimal::ZERO;
        let mut total_interest_paid = Decimal::ZERO;

        for loan in &self.loans {
            for (idx, record) in loan.records.iter().enumerate() {
                if idx == records.len() {
                    records.push(PaymentRecord::zero(idx as u32 + 1));
                }
                records[idx].accumulate(record)?;
            }
            total_principal_paid = total_principal_paid
                .checked_add(loan.total_principal_paid)
                .ok_or_else(|| overflow("loans"))?;
            total_interest_paid = total_interest_paid
                .checked_add(loan.total_interest_paid)
                .ok_or_else(|| overflow("loans"))?;
        }

        let time_to_termination = if records.is_empty() {
            None
        } else {
            Some(records.len() as u32)
        };

        debug!(
            loans = self.loans.len(),
            payments = records.len(),
            total_interest = %total_interest_paid,
            "aggregated portfolio schedule"
        );

        Ok(AggregateResult {
            records,
            total_principal_paid,
            total_interest_paid,
            time_to_termination,
        })
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Amortize every loan in `input` and aggregate them into a portfolio view.
pub fn amortize(input: &AmortizationInput) -> LoanImpactResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.loans.is_empty() {
        return Err(LoanImpactError::invalid(
            "loans",
            "At least one loan is required",
        ));
    }

    let portfolio = Portfolio::from_terms(&input.loans)?;
    let aggregate = portfolio.aggregate()?;

    let lengths: Vec<usize> = portfolio.loans().iter().map(|l| l.len()).collect();
    if lengths.windows(2).any(|w| w[0] != w[1]) {
        warnings.push(format!(
            "Loans terminate at different payments ({}); later portfolio records include only the loans still outstanding",
            lengths
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let output = AmortizationOutput {
        loans: portfolio.loans().to_vec(),
        portfolio: aggregate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio amortization — per-loan schedules summed by payment number",
        &serde_json::json!({
            "loan_count": input.loans.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
