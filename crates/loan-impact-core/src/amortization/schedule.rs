//! Payment-by-payment amortization of a single fixed-payment loan.
//!
//! Interest accrues monthly on the opening balance at `rate / 1200` (the rate
//! is an annual percentage). Each period applies the contracted payment plus
//! any extra payment to interest first and principal second; the final period
//! is trimmed so the balance lands exactly on zero. All math uses
//! `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::LoanImpactError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanImpactResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Twelve months times one hundred percent.
const MONTHLY_PERCENT_DIVISOR: Decimal = dec!(1200);
/// Balances below this are residue from decimal rounding and count as paid off.
const TERMINATION_EPSILON: Decimal = dec!(0.000000000001);
/// Hard stop for pathological inputs (1000 years of monthly payments).
pub const MAX_PAYMENT_PERIODS: u32 = 12_000;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Terms of a single loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Outstanding principal.
    pub principal: Money,
    /// Annual nominal rate as a percentage (6.0 = 6%).
    pub rate: Rate,
    /// Contracted monthly payment.
    pub payment: Money,
    /// Additional principal paid every month on top of `payment`.
    #[serde(default)]
    pub extra_payment: Money,
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// 1-based payment index.
    pub payment_number: u32,
    pub begin_principal: Money,
    pub payment: Money,
    pub extra_payment: Money,
    pub applied_principal: Money,
    pub applied_interest: Money,
    pub end_principal: Money,
}

/// Full amortization schedule of one loan with its running totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub terms: LoanTerms,
    /// Chronological records; `records[0]` is payment 1.
    pub records: Vec<PaymentRecord>,
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
    /// Number of the final payment, `None` for an empty schedule.
    pub time_to_termination: Option<u32>,
}

impl LoanTerms {
    pub fn new(principal: Money, rate: Rate, payment: Money) -> Self {
        Self {
            principal,
            rate,
            payment,
            extra_payment: Decimal::ZERO,
        }
    }

    pub fn with_extra_payment(mut self, extra_payment: Money) -> Self {
        self.extra_payment = extra_payment;
        self
    }

    /// Interest accrued in the first period: the smallest payment that keeps
    /// the balance from growing.
    pub fn minimum_payment(&self) -> LoanImpactResult<Money> {
        monthly_interest(self.principal, self.rate)
    }

    /// Check the preconditions of [`compute_schedule`].
    pub fn validate(&self) -> LoanImpactResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LoanImpactError::invalid(
                "principal",
                "Principal must be greater than 0",
            ));
        }
        if self.rate <= Decimal::ZERO {
            return Err(LoanImpactError::invalid(
                "rate",
                "Rate must be greater than 0",
            ));
        }
        if self.payment <= Decimal::ZERO {
            return Err(LoanImpactError::invalid(
                "payment",
                "Payment must be greater than 0",
            ));
        }
        if self.extra_payment < Decimal::ZERO {
            return Err(LoanImpactError::invalid(
                "extra_payment",
                "Extra payment must be greater than or equal to 0",
            ));
        }

        let minimum = self.minimum_payment()?;
        if self.payment < minimum {
            return Err(LoanImpactError::invalid(
                "payment",
                format!("Payment must be at least {minimum} to cover first-period interest"),
            ));
        }
        // payment == minimum with no extra leaves the balance flat forever
        let total_payment = self
            .payment
            .checked_add(self.extra_payment)
            .ok_or_else(|| overflow("extra_payment"))?;
        if total_payment <= minimum {
            return Err(LoanImpactError::invalid(
                "payment",
                format!(
                    "Payment plus extra payment must exceed first-period interest of {minimum}"
                ),
            ));
        }
        Ok(())
    }
}

impl PaymentRecord {
    pub(crate) fn zero(payment_number: u32) -> Self {
        Self {
            payment_number,
            begin_principal: Decimal::ZERO,
            payment: Decimal::ZERO,
            extra_payment: Decimal::ZERO,
            applied_principal: Decimal::ZERO,
            applied_interest: Decimal::ZERO,
            end_principal: Decimal::ZERO,
        }
    }

    /// Add the six monetary fields of `other` into `self`.
    pub(crate) fn accumulate(&mut self, other: &PaymentRecord) -> LoanImpactResult<()> {
        let add = |a: Money, b: Money| a.checked_add(b).ok_or_else(|| overflow("loans"));
        self.begin_principal = add(self.begin_principal, other.begin_principal)?;
        self.payment = add(self.payment, other.payment)?;
        self.extra_payment = add(self.extra_payment, other.extra_payment)?;
        self.applied_principal = add(self.applied_principal, other.applied_principal)?;
        self.applied_interest = add(self.applied_interest, other.applied_interest)?;
        self.end_principal = add(self.end_principal, other.end_principal)?;
        Ok(())
    }
}

impl LoanSchedule {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn final_record(&self) -> Option<&PaymentRecord> {
        self.records.last()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Generate the amortization schedule for one loan.
pub fn compute_schedule(terms: &LoanTerms) -> LoanImpactResult<LoanSchedule> {
    terms.validate()?;

    let mut records: Vec<PaymentRecord> = Vec::new();
    let mut total_principal_paid = Decimal::ZERO;
    let mut total_interest_paid = Decimal::ZERO;
    let mut begin_principal = terms.principal;
    let mut payment_number: u32 = 0;

    while begin_principal > TERMINATION_EPSILON {
        if payment_number >= MAX_PAYMENT_PERIODS {
            return Err(LoanImpactError::invalid(
                "payment",
                format!("Loan does not amortize within {MAX_PAYMENT_PERIODS} payments"),
            ));
        }
        payment_number += 1;

        let applied_interest = monthly_interest(begin_principal, terms.rate)?;
        let mut payment = terms.payment;
        let mut extra_payment = terms.extra_payment;
        let mut applied_principal = (payment - applied_interest)
            .checked_add(extra_payment)
            .ok_or_else(|| overflow("extra_payment"))?;

        // Final payment: shrink it so the balance ends at exactly zero
        if applied_principal > begin_principal {
            let payoff = begin_principal
                .checked_add(applied_interest)
                .ok_or_else(|| overflow("principal"))?;
            if payoff <= payment {
                payment = payoff;
                extra_payment = Decimal::ZERO;
            } else {
                extra_payment = payoff - payment;
            }
            applied_principal = payment - applied_interest + extra_payment;
        }

        let mut end_principal = begin_principal - applied_principal;
        if end_principal < TERMINATION_EPSILON {
            applied_principal = begin_principal;
            end_principal = Decimal::ZERO;
        }

        total_principal_paid = total_principal_paid
            .checked_add(applied_principal)
            .ok_or_else(|| overflow("principal"))?;
        total_interest_paid = total_interest_paid
            .checked_add(applied_interest)
            .ok_or_else(|| overflow("rate"))?;

        records.push(PaymentRecord {
            payment_number,
            begin_principal,
            payment,
            extra_payment,
            applied_principal,
            applied_interest,
            end_principal,
        });

        begin_principal = end_principal;
    }

    let time_to_termination = records.last().map(|r| r.payment_number);

    debug!(
        principal = %terms.principal,
        rate = %terms.rate,
        payments = records.len(),
        total_interest = %total_interest_paid,
        "computed amortization schedule"
    );

    Ok(LoanSchedule {
        terms: terms.clone(),
        records,
        total_principal_paid,
        total_interest_paid,
        time_to_termination,
    })
}

/// Amortize a single loan and wrap the schedule in the standard envelope.
pub fn model_loan_schedule(
    terms: &LoanTerms,
) -> LoanImpactResult<ComputationOutput<LoanSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = compute_schedule(terms)?;

    if terms.payment == terms.minimum_payment()? {
        warnings.push(format!(
            "Contracted payment {} only covers first-period interest; principal is retired by the extra payment alone",
            terms.payment
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment amortization — monthly interest at rate/1200, truncated final payment",
        &serde_json::json!({
            "principal": terms.principal.to_string(),
            "rate_pct": terms.rate.to_string(),
            "payment": terms.payment.to_string(),
            "extra_payment": terms.extra_payment.to_string(),
            "monthly_rate": (terms.rate / MONTHLY_PERCENT_DIVISOR).to_string(),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn monthly_interest(balance: Money, rate: Rate) -> LoanImpactResult<Money> {
    balance
        .checked_mul(rate)
        .map(|scaled| scaled / MONTHLY_PERCENT_DIVISOR)
        .ok_or_else(|| overflow("principal"))
}

pub(crate) fn overflow(field: &str) -> LoanImpactError {
    LoanImpactError::invalid(field, "Amount exceeds the supported decimal range")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn standard_loan() -> LoanTerms {
        LoanTerms::new(dec!(10000), dec!(6.0), dec!(200))
    }

    fn assert_invalid(terms: LoanTerms, expected_field: &str) {
        match compute_schedule(&terms) {
            Err(LoanImpactError::InvalidLoanParameters { field, .. }) => {
                assert_eq!(field, expected_field)
            }
            other => panic!("Expected InvalidLoanParameters on {expected_field}, got {other:?}"),
        }
    }

    #[test]
    fn test_first_record_splits_interest_and_principal() {
        let schedule = compute_schedule(&standard_loan()).unwrap();
        let first = &schedule.records[0];

        assert_eq!(first.payment_number, 1);
        assert_eq!(first.begin_principal, dec!(10000));
        assert_eq!(first.applied_interest, dec!(50));
        assert_eq!(first.applied_principal, dec!(150));
        assert_eq!(first.end_principal, dec!(9850));
    }

    #[test]
    fn test_standard_loan_runs_58_payments() {
        let schedule = compute_schedule(&standard_loan()).unwrap();
        assert_eq!(schedule.len(), 58);
        assert_eq!(schedule.time_to_termination, Some(58));
        assert_eq!(schedule.final_record().unwrap().end_principal, Decimal::ZERO);
    }

    #[test]
    fn test_final_payment_is_truncated() {
        let schedule = compute_schedule(&standard_loan()).unwrap();
        let last = schedule.final_record().unwrap();

        assert!(last.payment < dec!(200), "Final payment {} should be short", last.payment);
        assert_eq!(last.extra_payment, Decimal::ZERO);
        assert_eq!(last.applied_principal, last.begin_principal);
        assert_eq!(last.payment, last.begin_principal + last.applied_interest);
    }

    #[test]
    fn test_final_extra_payment_shrinks_when_payment_alone_is_short() {
        // Balance 103 after one period: the 100 payment cannot clear it, extra makes up the rest
        let terms = LoanTerms::new(dec!(300), dec!(12), dec!(100)).with_extra_payment(dec!(100));
        let schedule = compute_schedule(&terms).unwrap();
        let last = schedule.final_record().unwrap();

        assert_eq!(last.payment, dec!(100));
        assert!(last.extra_payment > Decimal::ZERO && last.extra_payment < dec!(100));
        assert_eq!(last.end_principal, Decimal::ZERO);
        assert_eq!(
            last.applied_principal + last.applied_interest,
            last.payment + last.extra_payment
        );
    }

    #[test]
    fn test_balances_chain_between_records() {
        let schedule = compute_schedule(&standard_loan().with_extra_payment(dec!(35))).unwrap();
        for pair in schedule.records.windows(2) {
            assert_eq!(pair[1].begin_principal, pair[0].end_principal);
            assert_eq!(pair[1].payment_number, pair[0].payment_number + 1);
        }
    }

    #[test]
    fn test_totals_match_records() {
        let schedule = compute_schedule(&standard_loan()).unwrap();
        let principal: Decimal = schedule.records.iter().map(|r| r.applied_principal).sum();
        let interest: Decimal = schedule.records.iter().map(|r| r.applied_interest).sum();

        assert_eq!(schedule.total_principal_paid, principal);
        assert_eq!(schedule.total_interest_paid, interest);
        assert!((schedule.total_principal_paid - dec!(10000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_extra_payment_shortens_loan() {
        let base = compute_schedule(&standard_loan()).unwrap();
        let faster = compute_schedule(&standard_loan().with_extra_payment(dec!(50))).unwrap();

        assert!(faster.len() < base.len());
        assert!(faster.total_interest_paid < base.total_interest_paid);
    }

    #[test]
    fn test_single_payment_payoff() {
        let terms = LoanTerms::new(dec!(100), dec!(12), dec!(500));
        let schedule = compute_schedule(&terms).unwrap();

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.records[0].payment, dec!(101));
        assert_eq!(schedule.total_interest_paid, dec!(1));
    }

    #[test]
    fn test_rejects_non_positive_principal() {
        assert_invalid(LoanTerms::new(dec!(0), dec!(6), dec!(200)), "principal");
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        assert_invalid(LoanTerms::new(dec!(10000), dec!(0), dec!(200)), "rate");
    }

    #[test]
    fn test_rejects_negative_extra_payment() {
        assert_invalid(standard_loan().with_extra_payment(dec!(-1)), "extra_payment");
    }

    #[test]
    fn test_rejects_payment_below_interest() {
        assert_invalid(LoanTerms::new(dec!(10000), dec!(6), dec!(49.99)), "payment");
    }

    #[test]
    fn test_interest_only_payment_needs_extra() {
        assert_invalid(LoanTerms::new(dec!(10000), dec!(6), dec!(50)), "payment");

        let terms = LoanTerms::new(dec!(10000), dec!(6), dec!(50)).with_extra_payment(dec!(100));
        let result = model_loan_schedule(&terms).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.result.final_record().unwrap().end_principal, Decimal::ZERO);
    }

    #[test]
    fn test_minimum_payment() {
        assert_eq!(standard_loan().minimum_payment().unwrap(), dec!(50));
    }

    #[test]
    fn test_interest_overflow_is_an_error() {
        assert_invalid(LoanTerms::new(dec!(1e27), dec!(100), dec!(5e28)), "principal");
    }

    #[test]
    fn test_payment_plus_extra_overflow_is_an_error() {
        let terms = LoanTerms::new(dec!(10000), dec!(6), dec!(5e28)).with_extra_payment(dec!(5e28));
        assert_invalid(terms, "extra_payment");
    }

    #[test]
    fn test_loan_that_never_amortizes_hits_period_cap() {
        // Interest is 0.0833 a month, so each 0.1 payment retires about 0.017
        let terms = LoanTerms::new(dec!(10000), dec!(0.01), dec!(0.1));
        assert!(terms.validate().is_ok());
        match compute_schedule(&terms) {
            Err(LoanImpactError::InvalidLoanParameters { field, reason }) => {
                assert_eq!(field, "payment");
                assert!(reason.contains(&MAX_PAYMENT_PERIODS.to_string()));
            }
            other => panic!("Expected period cap error, got {other:?}"),
        }
    }
}
