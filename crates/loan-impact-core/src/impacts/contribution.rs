//! Contributor rosters: who pays what toward each loan.
//!
//! Every loan carries an ordered list of `(name, amount)` pairs. All loans
//! must name the same contributors; the first loan's order is the roster
//! order used for labels and output rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::amortization::schedule::overflow;
use crate::error::LoanImpactError;
use crate::types::Money;
use crate::LoanImpactResult;

/// A named third party's monthly extra payment toward one loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub name: String,
    pub amount: Money,
}

impl Contribution {
    pub fn new(name: impl Into<String>, amount: Money) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Validate per-loan contribution lists and return the contributor roster.
pub fn contributor_roster(
    loan_count: usize,
    contributions: &[Vec<Contribution>],
) -> LoanImpactResult<Vec<String>> {
    if loan_count != contributions.len() {
        return Err(LoanImpactError::InconsistentContributorSet(format!(
            "{} loans but {} contribution lists",
            loan_count,
            contributions.len()
        )));
    }

    let Some(first) = contributions.first() else {
        return Ok(Vec::new());
    };
    let roster: Vec<String> = first.iter().map(|c| c.name.clone()).collect();
    let expected: HashSet<&str> = roster.iter().map(String::as_str).collect();

    for (idx, loan_contributions) in contributions.iter().enumerate() {
        let names: HashSet<&str> = loan_contributions.iter().map(|c| c.name.as_str()).collect();
        if names.len() != loan_contributions.len() {
            return Err(LoanImpactError::InconsistentContributorSet(format!(
                "loan {} names a contributor more than once",
                idx + 1
            )));
        }
        if names != expected {
            return Err(LoanImpactError::InconsistentContributorSet(format!(
                "loan {} contributors [{}] differ from loan 1 contributors [{}]",
                idx + 1,
                loan_contributions
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                roster.join(", ")
            )));
        }
        if let Some(c) = loan_contributions.iter().find(|c| c.amount < Decimal::ZERO) {
            return Err(LoanImpactError::invalid(
                "contributions",
                format!(
                    "Contribution from {} to loan {} must be greater than or equal to 0",
                    c.name,
                    idx + 1
                ),
            ));
        }
    }

    Ok(roster)
}

/// Check that every selected name belongs to the roster.
pub fn check_selection<S: AsRef<str>>(roster: &[String], selected: &[S]) -> LoanImpactResult<()> {
    for name in selected {
        if !roster.iter().any(|r| r == name.as_ref()) {
            return Err(LoanImpactError::InconsistentContributorSet(format!(
                "unknown contributor '{}'",
                name.as_ref()
            )));
        }
    }
    Ok(())
}

/// Sum of the named contributors' amounts within one loan's list.
pub fn contributed_amount<S: AsRef<str>>(
    contributions: &[Contribution],
    paying: &[S],
) -> LoanImpactResult<Money> {
    contributions
        .iter()
        .filter(|c| paying.iter().any(|p| p.as_ref() == c.name))
        .try_fold(Decimal::ZERO, |total, c| {
            total
                .checked_add(c.amount)
                .ok_or_else(|| overflow("contributions"))
        })
}

/// Drop contributors who pay nothing toward any loan. Returns the dropped names.
pub fn prune_idle_contributors(contributions: &mut [Vec<Contribution>]) -> Vec<String> {
    let Some(first) = contributions.first() else {
        return Vec::new();
    };

    let idle: Vec<String> = first
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| {
            contributions
                .iter()
                .flatten()
                .filter(|c| &c.name == name)
                .all(|c| c.amount.is_zero())
        })
        .collect();

    for loan_contributions in contributions.iter_mut() {
        loan_contributions.retain(|c| !idle.contains(&c.name));
    }
    idle
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
