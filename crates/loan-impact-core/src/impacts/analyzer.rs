//! Marginal impact of contributors on total interest and loan duration.
//!
//! Every scenario re-amortizes the whole portfolio with a different set of
//! contributors paying, then compares against the "ALL" baseline where every
//! contributor pays. Impacts are `scenario - ALL`; ratios divide by the ALL
//! value. Positive numbers mean the scenario costs more or runs longer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::amortization::schedule::{overflow, LoanTerms};
use crate::error::LoanImpactError;
use crate::impacts::contribution::{
    check_selection, contributed_amount, contributor_roster, prune_idle_contributors,
    Contribution,
};
use crate::portfolio::aggregate::{AggregateResult, Portfolio};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanImpactResult;

pub const ALL_LABEL: &str = "ALL";
pub const NONE_LABEL: &str = "None";
const LABEL_SEPARATOR: &str = " and ";
/// Omission rows are only produced for rosters of exactly this size.
const OMISSION_ROSTER_SIZE: usize = 3;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Which contributors pay in a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Every contributor pays (the baseline).
    AllContributions,
    /// Nobody but the borrower pays.
    NoContributions,
    /// A single contributor pays.
    Isolated,
    /// Everyone except one contributor pays.
    Omitted,
}

/// Difference between a scenario and the ALL baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginalImpact {
    pub interest: Money,
    /// Difference in number of payments.
    pub duration: i64,
    /// `interest / ALL interest`; `None` when the baseline interest is zero.
    pub interest_pct: Option<Decimal>,
    /// `duration / ALL duration`; `None` when the baseline duration is zero.
    pub duration_pct: Option<Decimal>,
}

/// One row of the impact table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactScenario {
    pub label: String,
    pub kind: ScenarioKind,
    /// Contributors paying in this scenario, in roster order.
    pub contributors: Vec<String>,
    pub total_interest_paid: Money,
    /// Payments until the whole portfolio is retired.
    pub duration: u32,
    /// Absent on the ALL baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marginal_impact: Option<MarginalImpact>,
}

/// Ordered scenario rows: ALL, None, isolations, omissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactTable {
    pub roster: Vec<String>,
    pub scenarios: Vec<ImpactScenario>,
}

/// Input for a contributor impact analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactInput {
    pub loans: Vec<LoanTerms>,
    /// `contributions[i]` belongs to `loans[i]`.
    #[serde(default)]
    pub contributions: Vec<Vec<Contribution>>,
    /// Drop contributors who pay nothing toward any loan before analysing.
    #[serde(default)]
    pub prune_idle_contributors: bool,
    /// Also amortize the portfolio with only these contributors paying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<Vec<String>>,
}

/// Portfolio outcome for a chosen subset of contributors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionView {
    pub contributors: Vec<String>,
    /// The impact row describing this selection, when one was computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ImpactScenario>,
    pub schedule: AggregateResult,
}

/// Output of a contributor impact analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactOutput {
    pub impacts: ImpactTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionView>,
}

impl ImpactTable {
    pub fn row(&self, label: &str) -> Option<&ImpactScenario> {
        self.scenarios.iter().find(|s| s.label == label)
    }

    pub fn baseline(&self) -> Option<&ImpactScenario> {
        self.row(ALL_LABEL)
    }

    /// Find the row describing a scenario where only `selected` contributors pay.
    pub fn row_for_selection<S: AsRef<str>>(
        &self,
        selected: &[S],
    ) -> LoanImpactResult<Option<&ImpactScenario>> {
        check_selection(&self.roster, selected)?;
        let paying = in_roster_order(&self.roster, selected);
        let label = if paying.len() == self.roster.len() {
            ALL_LABEL.to_string()
        } else if paying.is_empty() {
            NONE_LABEL.to_string()
        } else {
            paying.join(LABEL_SEPARATOR)
        };
        Ok(self.row(&label))
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Build the impact table for `loans` paired positionally with `contributions`.
pub fn compute_impacts(
    loans: &[LoanTerms],
    contributions: &[Vec<Contribution>],
) -> LoanImpactResult<ImpactTable> {
    if loans.is_empty() {
        return Err(LoanImpactError::invalid(
            "loans",
            "At least one loan is required",
        ));
    }
    let roster = contributor_roster(loans.len(), contributions)?;

    let all = run_scenario(loans, contributions, &roster)?;
    let baseline_interest = all.total_interest_paid;
    let baseline_duration = duration_of(&all);

    let mut scenarios = vec![ImpactScenario {
        label: ALL_LABEL.to_string(),
        kind: ScenarioKind::AllContributions,
        contributors: roster.clone(),
        total_interest_paid: baseline_interest,
        duration: baseline_duration,
        marginal_impact: None,
    }];

    let mut push_row = |label: String,
                        kind: ScenarioKind,
                        paying: Vec<String>|
     -> LoanImpactResult<()> {
        let result = run_scenario(loans, contributions, &paying)?;
        let duration = duration_of(&result);
        let impact = marginal_impact(
            &label,
            result.total_interest_paid,
            duration,
            baseline_interest,
            baseline_duration,
        );
        scenarios.push(ImpactScenario {
            label,
            kind,
            contributors: paying,
            total_interest_paid: result.total_interest_paid,
            duration,
            marginal_impact: Some(impact),
        });
        Ok(())
    };

    push_row(NONE_LABEL.to_string(), ScenarioKind::NoContributions, Vec::new())?;

    if roster.len() >= 2 {
        for name in &roster {
            push_row(name.clone(), ScenarioKind::Isolated, vec![name.clone()])?;
        }
    }

    if roster.len() == OMISSION_ROSTER_SIZE {
        for omitted in &roster {
            let others: Vec<String> = roster.iter().filter(|n| *n != omitted).cloned().collect();
            push_row(others.join(LABEL_SEPARATOR), ScenarioKind::Omitted, others)?;
        }
    }

    debug!(
        loans = loans.len(),
        contributors = roster.len(),
        rows = scenarios.len(),
        "computed contributor impacts"
    );

    Ok(ImpactTable { roster, scenarios })
}

/// Aggregate schedule when only the `selected` contributors pay.
pub fn schedule_with_contributors<S: AsRef<str>>(
    loans: &[LoanTerms],
    contributions: &[Vec<Contribution>],
    selected: &[S],
) -> LoanImpactResult<AggregateResult> {
    if loans.is_empty() {
        return Err(LoanImpactError::invalid(
            "loans",
            "At least one loan is required",
        ));
    }
    let roster = contributor_roster(loans.len(), contributions)?;
    check_selection(&roster, selected)?;
    run_scenario(loans, contributions, selected)
}

/// Run the full analysis and wrap it in the standard envelope.
pub fn analyze_contribution_impacts(
    input: &ImpactInput,
) -> LoanImpactResult<ComputationOutput<ImpactOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // A missing contribution list means nobody contributes to any loan
    let mut contributions = if input.contributions.is_empty() {
        vec![Vec::new(); input.loans.len()]
    } else {
        input.contributions.clone()
    };
    contributor_roster(input.loans.len(), &contributions)?;

    if input.prune_idle_contributors {
        let dropped = prune_idle_contributors(&mut contributions);
        if !dropped.is_empty() {
            warnings.push(format!(
                "Dropped contributors with no payments: {}",
                dropped.join(", ")
            ));
        }
    }

    let impacts = compute_impacts(&input.loans, &contributions)?;

    match impacts.roster.len() {
        0 => warnings.push("No contributors; ALL and None scenarios are identical".into()),
        1 => warnings.push("Single contributor; per-contributor isolation skipped".into()),
        n if n != OMISSION_ROSTER_SIZE => warnings.push(format!(
            "Per-contributor omission is only computed for {OMISSION_ROSTER_SIZE} contributors, got {n}"
        )),
        _ => {}
    }
    for row in &impacts.scenarios {
        if let Some(impact) = &row.marginal_impact {
            if impact.interest_pct.is_none() || impact.duration_pct.is_none() {
                warnings.push(format!(
                    "Impact ratios for '{}' are undefined: ALL baseline total is zero",
                    row.label
                ));
            }
        }
    }

    let selection = match &input.selected {
        Some(selected) => {
            let schedule = schedule_with_contributors(&input.loans, &contributions, selected)?;
            let scenario = impacts.row_for_selection(selected)?.cloned();
            Some(SelectionView {
                contributors: in_roster_order(&impacts.roster, selected),
                scenario,
                schedule,
            })
        }
        None => None,
    };

    let output = ImpactOutput { impacts, selection };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Contributor impact analysis — portfolio re-amortized per contributor subset, compared to ALL",
        &serde_json::json!({
            "loan_count": input.loans.len(),
            "contributors": output.impacts.roster,
            "prune_idle_contributors": input.prune_idle_contributors,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn run_scenario<S: AsRef<str>>(
    loans: &[LoanTerms],
    contributions: &[Vec<Contribution>],
    paying: &[S],
) -> LoanImpactResult<AggregateResult> {
    let terms = loans
        .iter()
        .zip(contributions)
        .map(|(loan, loan_contributions)| -> LoanImpactResult<LoanTerms> {
            let extra = contributed_amount(loan_contributions, paying)?
                .checked_add(loan.extra_payment)
                .ok_or_else(|| overflow("contributions"))?;
            Ok(loan.clone().with_extra_payment(extra))
        })
        .collect::<LoanImpactResult<Vec<LoanTerms>>>()?;
    Portfolio::from_terms(&terms)?.aggregate()
}

fn duration_of(result: &AggregateResult) -> u32 {
    result.time_to_termination.unwrap_or(0)
}

fn marginal_impact(
    label: &str,
    interest: Money,
    duration: u32,
    baseline_interest: Money,
    baseline_duration: u32,
) -> MarginalImpact {
    let interest_diff = interest - baseline_interest;
    let duration_diff = i64::from(duration) - i64::from(baseline_duration);

    let interest_pct = interest_diff.checked_div(baseline_interest);
    let duration_pct = Decimal::from(duration_diff).checked_div(Decimal::from(baseline_duration));
    if interest_pct.is_none() || duration_pct.is_none() {
        warn!(scenario = label, "ALL baseline is zero; impact ratio undefined");
    }

    MarginalImpact {
        interest: interest_diff,
        duration: duration_diff,
        interest_pct,
        duration_pct,
    }
}

fn in_roster_order<S: AsRef<str>>(roster: &[String], selected: &[S]) -> Vec<String> {
    roster
        .iter()
        .filter(|name| selected.iter().any(|s| s.as_ref() == name.as_str()))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan() -> LoanTerms {
        LoanTerms::new(dec!(10000), dec!(6), dec!(200))
    }

    fn three_contributors() -> Vec<Vec<Contribution>> {
        vec![vec![
            Contribution::new("A", dec!(20)),
            Contribution::new("B", dec!(20)),
            Contribution::new("C", dec!(0)),
        ]]
    }

    fn labels(table: &ImpactTable) -> Vec<&str> {
        table.scenarios.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_three_contributors_produce_eight_rows() {
        let table = compute_impacts(&[loan()], &three_contributors()).unwrap();
        assert_eq!(
            labels(&table),
            vec!["ALL", "None", "A", "B", "C", "B and C", "A and C", "A and B"]
        );
    }

    #[test]
    fn test_baseline_has_no_marginal_impact() {
        let table = compute_impacts(&[loan()], &three_contributors()).unwrap();
        let all = table.baseline().unwrap();
        assert_eq!(all.kind, ScenarioKind::AllContributions);
        assert!(all.marginal_impact.is_none());
        assert!(table.scenarios[1..].iter().all(|s| s.marginal_impact.is_some()));
    }

    #[test]
    fn test_none_row_matches_no_extra_schedule() {
        let table = compute_impacts(&[loan()], &three_contributors()).unwrap();
        let none = table.row("None").unwrap();
        let all = table.baseline().unwrap();

        assert_eq!(none.duration, 58);
        assert_eq!(all.duration, 47);
        let impact = none.marginal_impact.as_ref().unwrap();
        assert_eq!(impact.duration, 11);
        assert_eq!(impact.interest, none.total_interest_paid - all.total_interest_paid);
        assert_eq!(
            impact.interest_pct,
            Some(impact.interest / all.total_interest_paid)
        );
    }

    #[test]
    fn test_removing_help_never_reduces_interest() {
        let table = compute_impacts(&[loan()], &three_contributors()).unwrap();
        for row in &table.scenarios[1..] {
            let impact = row.marginal_impact.as_ref().unwrap();
            assert!(
                impact.interest >= Decimal::ZERO,
                "{}: interest impact {} should be non-negative",
                row.label,
                impact.interest
            );
            assert!(impact.duration >= 0);
        }
    }

    #[test]
    fn test_omitting_zero_contributor_matches_all() {
        let table = compute_impacts(&[loan()], &three_contributors()).unwrap();
        let a_and_b = table.row("A and B").unwrap();
        let impact = a_and_b.marginal_impact.as_ref().unwrap();
        assert_eq!(impact.interest, Decimal::ZERO);
        assert_eq!(impact.duration, 0);
    }

    #[test]
    fn test_two_contributors_skip_omission() {
        let contributions = vec![vec![
            Contribution::new("A", dec!(20)),
            Contribution::new("B", dec!(10)),
        ]];
        let table = compute_impacts(&[loan()], &contributions).unwrap();
        assert_eq!(labels(&table), vec!["ALL", "None", "A", "B"]);
    }

    #[test]
    fn test_single_contributor_only_baselines() {
        let contributions = vec![vec![Contribution::new("A", dec!(50))]];
        let table = compute_impacts(&[loan()], &contributions).unwrap();
        assert_eq!(labels(&table), vec!["ALL", "None"]);
    }

    #[test]
    fn test_four_contributors_skip_omission() {
        let contributions = vec![vec![
            Contribution::new("A", dec!(5)),
            Contribution::new("B", dec!(5)),
            Contribution::new("C", dec!(5)),
            Contribution::new("D", dec!(5)),
        ]];
        let table = compute_impacts(&[loan()], &contributions).unwrap();
        assert_eq!(table.scenarios.len(), 6);
    }

    #[test]
    fn test_row_for_selection() {
        let table = compute_impacts(&[loan()], &three_contributors()).unwrap();

        let all = table.row_for_selection(&["C", "B", "A"]).unwrap().unwrap();
        assert_eq!(all.label, "ALL");
        let none = table.row_for_selection::<&str>(&[]).unwrap().unwrap();
        assert_eq!(none.label, "None");
        let pair = table.row_for_selection(&["C", "A"]).unwrap().unwrap();
        assert_eq!(pair.label, "A and C");
        assert!(table.row_for_selection(&["Z"]).is_err());
    }

    #[test]
    fn test_schedule_with_selected_contributors() {
        let contributions = three_contributors();
        let only_a = schedule_with_contributors(&[loan()], &contributions, &["A"]).unwrap();
        let table = compute_impacts(&[loan()], &contributions).unwrap();

        assert_eq!(
            only_a.total_interest_paid,
            table.row("A").unwrap().total_interest_paid
        );
    }

    #[test]
    fn test_zero_baseline_leaves_ratios_undefined() {
        let impact = marginal_impact("None", Decimal::ZERO, 0, Decimal::ZERO, 0);
        assert_eq!(impact.interest, Decimal::ZERO);
        assert_eq!(impact.duration, 0);
        assert_eq!(impact.interest_pct, None);
        assert_eq!(impact.duration_pct, None);

        let impact = marginal_impact("A", dec!(120), 12, Decimal::ZERO, 0);
        assert_eq!(impact.interest, dec!(120));
        assert_eq!(impact.duration, 12);
        assert!(impact.interest_pct.is_none() && impact.duration_pct.is_none());
    }

    #[test]
    fn test_huge_contribution_is_an_error_not_a_panic() {
        let contributions = vec![vec![
            Contribution::new("A", dec!(5e28)),
            Contribution::new("B", dec!(5e28)),
        ]];
        assert!(matches!(
            compute_impacts(&[loan()], &contributions),
            Err(LoanImpactError::InvalidLoanParameters { .. })
        ));
    }

    #[test]
    fn test_mismatched_lists_rejected() {
        let result = compute_impacts(&[loan(), loan()], &three_contributors());
        assert!(matches!(
            result,
            Err(LoanImpactError::InconsistentContributorSet(_))
        ));
    }

    #[test]
    fn test_analyze_with_pruning_and_selection() {
        let input = ImpactInput {
            loans: vec![loan()],
            contributions: three_contributors(),
            prune_idle_contributors: true,
            selected: Some(vec!["B".into()]),
        };
        let result = analyze_contribution_impacts(&input).unwrap();
        let out = &result.result;

        assert_eq!(out.impacts.roster, vec!["A", "B"]);
        assert_eq!(out.impacts.scenarios.len(), 4);
        let selection = out.selection.as_ref().unwrap();
        assert_eq!(selection.scenario.as_ref().unwrap().label, "B");
        assert!(result.warnings.iter().any(|w| w.contains("Dropped contributors")));
    }

    #[test]
    fn test_analyze_without_contributions() {
        let input = ImpactInput {
            loans: vec![loan()],
            contributions: vec![],
            prune_idle_contributors: false,
            selected: None,
        };
        let result = analyze_contribution_impacts(&input).unwrap();
        let table = &result.result.impacts;
        assert_eq!(labels(table), vec!["ALL", "None"]);
        assert_eq!(table.scenarios[1].marginal_impact.as_ref().unwrap().duration, 0);
    }
}
