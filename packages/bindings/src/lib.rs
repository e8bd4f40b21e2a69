use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_schedule(input_json: String) -> NapiResult<String> {
    let input: loan_impact_core::amortization::schedule::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_impact_core::amortization::schedule::model_loan_schedule(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize_portfolio(input_json: String) -> NapiResult<String> {
    let input: loan_impact_core::portfolio::aggregate::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_impact_core::portfolio::aggregate::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Contributor impacts
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_impacts(input_json: String) -> NapiResult<String> {
    let input: loan_impact_core::impacts::analyzer::ImpactInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_impact_core::impacts::analyzer::analyze_contribution_impacts(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
