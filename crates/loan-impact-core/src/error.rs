use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanImpactError {
    #[error("Invalid loan parameters: {field} — {reason}")]
    InvalidLoanParameters { field: String, reason: String },

    #[error("Inconsistent contributor set: {0}")]
    InconsistentContributorSet(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanImpactError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanImpactError::InvalidLoanParameters {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoanImpactError {
    fn from(e: serde_json::Error) -> Self {
        LoanImpactError::SerializationError(e.to_string())
    }
}
