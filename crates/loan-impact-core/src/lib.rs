pub mod error;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "impacts")]
pub mod impacts;

pub use error::LoanImpactError;
pub use types::*;

/// Standard result type for all loan-impact operations
pub type LoanImpactResult<T> = Result<T, LoanImpactError>;
