pub mod analyzer;
pub mod contribution;

pub use analyzer::{compute_impacts, ImpactScenario, ImpactTable, MarginalImpact, ScenarioKind};
pub use contribution::Contribution;
