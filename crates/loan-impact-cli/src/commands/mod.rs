pub mod impacts;
pub mod portfolio;
pub mod schedule;
