pub mod schedule;

pub use schedule::{compute_schedule, LoanSchedule, LoanTerms, PaymentRecord};
