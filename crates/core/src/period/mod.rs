//! Monthly periods: closing and carrying balances forward.
//!
//! - `types` - Periods and transition requests
//! - `closing` - Opening balance computation
//! - `service` - Close and reopen operations

pub mod closing;
pub mod service;
pub mod types;

#[cfg(test)]
mod closing_props;

pub use closing::{OpeningPlan, plan_opening_balances};
pub use service::PeriodService;
pub use types::{MonthlyPeriod, Readiness, ReopenOutcome, ReopenRequest};
