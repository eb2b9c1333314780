//! Journal entry lifecycle state machine.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (EntryStatus, WorkflowAction)
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{EntryStatus, WorkflowAction};
