//! Application-wide error taxonomy.
//!
//! Every service error maps to exactly one [`ErrorCategory`], which decides
//! how the failure is reported to callers and whether a retry can help.

use std::fmt;

use serde::Serialize;

/// Broad classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Structural or arithmetic problem with entry lines; user-correctable.
    Validation,
    /// Illegal lifecycle transition, such as editing an approved entry.
    State,
    /// Closed period, date out of range, or period not ready for transition.
    Period,
    /// Lost a race (duplicate number, already-reopened period); retry may succeed.
    Concurrency,
    /// The persistent store failed; nothing was applied.
    Store,
    /// A self-generated artifact failed its own consistency check.
    InternalInvariant,
    /// The referenced entity does not exist.
    NotFound,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::State | Self::Period => 422,
            Self::NotFound => 404,
            Self::Concurrency => 409,
            Self::Store | Self::InternalInvariant => 500,
        }
    }

    /// Returns the snake_case name used in logs and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::State => "state",
            Self::Period => "period",
            Self::Concurrency => "concurrency",
            Self::Store => "store",
            Self::InternalInvariant => "internal_invariant",
            Self::NotFound => "not_found",
        }
    }

    /// Returns true if retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Concurrency)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
