//! Journal entry numbering and lifecycle.

pub mod numbering;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use numbering::EntryNumbering;
pub use service::JournalService;
