//! Entry number issuance.
//!
//! Numbers come from a single durable counter incremented inside the
//! caller's transaction, so a rolled-back create never consumes a number
//! and concurrent creates serialize on the counter row. Gaps are allowed;
//! duplicates are not.

use ledgerline_shared::config::NumberingConfig;
use tracing::warn;

use crate::ledger::error::LedgerError;
use crate::ledger::types::EntryNumber;
use crate::store::LedgerTransaction;

/// Issues strictly increasing entry numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryNumbering {
    allow_scan_fallback: bool,
}

impl EntryNumbering {
    /// Builds the numbering policy from configuration.
    #[must_use]
    pub fn new(config: &NumberingConfig) -> Self {
        Self {
            allow_scan_fallback: config.allow_scan_fallback,
        }
    }

    /// Counter only. A missing counter is an error.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allow_scan_fallback: false,
        }
    }

    /// Falls back to `max(entry_number) + 1` when the counter is missing.
    ///
    /// Not safe under concurrent writers until the counter is reseeded.
    #[must_use]
    pub fn with_scan_fallback() -> Self {
        Self {
            allow_scan_fallback: true,
        }
    }

    /// Returns true if the scan fallback is enabled.
    #[must_use]
    pub fn allows_scan_fallback(&self) -> bool {
        self.allow_scan_fallback
    }

    /// Issues the next number inside `tx`.
    ///
    /// # Errors
    ///
    /// `CounterUnavailable` when the counter row is missing and the fallback
    /// is disabled; store errors otherwise.
    pub async fn next_number(
        &self,
        tx: &mut dyn LedgerTransaction,
    ) -> Result<EntryNumber, LedgerError> {
        if let Some(value) = tx.increment_entry_counter().await? {
            return Ok(EntryNumber::new(value));
        }
        if !self.allow_scan_fallback {
            return Err(LedgerError::CounterUnavailable);
        }

        let next = tx.max_entry_number().await?.unwrap_or(0) + 1;
        warn!(
            entry_number = next,
            "Entry counter missing, deriving number from existing entries and reseeding"
        );
        tx.seed_entry_counter(next).await?;
        Ok(EntryNumber::new(next))
    }
}
