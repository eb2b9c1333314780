//! In-memory ledger store.
//!
//! Transactions are serialized behind an async mutex. Each transaction
//! works on a private copy of the state, which replaces the shared state
//! only on commit. Used by tests and by the API test harness.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, Amount, JournalEntryId, MonthlyPeriodId};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::{
    AccountTotals, ENTRY_ACCOUNT_CONSTRAINT, ENTRY_NUMBER_CONSTRAINT, LedgerStore,
    LedgerTransaction, OPENING_ENTRY_CONSTRAINT, StoreError,
};
use crate::ledger::types::{Account, JournalEntry, JournalLine};
use crate::period::types::MonthlyPeriod;
use crate::workflow::EntryStatus;

/// Store operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// `begin`
    Begin,
    /// `insert_entry`
    InsertEntry,
    /// `insert_lines`
    InsertLines,
    /// `update_entry_header`
    UpdateEntryHeader,
    /// `update_monthly_period`
    UpdatePeriod,
    /// `commit`
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    periods: HashMap<MonthlyPeriodId, MonthlyPeriod>,
    // Headers only; lines live in `lines`.
    entries: HashMap<JournalEntryId, JournalEntry>,
    lines: HashMap<JournalEntryId, Vec<JournalLine>>,
    counter: Option<u64>,
}

impl MemoryState {
    fn has_children(&self, id: AccountId) -> bool {
        self.accounts.values().any(|a| a.parent_id == Some(id))
    }

    fn check_lines(&self, entry_id: JournalEntryId, lines: &[JournalLine]) -> Result<(), StoreError> {
        let mut seen: HashSet<AccountId> = self
            .lines
            .get(&entry_id)
            .map(|existing| existing.iter().map(|l| l.account_id).collect())
            .unwrap_or_default();
        for line in lines {
            if !seen.insert(line.account_id) {
                return Err(unique_violation(ENTRY_ACCOUNT_CONSTRAINT));
            }
        }
        Ok(())
    }
}

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation(format!(
        "duplicate key value violates unique constraint \"{constraint}\""
    ))
}

fn header_only(entry: &JournalEntry) -> JournalEntry {
    JournalEntry {
        lines: Vec::new(),
        ..entry.clone()
    }
}

/// A [`LedgerStore`] backed by process memory.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<AsyncMutex<MemoryState>>,
    failures: Arc<Mutex<HashSet<FailPoint>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store with the entry counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(MemoryState {
            counter: Some(0),
            ..MemoryState::default()
        })
    }

    /// Creates an empty store whose counter row is missing.
    #[must_use]
    pub fn without_counter() -> Self {
        Self::with_state(MemoryState::default())
    }

    fn with_state(state: MemoryState) -> Self {
        Self {
            state: Arc::new(AsyncMutex::new(state)),
            failures: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Adds or replaces an account.
    pub async fn add_account(&self, account: Account) {
        self.state.lock().await.accounts.insert(account.id, account);
    }

    /// Adds or replaces a monthly period.
    pub async fn add_period(&self, period: MonthlyPeriod) {
        self.state.lock().await.periods.insert(period.id, period);
    }

    /// Inserts an entry as-is, bypassing validation.
    pub async fn add_entry(&self, entry: JournalEntry) {
        let mut state = self.state.lock().await;
        state.lines.insert(entry.id, entry.lines.clone());
        state.entries.insert(entry.id, header_only(&entry));
    }

    /// Current state of a monthly period.
    pub async fn period(&self, id: MonthlyPeriodId) -> Option<MonthlyPeriod> {
        self.state.lock().await.periods.get(&id).cloned()
    }

    /// Every committed entry with its lines, ordered by entry number.
    pub async fn entries(&self) -> Vec<JournalEntry> {
        let state = self.state.lock().await;
        let mut entries: Vec<JournalEntry> = state
            .entries
            .values()
            .map(|header| JournalEntry {
                lines: state.lines.get(&header.id).cloned().unwrap_or_default(),
                ..header.clone()
            })
            .collect();
        entries.sort_by_key(|e| e.entry_number);
        entries
    }

    /// Number of committed entries.
    pub async fn entry_count(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Number of committed lines across all entries.
    pub async fn line_count(&self) -> usize {
        self.state.lock().await.lines.values().map(Vec::len).sum()
    }

    /// Current counter value, `None` when the row is missing.
    pub async fn counter(&self) -> Option<u64> {
        self.state.lock().await.counter
    }

    /// Makes every later call to `point` fail with a backend error.
    pub fn fail_on(&self, point: FailPoint) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point);
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn check_failure(failures: &Mutex<HashSet<FailPoint>>, point: FailPoint) -> Result<(), StoreError> {
    if failures
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(&point)
    {
        Err(StoreError::Backend(format!("injected failure at {point:?}")))
    } else {
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StoreError> {
        check_failure(&self.failures, FailPoint::Begin)?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            failures: Arc::clone(&self.failures),
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    failures: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryTransaction {
    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        check_failure(&self.failures, point)
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn find_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        let state = &self.working;
        Ok(ids
            .iter()
            .filter_map(|id| state.accounts.get(id))
            .map(|account| Account {
                is_group: account.is_group || state.has_children(account.id),
                ..account.clone()
            })
            .collect())
    }

    async fn find_monthly_period(
        &mut self,
        id: MonthlyPeriodId,
    ) -> Result<Option<MonthlyPeriod>, StoreError> {
        Ok(self.working.periods.get(&id).cloned())
    }

    async fn find_closed_periods_containing(
        &mut self,
        date: NaiveDate,
    ) -> Result<Vec<MonthlyPeriod>, StoreError> {
        let mut periods: Vec<MonthlyPeriod> = self
            .working
            .periods
            .values()
            .filter(|p| p.is_closed && p.contains_date(date))
            .cloned()
            .collect();
        periods.sort_by_key(|p| p.start_date);
        Ok(periods)
    }

    async fn update_monthly_period(&mut self, period: &MonthlyPeriod) -> Result<(), StoreError> {
        self.check(FailPoint::UpdatePeriod)?;
        match self.working.periods.get_mut(&period.id) {
            Some(slot) => {
                *slot = period.clone();
                Ok(())
            }
            None => Err(StoreError::RowNotFound(format!("monthly period {}", period.id))),
        }
    }

    async fn claim_opening_balance(&mut self, id: MonthlyPeriodId) -> Result<bool, StoreError> {
        match self.working.periods.get_mut(&id) {
            Some(period) if !period.has_opening_balance => {
                period.has_opening_balance = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_entry_counter(&mut self) -> Result<Option<u64>, StoreError> {
        Ok(self.working.counter.as_mut().map(|value| {
            *value += 1;
            *value
        }))
    }

    async fn seed_entry_counter(&mut self, value: u64) -> Result<(), StoreError> {
        self.working.counter = Some(value);
        Ok(())
    }

    async fn max_entry_number(&mut self) -> Result<Option<u64>, StoreError> {
        Ok(self
            .working
            .entries
            .values()
            .map(|e| e.entry_number.value())
            .max())
    }

    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.check(FailPoint::InsertEntry)?;
        let state = &mut self.working;
        if state
            .entries
            .values()
            .any(|e| e.entry_number == entry.entry_number)
        {
            return Err(unique_violation(ENTRY_NUMBER_CONSTRAINT));
        }
        if entry.is_opening
            && state
                .entries
                .values()
                .any(|e| e.is_opening && e.monthly_period_id == entry.monthly_period_id)
        {
            return Err(unique_violation(OPENING_ENTRY_CONSTRAINT));
        }
        state.check_lines(entry.id, &entry.lines)?;
        state.entries.insert(entry.id, header_only(entry));
        state.lines.insert(entry.id, entry.lines.clone());
        Ok(())
    }

    async fn find_entry(&mut self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        let state = &self.working;
        Ok(state.entries.get(&id).map(|header| JournalEntry {
            lines: state.lines.get(&id).cloned().unwrap_or_default(),
            ..header.clone()
        }))
    }

    async fn update_entry_header(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.check(FailPoint::UpdateEntryHeader)?;
        match self.working.entries.get_mut(&entry.id) {
            Some(slot) => {
                *slot = header_only(entry);
                Ok(())
            }
            None => Err(StoreError::RowNotFound(format!("journal entry {}", entry.id))),
        }
    }

    async fn insert_lines(
        &mut self,
        entry_id: JournalEntryId,
        lines: &[JournalLine],
    ) -> Result<(), StoreError> {
        self.check(FailPoint::InsertLines)?;
        let state = &mut self.working;
        if !state.entries.contains_key(&entry_id) {
            return Err(StoreError::RowNotFound(format!("journal entry {entry_id}")));
        }
        state.check_lines(entry_id, lines)?;
        state
            .lines
            .entry(entry_id)
            .or_default()
            .extend_from_slice(lines);
        Ok(())
    }

    async fn delete_lines(&mut self, entry_id: JournalEntryId) -> Result<u64, StoreError> {
        let removed = self.working.lines.remove(&entry_id).map_or(0, |l| l.len());
        Ok(removed as u64)
    }

    async fn delete_entry_header(&mut self, entry_id: JournalEntryId) -> Result<(), StoreError> {
        if self.working.lines.get(&entry_id).is_some_and(|l| !l.is_empty()) {
            return Err(StoreError::Backend(format!(
                "journal entry {entry_id} still has lines"
            )));
        }
        match self.working.entries.remove(&entry_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::RowNotFound(format!("journal entry {entry_id}"))),
        }
    }

    async fn account_totals_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[EntryStatus],
    ) -> Result<Vec<AccountTotals>, StoreError> {
        let state = &self.working;
        let mut totals: BTreeMap<AccountId, (Amount, Amount)> = BTreeMap::new();
        let entries = state.entries.values().filter(|e| {
            statuses.contains(&e.status) && e.entry_date >= start && e.entry_date <= end
        });
        for entry in entries {
            for line in state.lines.get(&entry.id).into_iter().flatten() {
                let slot = totals.entry(line.account_id).or_default();
                slot.0 += line.debit();
                slot.1 += line.credit();
            }
        }
        Ok(totals
            .into_iter()
            .map(|(account_id, (debit, credit))| AccountTotals {
                account_id,
                debit,
                credit,
            })
            .collect())
    }

    async fn count_entries_in_period(
        &mut self,
        period: MonthlyPeriodId,
        statuses: &[EntryStatus],
    ) -> Result<u64, StoreError> {
        let count = self
            .working
            .entries
            .values()
            .filter(|e| e.monthly_period_id == period)
            .filter(|e| statuses.is_empty() || statuses.contains(&e.status))
            .count();
        Ok(count as u64)
    }

    async fn find_opening_entry(
        &mut self,
        period: MonthlyPeriodId,
    ) -> Result<Option<JournalEntryId>, StoreError> {
        Ok(self
            .working
            .entries
            .values()
            .find(|e| e.is_opening && e.monthly_period_id == period)
            .map(|e| e.id))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.check(FailPoint::Commit)?;
        let Self {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
