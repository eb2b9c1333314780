//! Shared fixtures for service tests.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use ledgerline_shared::types::{Amount, FiscalPeriodId, MonthlyPeriodId, UserId};
use rust_decimal::Decimal;

use crate::clock::FixedClock;
use crate::journal::{EntryNumbering, JournalService};
use crate::ledger::types::{Account, AccountClass, EntryHeader, JournalEntry};
use crate::ledger::validation::LineInput;
use crate::period::{MonthlyPeriod, PeriodService};
use crate::store::InMemoryStore;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn money(value: Decimal) -> Amount {
    Amount::from(value)
}

/// A small chart of accounts, January and February 2026, and both services
/// wired to one in-memory store.
pub(crate) struct Fixture {
    pub store: InMemoryStore,
    pub clock: Arc<FixedClock>,
    pub journal: JournalService,
    pub periods: PeriodService,
    pub actor: UserId,
    pub assets: Account,
    pub cash: Account,
    pub bank: Account,
    pub loan: Account,
    pub capital: Account,
    pub retained: Account,
    pub sales: Account,
    pub rent: Account,
    pub january: MonthlyPeriod,
    pub february: MonthlyPeriod,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with(InMemoryStore::new(), EntryNumbering::strict()).await
    }

    pub async fn with(store: InMemoryStore, numbering: EntryNumbering) -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
        ));

        let assets = Account {
            is_group: true,
            ..Account::new("1000", "Assets", AccountClass::Asset)
        };
        let cash = Account {
            parent_id: Some(assets.id),
            ..Account::new("1100", "Cash", AccountClass::Asset)
        };
        let bank = Account {
            parent_id: Some(assets.id),
            ..Account::new("1200", "Bank", AccountClass::Asset)
        };
        let loan = Account::new("2100", "Bank loan", AccountClass::Liability);
        let capital = Account::new("3100", "Share capital", AccountClass::Equity);
        let retained = Account::new("3200", "Retained earnings", AccountClass::Equity);
        let sales = Account::new("4100", "Sales", AccountClass::Revenue);
        let rent = Account::new("6100", "Rent", AccountClass::Expense);
        for account in [&assets, &cash, &bank, &loan, &capital, &retained, &sales, &rent] {
            store.add_account(account.clone()).await;
        }

        let fiscal = FiscalPeriodId::new();
        let january = MonthlyPeriod::new(fiscal, "January 2026", date(2026, 1, 1), date(2026, 1, 31));
        let february = MonthlyPeriod::new(fiscal, "February 2026", date(2026, 2, 1), date(2026, 2, 28));
        store.add_period(january.clone()).await;
        store.add_period(february.clone()).await;

        let shared: Arc<InMemoryStore> = Arc::new(store.clone());
        Self {
            journal: JournalService::new(shared.clone(), clock.clone(), numbering),
            periods: PeriodService::new(shared, clock.clone(), numbering),
            store,
            clock,
            actor: UserId::new(),
            assets,
            cash,
            bank,
            loan,
            capital,
            retained,
            sales,
            rent,
            january,
            february,
        }
    }

    pub fn header(&self, period: MonthlyPeriodId, entry_date: NaiveDate) -> EntryHeader {
        EntryHeader {
            entry_date,
            description: "Test entry".to_string(),
            reference: None,
            monthly_period_id: period,
            adjustment: None,
            notes: None,
        }
    }

    /// Creates a draft in January.
    pub async fn draft(&self, lines: &[LineInput]) -> JournalEntry {
        self.journal
            .create(self.header(self.january.id, date(2026, 1, 15)), lines, self.actor)
            .await
            .unwrap()
    }

    /// Creates and approves an entry in January.
    pub async fn approved(&self, lines: &[LineInput]) -> JournalEntry {
        let entry = self.draft(lines).await;
        self.journal.approve(entry.id, self.actor).await.unwrap()
    }
}
