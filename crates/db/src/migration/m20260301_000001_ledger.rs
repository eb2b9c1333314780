//! Ledger schema: chart of accounts, periods, journal entries, and the
//! entry number counter.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(PERIODS_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRY_LINES_SQL).await?;
        db.execute_unprepared(ENTRY_COUNTERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_class AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense',
    'cost',
    'memo'
);

CREATE TYPE entry_side AS ENUM ('debit', 'credit');

CREATE TYPE entry_status AS ENUM (
    'draft',
    'pending',
    'approved',
    'posted',
    'voided'
);

CREATE TYPE adjustment_kind AS ENUM (
    'depreciation',
    'accrual',
    'deferral',
    'prepayment',
    'provision',
    'correction',
    'other'
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    class account_class NOT NULL,
    normal_side entry_side NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    is_group BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_code UNIQUE (code)
);

CREATE INDEX idx_accounts_parent ON accounts(parent_id);
";

const PERIODS_SQL: &str = r"
CREATE TABLE fiscal_periods (
    id UUID PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_closed BOOLEAN NOT NULL DEFAULT false,
    CONSTRAINT chk_fiscal_period_dates CHECK (end_date >= start_date)
);

CREATE TABLE monthly_periods (
    id UUID PRIMARY KEY,
    fiscal_period_id UUID NOT NULL REFERENCES fiscal_periods(id),
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_closed BOOLEAN NOT NULL DEFAULT false,
    closed_by UUID,
    closed_at TIMESTAMPTZ,
    allow_out_of_range_dates BOOLEAN NOT NULL DEFAULT false,
    has_opening_balance BOOLEAN NOT NULL DEFAULT false,
    opening_entry_id UUID,
    CONSTRAINT chk_monthly_period_dates CHECK (end_date >= start_date)
);

CREATE INDEX idx_monthly_periods_fiscal ON monthly_periods(fiscal_period_id);
CREATE INDEX idx_monthly_periods_dates ON monthly_periods(start_date, end_date);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    entry_number BIGINT NOT NULL,
    entry_date DATE NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(100),
    monthly_period_id UUID NOT NULL REFERENCES monthly_periods(id),
    fiscal_period_id UUID NOT NULL REFERENCES fiscal_periods(id),
    total_debit NUMERIC(19, 2) NOT NULL,
    total_credit NUMERIC(19, 2) NOT NULL,
    is_balanced BOOLEAN NOT NULL,
    status entry_status NOT NULL DEFAULT 'draft',
    adjustment_kind adjustment_kind,
    adjusts_entry_id UUID REFERENCES journal_entries(id),
    is_opening BOOLEAN NOT NULL DEFAULT false,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_by UUID NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    submitted_by UUID,
    submitted_at TIMESTAMPTZ,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    voided_by UUID,
    voided_at TIMESTAMPTZ,
    void_reason TEXT,
    CONSTRAINT uq_journal_entries_entry_number UNIQUE (entry_number),
    CONSTRAINT chk_journal_entries_balanced CHECK (
        is_balanced AND abs(total_debit - total_credit) <= 0.01
    )
);

CREATE UNIQUE INDEX uq_journal_entries_opening_period
    ON journal_entries(monthly_period_id) WHERE is_opening;
CREATE INDEX idx_journal_entries_period_status ON journal_entries(monthly_period_id, status);
CREATE INDEX idx_journal_entries_date_status ON journal_entries(entry_date, status);

ALTER TABLE monthly_periods
    ADD CONSTRAINT fk_monthly_periods_opening_entry
    FOREIGN KEY (opening_entry_id) REFERENCES journal_entries(id);
";

const JOURNAL_ENTRY_LINES_SQL: &str = r"
CREATE TABLE journal_entry_lines (
    id UUID PRIMARY KEY,
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    side entry_side NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    description TEXT,
    CONSTRAINT uq_journal_entry_lines_entry_account UNIQUE (journal_entry_id, account_id),
    CONSTRAINT chk_journal_entry_lines_amount CHECK (amount > 0)
);

CREATE INDEX idx_journal_entry_lines_account ON journal_entry_lines(account_id);
";

const ENTRY_COUNTERS_SQL: &str = r"
CREATE TABLE entry_counters (
    name VARCHAR(50) PRIMARY KEY,
    value BIGINT NOT NULL
);

INSERT INTO entry_counters (name, value) VALUES ('journal_entry', 0);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS entry_counters;
ALTER TABLE IF EXISTS monthly_periods DROP CONSTRAINT IF EXISTS fk_monthly_periods_opening_entry;
DROP TABLE IF EXISTS journal_entry_lines;
DROP TABLE IF EXISTS journal_entries;
DROP TABLE IF EXISTS monthly_periods;
DROP TABLE IF EXISTS fiscal_periods;
DROP TABLE IF EXISTS accounts;
DROP TYPE IF EXISTS adjustment_kind;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS entry_side;
DROP TYPE IF EXISTS account_class;
";
