//! Journal service tests against the in-memory store.

use std::collections::HashSet;

use chrono::Duration;
use ledgerline_shared::types::{JournalEntryId, UserId};
use rust_decimal_macros::dec;

use crate::clock::Clock;
use crate::journal::EntryNumbering;
use crate::ledger::error::LedgerError;
use crate::ledger::types::{Adjustment, AdjustmentKind, EntryNumber, Side};
use crate::ledger::validation::{LineInput, ValidationError};
use crate::store::{FailPoint, InMemoryStore};
use crate::test_support::{Fixture, date, money};
use crate::workflow::{EntryStatus, WorkflowError};

fn sale(f: &Fixture) -> Vec<LineInput> {
    vec![
        LineInput::debit(f.cash.id, money(dec!(1000))),
        LineInput::credit(f.sales.id, money(dec!(1000))),
    ]
}

#[tokio::test]
async fn test_create_numbers_and_totals_a_draft() {
    let f = Fixture::new().await;

    let first = f.draft(&sale(&f)).await;
    assert_eq!(first.entry_number, EntryNumber::new(1));
    assert_eq!(first.status, EntryStatus::Draft);
    assert_eq!(first.total_debit, money(dec!(1000)));
    assert_eq!(first.total_credit, money(dec!(1000)));
    assert!(first.is_balanced);
    assert_eq!(first.lines.len(), 2);
    assert_eq!(first.lines[0].side, Side::Debit);
    assert_eq!(first.lines[1].line_number, 2);
    assert_eq!(first.fiscal_period_id, f.january.fiscal_period_id);
    assert_eq!(first.created_by, f.actor);

    let second = f.draft(&sale(&f)).await;
    assert_eq!(second.entry_number, EntryNumber::new(2));

    let stored = f.journal.get(first.id).await.unwrap();
    assert_eq!(stored, first);
}

#[tokio::test]
async fn test_unbalanced_create_persists_nothing() {
    let f = Fixture::new().await;
    let lines = [
        LineInput::debit(f.cash.id, money(dec!(100.00))),
        LineInput::credit(f.sales.id, money(dec!(99.98))),
    ];

    let err = f
        .journal
        .create(f.header(f.january.id, date(2026, 1, 10)), &lines, f.actor)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::Unbalanced { .. })
    ));
    assert_eq!(f.store.entry_count().await, 0);
    assert_eq!(f.store.line_count().await, 0);
    assert_eq!(f.store.counter().await, Some(0));
}

#[tokio::test]
async fn test_one_cent_difference_is_accepted() {
    let f = Fixture::new().await;
    let entry = f
        .draft(&[
            LineInput::debit(f.cash.id, money(dec!(100.00))),
            LineInput::credit(f.sales.id, money(dec!(99.99))),
        ])
        .await;
    assert!(entry.is_balanced);
    assert_eq!(entry.total_debit, money(dec!(100.00)));
    assert_eq!(entry.total_credit, money(dec!(99.99)));
}

#[tokio::test]
async fn test_group_and_unknown_accounts_are_rejected() {
    let f = Fixture::new().await;
    let header = f.header(f.january.id, date(2026, 1, 10));

    let err = f
        .journal
        .create(
            header.clone(),
            &[
                LineInput::debit(f.assets.id, money(dec!(10))),
                LineInput::credit(f.sales.id, money(dec!(10))),
            ],
            f.actor,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::ParentAccount { line: 1, .. })
    ));

    let unknown = ledgerline_shared::types::AccountId::new();
    let err = f
        .journal
        .create(
            header,
            &[
                LineInput::debit(f.cash.id, money(dec!(10))),
                LineInput::credit(unknown, money(dec!(10))),
            ],
            f.actor,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::UnknownAccount { line: 2, account_id }) if account_id == unknown
    ));
}

#[tokio::test]
async fn test_create_respects_period_state_and_range() {
    let f = Fixture::new().await;

    let err = f
        .journal
        .create(f.header(f.january.id, date(2026, 2, 3)), &sale(&f), f.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DateOutOfRange { .. }));

    let mut lenient = f.january.clone();
    lenient.allow_out_of_range_dates = true;
    f.store.add_period(lenient).await;
    f.journal
        .create(f.header(f.january.id, date(2026, 2, 3)), &sale(&f), f.actor)
        .await
        .unwrap();

    let mut closed = f.february.clone();
    closed.is_closed = true;
    f.store.add_period(closed).await;
    let err = f
        .journal
        .create(f.header(f.february.id, date(2026, 2, 3)), &sale(&f), f.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodClosed { .. }));

    let err = f
        .journal
        .create(
            f.header(ledgerline_shared::types::MonthlyPeriodId::new(), date(2026, 2, 3)),
            &sale(&f),
            f.actor,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodNotFound(_)));
}

#[tokio::test]
async fn test_dates_inside_a_closed_period_are_rejected_from_any_period() {
    let f = Fixture::new().await;
    let mut closed = f.january.clone();
    closed.is_closed = true;
    f.store.add_period(closed).await;
    let mut lenient = f.february.clone();
    lenient.allow_out_of_range_dates = true;
    f.store.add_period(lenient).await;

    let err = f
        .journal
        .create(f.header(f.february.id, date(2026, 1, 15)), &sale(&f), f.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodClosed { ref period } if period == "January 2026"));
    assert_eq!(f.store.entry_count().await, 0);

    let entry = f
        .journal
        .create(f.header(f.february.id, date(2026, 2, 3)), &sale(&f), f.actor)
        .await
        .unwrap();
    let err = f
        .journal
        .update(
            entry.id,
            f.header(f.february.id, date(2026, 1, 31)),
            &sale(&f),
            f.actor,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodClosed { .. }));
    assert_eq!(f.journal.get(entry.id).await.unwrap(), entry);

    let outside = f
        .journal
        .create(f.header(f.february.id, date(2026, 3, 2)), &sale(&f), f.actor)
        .await
        .unwrap();
    assert_eq!(outside.monthly_period_id, f.february.id);
}

#[tokio::test]
async fn test_adjustment_must_reference_an_existing_entry() {
    let f = Fixture::new().await;
    let original = f.draft(&sale(&f)).await;

    let mut header = f.header(f.january.id, date(2026, 1, 31));
    header.adjustment = Some(Adjustment {
        kind: AdjustmentKind::Correction,
        adjusts_entry_id: Some(JournalEntryId::new()),
    });
    let err = f
        .journal
        .create(header.clone(), &sale(&f), f.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::EntryNotFound(_)));

    header.adjustment = Some(Adjustment {
        kind: AdjustmentKind::Correction,
        adjusts_entry_id: Some(original.id),
    });
    let adjusting = f.journal.create(header, &sale(&f), f.actor).await.unwrap();
    assert_eq!(
        adjusting.adjustment.and_then(|a| a.adjusts_entry_id),
        Some(original.id)
    );
}

#[tokio::test]
async fn test_update_replaces_lines_and_keeps_number() {
    let f = Fixture::new().await;
    let entry = f.draft(&sale(&f)).await;
    f.clock.advance(Duration::minutes(10));
    let editor = UserId::new();

    let mut header = f.header(f.january.id, date(2026, 1, 20));
    header.description = "Corrected sale".to_string();
    let updated = f
        .journal
        .update(
            entry.id,
            header,
            &[
                LineInput::debit(f.cash.id, money(dec!(700))),
                LineInput::debit(f.bank.id, money(dec!(500))),
                LineInput::credit(f.sales.id, money(dec!(1200))),
            ],
            editor,
        )
        .await
        .unwrap();

    assert_eq!(updated.entry_number, entry.entry_number);
    assert_eq!(updated.status, EntryStatus::Draft);
    assert_eq!(updated.description, "Corrected sale");
    assert_eq!(updated.total_debit, money(dec!(1200)));
    assert_eq!(updated.updated_by, editor);
    assert_eq!(updated.updated_at, entry.created_at + Duration::minutes(10));
    assert_eq!(updated.created_at, entry.created_at);
    assert_eq!(f.store.line_count().await, 3);
    assert_eq!(f.journal.get(entry.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_update_of_approved_entry_is_rejected() {
    let f = Fixture::new().await;
    let entry = f.approved(&sale(&f)).await;

    let err = f
        .journal
        .update(
            entry.id,
            f.header(f.january.id, date(2026, 1, 15)),
            &[
                LineInput::debit(f.cash.id, money(dec!(1))),
                LineInput::credit(f.sales.id, money(dec!(1))),
            ],
            f.actor,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Workflow(WorkflowError::ImmutableEntry {
            status: EntryStatus::Approved
        })
    ));
    assert_eq!(f.journal.get(entry.id).await.unwrap().lines, entry.lines);
}

#[tokio::test]
async fn test_failed_update_keeps_original_lines() {
    let f = Fixture::new().await;
    let entry = f.draft(&sale(&f)).await;
    f.store.fail_on(FailPoint::InsertLines);

    let err = f
        .journal
        .update(
            entry.id,
            f.header(f.january.id, date(2026, 1, 15)),
            &[
                LineInput::debit(f.bank.id, money(dec!(5))),
                LineInput::credit(f.sales.id, money(dec!(5))),
            ],
            f.actor,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Store(_)));
    f.store.clear_failures();
    assert_eq!(f.journal.get(entry.id).await.unwrap(), entry);
}

#[tokio::test]
async fn test_lifecycle_submit_approve() {
    let f = Fixture::new().await;
    let entry = f.draft(&sale(&f)).await;
    let approver = UserId::new();

    let pending = f.journal.submit(entry.id, f.actor).await.unwrap();
    assert_eq!(pending.status, EntryStatus::Pending);
    assert_eq!(pending.submitted_by, Some(f.actor));

    let err = f.journal.submit(entry.id, f.actor).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Workflow(WorkflowError::InvalidTransition { .. })
    ));

    let approved = f.journal.approve(entry.id, approver).await.unwrap();
    assert_eq!(approved.status, EntryStatus::Approved);
    assert_eq!(approved.approved_by, Some(approver));
    assert_eq!(approved.approved_at, Some(f.clock.now()));

    let err = f.journal.void(entry.id, approver, "Too late").await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Workflow(WorkflowError::InvalidTransition {
            from: EntryStatus::Approved,
            to: EntryStatus::Voided
        })
    ));
}

#[tokio::test]
async fn test_void_records_reason_in_notes() {
    let f = Fixture::new().await;
    let mut header = f.header(f.january.id, date(2026, 1, 15));
    header.notes = Some("Imported".to_string());
    let entry = f.journal.create(header, &sale(&f), f.actor).await.unwrap();

    let err = f.journal.void(entry.id, f.actor, "   ").await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Workflow(WorkflowError::VoidReasonRequired)
    ));
    assert_eq!(f.journal.get(entry.id).await.unwrap().status, EntryStatus::Draft);

    let voided = f.journal.void(entry.id, f.actor, "Duplicate").await.unwrap();
    assert_eq!(voided.status, EntryStatus::Voided);
    assert_eq!(voided.void_reason.as_deref(), Some("Duplicate"));
    assert_eq!(voided.description, entry.description);
    assert_eq!(
        voided.notes.as_deref(),
        Some(format!("Imported\n[VOIDED 2026-02-01T09:00:00Z by {}] Duplicate", f.actor).as_str())
    );
}

#[tokio::test]
async fn test_delete_removes_editable_entries_only() {
    let f = Fixture::new().await;
    let draft = f.draft(&sale(&f)).await;
    let approved = f.approved(&sale(&f)).await;

    f.journal.delete(draft.id).await.unwrap();
    assert!(matches!(
        f.journal.get(draft.id).await,
        Err(LedgerError::EntryNotFound(id)) if id == draft.id
    ));

    let err = f.journal.delete(approved.id).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Workflow(WorkflowError::ImmutableEntry { .. })
    ));
    assert_eq!(f.store.entry_count().await, 1);
    assert_eq!(f.store.line_count().await, 2);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_numbers() {
    let f = Fixture::new().await;
    let lines = sale(&f);
    let creates = (0..20).map(|_| {
        let journal = f.journal.clone();
        let header = f.header(f.january.id, date(2026, 1, 15));
        let lines = lines.clone();
        let actor = f.actor;
        tokio::spawn(async move { journal.create(header, &lines, actor).await })
    });

    let results = futures::future::join_all(creates).await;
    let numbers: HashSet<u64> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap().entry_number.value())
        .collect();

    assert_eq!(numbers, (1..=20).collect::<HashSet<u64>>());
    assert_eq!(f.store.counter().await, Some(20));
}

#[tokio::test]
async fn test_failed_insert_releases_its_number() {
    let f = Fixture::new().await;
    f.store.fail_on(FailPoint::InsertEntry);
    let err = f
        .journal
        .create(f.header(f.january.id, date(2026, 1, 15)), &sale(&f), f.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)));
    assert_eq!(f.store.counter().await, Some(0));

    f.store.clear_failures();
    assert_eq!(f.draft(&sale(&f)).await.entry_number, EntryNumber::new(1));
}

#[tokio::test]
async fn test_failed_commit_persists_nothing() {
    let f = Fixture::new().await;
    f.store.fail_on(FailPoint::Commit);
    assert!(
        f.journal
            .create(f.header(f.january.id, date(2026, 1, 15)), &sale(&f), f.actor)
            .await
            .is_err()
    );
    f.store.clear_failures();
    assert_eq!(f.store.entry_count().await, 0);
    assert_eq!(f.store.counter().await, Some(0));
}

#[tokio::test]
async fn test_stale_counter_reports_duplicate_number() {
    let f = Fixture::new().await;
    let mut existing = f.draft(&sale(&f)).await;
    // Simulate an entry written behind the counter's back.
    existing.id = JournalEntryId::new();
    existing.entry_number = EntryNumber::new(2);
    f.store.add_entry(existing).await;

    let err = f
        .journal
        .create(f.header(f.january.id, date(2026, 1, 15)), &sale(&f), f.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::DuplicateEntryNumber(n) if n == EntryNumber::new(2)
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_missing_counter() {
    let strict = Fixture::with(InMemoryStore::without_counter(), EntryNumbering::strict()).await;
    let err = strict
        .journal
        .create(strict.header(strict.january.id, date(2026, 1, 15)), &sale(&strict), strict.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CounterUnavailable));

    let lenient = Fixture::with(
        InMemoryStore::without_counter(),
        EntryNumbering::with_scan_fallback(),
    )
    .await;
    assert_eq!(lenient.draft(&sale(&lenient)).await.entry_number, EntryNumber::new(1));
    assert_eq!(lenient.draft(&sale(&lenient)).await.entry_number, EntryNumber::new(2));
    assert_eq!(lenient.store.counter().await, Some(2));
}

#[tokio::test]
async fn test_validate_balance_writes_nothing() {
    let f = Fixture::new().await;

    let check = f.journal.validate_balance(&sale(&f)).await.unwrap();
    assert!(check.valid);
    assert_eq!(check.total_debit, money(dec!(1000)));

    let check = f
        .journal
        .validate_balance(&[
            LineInput::debit(f.cash.id, money(dec!(100))),
            LineInput::credit(f.sales.id, money(dec!(90))),
        ])
        .await
        .unwrap();
    assert!(!check.valid);
    assert_eq!(check.difference, money(dec!(10)));

    assert_eq!(f.store.entry_count().await, 0);
    assert_eq!(f.store.counter().await, Some(0));
}
