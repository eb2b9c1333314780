//! Property-based tests for WorkflowService.

use chrono::{DateTime, TimeZone, Utc};
use ledgerline_shared::types::UserId;
use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Strategy for generating random EntryStatus values.
fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Draft),
        Just(EntryStatus::Pending),
        Just(EntryStatus::Approved),
        Just(EntryStatus::Posted),
        Just(EntryStatus::Voided),
    ]
}

/// Strategy for generating random actors.
fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating timestamps within a few years.
fn arb_time() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..150_000_000).prop_map(|secs| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    })
}

/// Strategy for generating non-blank reasons.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every successful action lands on a status `is_valid_transition` allows.
    #[test]
    fn prop_actions_agree_with_transition_table(
        status in arb_status(),
        user in arb_user(),
        at in arb_time(),
        reason in arb_reason(),
    ) {
        let attempts = [
            (EntryStatus::Pending, WorkflowService::submit(status, user, at)),
            (EntryStatus::Approved, WorkflowService::approve(status, user, at)),
            (EntryStatus::Voided, WorkflowService::void(status, user, &reason, at)),
        ];
        for (target, result) in attempts {
            match result {
                Ok(action) => {
                    prop_assert_eq!(action.new_status(), target);
                    prop_assert!(WorkflowService::is_valid_transition(status, target));
                }
                Err(WorkflowError::InvalidTransition { from, to }) => {
                    prop_assert_eq!(from, status);
                    prop_assert_eq!(to, target);
                    prop_assert!(!WorkflowService::is_valid_transition(status, target));
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }

    /// Immutable statuses reject every transition.
    #[test]
    fn prop_terminal_statuses_reject_everything(
        user in arb_user(),
        at in arb_time(),
        reason in arb_reason(),
    ) {
        for status in [EntryStatus::Approved, EntryStatus::Posted, EntryStatus::Voided] {
            prop_assert!(WorkflowService::submit(status, user, at).is_err());
            prop_assert!(WorkflowService::approve(status, user, at).is_err());
            prop_assert!(WorkflowService::void(status, user, &reason, at).is_err());
            prop_assert!(WorkflowService::ensure_editable(status).is_err());
        }
    }

    /// Approval records the actor and time it was given.
    #[test]
    fn prop_approve_records_audit_fields(user in arb_user(), at in arb_time()) {
        let action = WorkflowService::approve(EntryStatus::Pending, user, at).unwrap();
        if let WorkflowAction::Approve { approved_by, approved_at, .. } = action {
            prop_assert_eq!(approved_by, user);
            prop_assert_eq!(approved_at, at);
        } else {
            prop_assert!(false, "Expected Approve action");
        }
    }

    /// Blank reasons are rejected before the status is considered.
    #[test]
    fn prop_blank_void_reason_rejected(status in arb_status(), user in arb_user(), spaces in " {0,5}") {
        prop_assert_eq!(
            WorkflowService::void(status, user, &spaces, Utc::now()).unwrap_err(),
            WorkflowError::VoidReasonRequired
        );
    }
}
