//! Property-based tests for the balance validator.

use std::collections::HashMap;

use ledgerline_shared::types::{AccountId, Amount};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::types::{Account, AccountClass, Side};
use super::validation::{LineAmount, LineInput, ValidationError, validate_lines};

/// Strategy for a positive amount from 0.01 to 1,000,000.00.
fn cents() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

fn amount(cents: i64) -> Amount {
    Amount::from(Decimal::new(cents, 2))
}

/// A chart with `n` postable asset accounts.
fn chart(n: usize) -> HashMap<AccountId, Account> {
    (0..n)
        .map(|i| {
            let account = Account::new(format!("{:04}", 1000 + i), format!("Account {i}"), AccountClass::Asset);
            (account.id, account)
        })
        .collect()
}

/// Debit lines for `debits`, one credit line closing them off by `skew` cents.
fn lines_for(accounts: &[AccountId], debits: &[i64], skew: i64) -> Vec<LineInput> {
    let total: i64 = debits.iter().sum();
    let mut lines: Vec<LineInput> = debits
        .iter()
        .zip(accounts)
        .map(|(c, id)| LineInput::debit(*id, amount(*c)))
        .collect();
    lines.push(LineInput::credit(accounts[debits.len()], amount(total + skew)));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced lines validate, and the totals equal the debit sum.
    #[test]
    fn prop_balanced_lines_are_accepted(debits in prop::collection::vec(cents(), 1..10)) {
        let chart = chart(debits.len() + 1);
        let ids: Vec<AccountId> = chart.keys().copied().collect();
        let lines = lines_for(&ids, &debits, 0);

        let validated = validate_lines(&lines, |id| chart.get(id));
        prop_assert!(validated.is_ok(), "balanced lines rejected: {:?}", validated);
        let validated = validated.unwrap();

        let expected = amount(debits.iter().sum());
        prop_assert_eq!(validated.totals.total_debit, expected);
        prop_assert_eq!(validated.totals.total_credit, expected);
        prop_assert!(validated.totals.is_balanced);
        prop_assert_eq!(validated.lines.len(), lines.len());
    }

    /// A one-cent difference is tolerated; anything larger is not.
    #[test]
    fn prop_tolerance_is_one_cent(
        debits in prop::collection::vec(cents(), 1..10),
        skew in prop_oneof![Just(-1i64), Just(1i64), 2i64..10_000, -10_000i64..-1],
    ) {
        let chart = chart(debits.len() + 1);
        let ids: Vec<AccountId> = chart.keys().copied().collect();
        let total: i64 = debits.iter().sum();
        // The credit line must stay positive.
        prop_assume!(total + skew > 0);
        let lines = lines_for(&ids, &debits, skew);

        let result = validate_lines(&lines, |id| chart.get(id));
        if skew.abs() <= 1 {
            prop_assert!(result.is_ok(), "one-cent skew rejected: {:?}", result);
        } else {
            let is_unbalanced = matches!(
                result,
                Err(ValidationError::Unbalanced { difference, .. }) if difference == amount(-skew)
            );
            prop_assert!(is_unbalanced, "expected Unbalanced, got {:?}", result);
        }
    }

    /// Both encodings of the same line produce the same journal line.
    #[test]
    fn prop_sided_and_split_agree(c in cents(), side in prop_oneof![Just(Side::Debit), Just(Side::Credit)]) {
        let value = amount(c);
        let sided = LineAmount::Sided { amount: value, side };
        let split = match side {
            Side::Debit => LineAmount::Split { debit: Some(value), credit: None },
            Side::Credit => LineAmount::Split { debit: None, credit: Some(value) },
        };
        prop_assert_eq!(sided.normalize(), split.normalize());
    }

    /// A negative amount on any line is rejected with that line's number.
    #[test]
    fn prop_negative_amount_rejected(
        debits in prop::collection::vec(cents(), 2..6),
        which in any::<prop::sample::Index>(),
    ) {
        let chart = chart(debits.len() + 1);
        let ids: Vec<AccountId> = chart.keys().copied().collect();
        let mut lines = lines_for(&ids, &debits, 0);
        let idx = which.index(debits.len());
        lines[idx] = LineInput::debit(ids[idx], -amount(debits[idx]));

        let result = validate_lines(&lines, |id| chart.get(id));
        prop_assert_eq!(result.err(), Some(ValidationError::NegativeAmount { line: idx + 1 }));
    }
}
