//! Property-based tests for opening balance computation.
//!
//! For any set of balanced postings, the generated opening entry passes
//! the balance validator and re-states the accounting equation.

use std::collections::HashMap;

use ledgerline_shared::types::{AccountId, Amount};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::closing::plan_opening_balances;
use crate::ledger::types::{Account, AccountClass};
use crate::ledger::validation::validate_lines;
use crate::store::AccountTotals;

fn chart() -> Vec<Account> {
    vec![
        Account::new("1100", "Cash", AccountClass::Asset),
        Account::new("1200", "Receivables", AccountClass::Asset),
        Account::new("2100", "Payables", AccountClass::Liability),
        Account::new("3100", "Share capital", AccountClass::Equity),
        Account::new("3200", "Retained earnings", AccountClass::Equity),
        Account::new("4100", "Sales", AccountClass::Revenue),
        Account::new("5100", "Cost of sales", AccountClass::Cost),
        Account::new("6100", "Rent", AccountClass::Expense),
    ]
}

/// Strategy for a posting: (debit account index, credit account index, cents).
fn posting_strategy() -> impl Strategy<Value = (usize, usize, i64)> {
    (0usize..8, 0usize..8, 1i64..10_000_000)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_opening_entry_is_balanced(postings in prop::collection::vec(posting_strategy(), 1..30)) {
        let accounts = chart();
        let retained = accounts[4].clone();
        let mut sums: HashMap<AccountId, (Amount, Amount)> = HashMap::new();
        for (debit_idx, credit_idx, cents) in postings {
            if debit_idx == credit_idx {
                continue;
            }
            let amount = Amount::from(Decimal::new(cents, 2));
            sums.entry(accounts[debit_idx].id).or_default().0 += amount;
            sums.entry(accounts[credit_idx].id).or_default().1 += amount;
        }
        let totals: Vec<AccountTotals> = sums
            .into_iter()
            .map(|(account_id, (debit, credit))| AccountTotals { account_id, debit, credit })
            .collect();
        let by_id: HashMap<AccountId, Account> = accounts.iter().map(|a| (a.id, a.clone())).collect();

        let plan = plan_opening_balances(&totals, &by_id, Some(&retained)).unwrap();

        prop_assert_eq!(plan.total_assets, plan.total_liabilities + plan.total_equity);
        if !plan.lines.is_empty() {
            let validated = validate_lines(&plan.lines, |id| by_id.get(id));
            prop_assert!(validated.is_ok(), "{:?}", validated.err());
        }
        for line in &plan.lines {
            let id = line.account_id.unwrap();
            prop_assert!(!by_id[&id].class.is_income_statement());
        }
    }
}
