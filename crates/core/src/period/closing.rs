//! Opening balance computation.
//!
//! Turns per-account totals of a closed period into the lines of the
//! next period's opening entry. Pure: no store access, no clock.

use std::collections::{BTreeMap, HashMap};

use ledgerline_shared::types::{AccountId, Amount};

use crate::ledger::balance::AccountBalance;
use crate::ledger::error::LedgerError;
use crate::ledger::types::{Account, AccountClass};
use crate::ledger::validation::LineInput;
use crate::store::AccountTotals;

/// Lines and class totals of an opening entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningPlan {
    /// Lines ordered by account code.
    pub lines: Vec<LineInput>,
    /// Σ natural balances of asset accounts.
    pub total_assets: Amount,
    /// Σ natural balances of liability accounts.
    pub total_liabilities: Amount,
    /// Σ natural balances of equity accounts, including the carried result.
    pub total_equity: Amount,
    /// Credit-minus-debit result of income statement accounts.
    pub period_result: Amount,
}

/// Builds the opening entry lines from a closed period's account totals.
///
/// - Memo accounts are skipped.
/// - Income statement accounts are not carried; their combined result is
///   credited (or, for a loss, debited) to `retained_earnings`.
/// - A positive balance is re-stated on the account's natural side, a
///   negative one on the opposite side for its absolute value.
/// - Balances that round to zero are dropped.
///
/// `accounts` must contain every account named in `totals`.
///
/// # Errors
///
/// - `UnclosedPeriodResult` when the result is non-zero and no
///   retained-earnings account was given
/// - `InternalInvariant` when `totals` names an account missing from `accounts`
pub fn plan_opening_balances(
    totals: &[AccountTotals],
    accounts: &HashMap<AccountId, Account>,
    retained_earnings: Option<&Account>,
) -> Result<OpeningPlan, LedgerError> {
    let mut carried: BTreeMap<(&str, AccountId), AccountBalance> = BTreeMap::new();
    let mut period_result = Amount::ZERO;

    for row in totals {
        let account = accounts.get(&row.account_id).ok_or_else(|| {
            LedgerError::InternalInvariant(format!(
                "totals reference account {} missing from the chart",
                row.account_id
            ))
        })?;
        if account.class.is_income_statement() {
            period_result += row.credit - row.debit;
            continue;
        }
        if !account.class.is_balance_sheet() {
            continue;
        }
        let balance = carried
            .entry((account.code.as_str(), account.id))
            .or_insert_with(|| AccountBalance::new(account));
        balance.add_debit(row.debit);
        balance.add_credit(row.credit);
    }

    let period_result = period_result.round_money();
    if !period_result.is_zero() {
        let Some(target) = retained_earnings else {
            return Err(LedgerError::UnclosedPeriodResult {
                amount: period_result,
            });
        };
        carried
            .entry((target.code.as_str(), target.id))
            .or_insert_with(|| AccountBalance::new(target))
            .add_net_credit(period_result);
    }

    let class_of = |id: &AccountId| {
        accounts
            .get(id)
            .or(retained_earnings.filter(|a| a.id == *id))
            .map(|a| a.class)
    };

    let mut plan = OpeningPlan {
        lines: Vec::with_capacity(carried.len()),
        total_assets: Amount::ZERO,
        total_liabilities: Amount::ZERO,
        total_equity: Amount::ZERO,
        period_result,
    };
    for balance in carried.values() {
        let Some((side, amount)) = balance.carry_forward() else {
            continue;
        };
        match class_of(&balance.account_id) {
            Some(AccountClass::Asset) => plan.total_assets += balance.balance(),
            Some(AccountClass::Liability) => plan.total_liabilities += balance.balance(),
            Some(AccountClass::Equity) => plan.total_equity += balance.balance(),
            _ => {}
        }
        plan.lines
            .push(LineInput::sided(balance.account_id, side, amount).with_description("Opening balance"));
    }
    Ok(plan)
}
