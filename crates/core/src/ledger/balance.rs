//! Account balance calculations.
//!
//! A balance is always expressed relative to the account's natural side:
//! - Debit-natured (asset, expense, cost): balance = debit - credit
//! - Credit-natured (liability, equity, revenue): balance = credit - debit

use ledgerline_shared::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};

use super::types::{Account, Side};

/// Running debit/credit totals of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Side on which a positive balance sits.
    pub normal_side: Side,
    /// Total debit amount.
    pub debit_total: Amount,
    /// Total credit amount.
    pub credit_total: Amount,
}

impl AccountBalance {
    /// Creates an empty balance for `account`.
    #[must_use]
    pub fn new(account: &Account) -> Self {
        Self {
            account_id: account.id,
            normal_side: account.normal_side,
            debit_total: Amount::ZERO,
            credit_total: Amount::ZERO,
        }
    }

    /// Adds a debit amount.
    pub fn add_debit(&mut self, amount: Amount) {
        self.debit_total += amount;
    }

    /// Adds a credit amount.
    pub fn add_credit(&mut self, amount: Amount) {
        self.credit_total += amount;
    }

    /// Posts a signed credit-minus-debit movement, such as a period result.
    pub fn add_net_credit(&mut self, amount: Amount) {
        if amount.is_negative() {
            self.add_debit(amount.abs());
        } else {
            self.add_credit(amount);
        }
    }

    /// Balance on the natural side, rounded to 2 places. Negative when the
    /// account sits on its opposite side.
    #[must_use]
    pub fn balance(&self) -> Amount {
        self.normal_side
            .natural_balance(self.debit_total, self.credit_total)
            .round_money()
    }

    /// Side and absolute amount of a line that re-states this balance.
    ///
    /// Returns `None` when the balance rounds to zero.
    #[must_use]
    pub fn carry_forward(&self) -> Option<(Side, Amount)> {
        let balance = self.balance();
        if balance.is_zero() {
            None
        } else if balance.is_positive() {
            Some((self.normal_side, balance))
        } else {
            Some((self.normal_side.opposite(), balance.abs()))
        }
    }
}
