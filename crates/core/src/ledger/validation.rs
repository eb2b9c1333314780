//! Balance validation for candidate journal lines.
//!
//! Rules run in a fixed order and each rule is checked over every line
//! before the next one starts, so the first failure reported is always the
//! most fundamental one:
//!
//! 1. At least 2 and at most [`MAX_LINES`] lines
//! 2. Every line names an account
//! 3. Every line carries a positive amount on exactly one side, within
//!    [`MAX_LINE_AMOUNT`]
//! 4. At least one debit line and one credit line
//! 5. Every account exists and accepts postings
//! 6. No account appears twice
//! 7. `|round2(Σdebit) - round2(Σcredit)| <= 0.01`

use std::collections::HashSet;

use ledgerline_shared::types::{AccountId, Amount, JournalLineId, MAX_LINE_AMOUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Account, EntryTotals, JournalLine, Side};

/// Most lines a single entry may carry.
pub const MAX_LINES: usize = 10_000;

/// Amount of a candidate line, in either accepted encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineAmount {
    /// `{ "amount": "150.00", "side": "debit" }`
    Sided {
        /// Amount on `side`.
        amount: Amount,
        /// Debit or credit.
        side: Side,
    },
    /// `{ "debit": "150.00", "credit": null }`
    Split {
        /// Debit amount; absent means zero.
        #[serde(default)]
        debit: Option<Amount>,
        /// Credit amount; absent means zero.
        #[serde(default)]
        credit: Option<Amount>,
    },
}

impl LineAmount {
    /// Normalizes either encoding to a `(debit, credit)` pair rounded to 4 places.
    #[must_use]
    pub fn normalize(&self) -> (Amount, Amount) {
        let (debit, credit) = match *self {
            Self::Sided {
                amount,
                side: Side::Debit,
            } => (amount, Amount::ZERO),
            Self::Sided {
                amount,
                side: Side::Credit,
            } => (Amount::ZERO, amount),
            Self::Split { debit, credit } => {
                (debit.unwrap_or(Amount::ZERO), credit.unwrap_or(Amount::ZERO))
            }
        };
        (debit.round_storage(), credit.round_storage())
    }
}

/// A candidate journal line as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    /// Account to post to.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Amount and side.
    #[serde(flatten)]
    pub amount: LineAmount,
    /// Optional line memo.
    #[serde(default)]
    pub description: Option<String>,
}

impl LineInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Amount) -> Self {
        Self::sided(account_id, Side::Debit, amount)
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Amount) -> Self {
        Self::sided(account_id, Side::Credit, amount)
    }

    /// A line with an explicit side.
    #[must_use]
    pub fn sided(account_id: AccountId, side: Side, amount: Amount) -> Self {
        Self {
            account_id: Some(account_id),
            amount: LineAmount::Sided { amount, side },
            description: None,
        }
    }

    /// Sets the line memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Reasons a set of lines fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer than two lines.
    #[error("Journal entry must have at least 2 lines, got {count}")]
    InsufficientLines {
        /// Number of lines supplied.
        count: usize,
    },

    /// More lines than [`MAX_LINES`].
    #[error("Journal entry may have at most {max} lines, got {count}")]
    TooManyLines {
        /// Number of lines supplied.
        count: usize,
        /// The limit.
        max: usize,
    },

    /// A line has no account.
    #[error("Line {line} has no account")]
    MissingAccount {
        /// 1-based line number.
        line: usize,
    },

    /// A line amount is negative.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// 1-based line number.
        line: usize,
    },

    /// A line has both a debit and a credit amount.
    #[error("Line {line} has both a debit and a credit amount")]
    BothSides {
        /// 1-based line number.
        line: usize,
    },

    /// A line amount does not fit the stored precision.
    #[error("Line {line} amount exceeds the maximum of {MAX_LINE_AMOUNT}")]
    AmountTooLarge {
        /// 1-based line number.
        line: usize,
    },

    /// A line has neither a debit nor a credit amount.
    #[error("Line {line} has no amount")]
    ZeroAmount {
        /// 1-based line number.
        line: usize,
    },

    /// No debit line.
    #[error("Journal entry must have at least one debit line")]
    NoDebitLine,

    /// No credit line.
    #[error("Journal entry must have at least one credit line")]
    NoCreditLine,

    /// The account does not exist.
    #[error("Line {line} references unknown account {account_id}")]
    UnknownAccount {
        /// 1-based line number.
        line: usize,
        /// The missing account.
        account_id: AccountId,
    },

    /// The account is a group account.
    #[error("Line {line} posts to group account {account_code}; only leaf accounts accept postings")]
    ParentAccount {
        /// 1-based line number.
        line: usize,
        /// Code of the group account.
        account_code: String,
    },

    /// The same account is used on more than one line.
    #[error("Account {account_code} appears on more than one line")]
    DuplicateAccount {
        /// Code of the repeated account.
        account_code: String,
    },

    /// A side total cannot be represented.
    #[error("Journal entry totals are too large to represent")]
    TotalTooLarge,

    /// Debits and credits differ by more than the tolerance.
    #[error("Journal entry is not balanced: debit {debit}, credit {credit}, difference {difference}")]
    Unbalanced {
        /// Σdebit, 2 places.
        debit: Amount,
        /// Σcredit, 2 places.
        credit: Amount,
        /// Signed `debit - credit`.
        difference: Amount,
    },
}

impl ValidationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::TooManyLines { .. } => "TOO_MANY_LINES",
            Self::MissingAccount { .. } => "MISSING_ACCOUNT",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::BothSides { .. } => "BOTH_SIDES",
            Self::AmountTooLarge { .. } => "AMOUNT_TOO_LARGE",
            Self::ZeroAmount { .. } => "ZERO_AMOUNT",
            Self::NoDebitLine => "NO_DEBIT_LINE",
            Self::NoCreditLine => "NO_CREDIT_LINE",
            Self::UnknownAccount { .. } => "UNKNOWN_ACCOUNT",
            Self::ParentAccount { .. } => "PARENT_ACCOUNT",
            Self::DuplicateAccount { .. } => "DUPLICATE_ACCOUNT",
            Self::TotalTooLarge => "TOTAL_TOO_LARGE",
            Self::Unbalanced { .. } => "UNBALANCED",
        }
    }
}

/// Lines that passed every rule, with their totals.
#[derive(Debug, Clone)]
pub struct ValidatedLines {
    /// Normalized lines in input order.
    pub lines: Vec<JournalLine>,
    /// Debit and credit totals.
    pub totals: EntryTotals,
}

/// Outcome of a balance check, as shown to a user filling in a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceCheck {
    /// All rules passed.
    pub valid: bool,
    /// "Journal entry is balanced" or the first failure.
    pub message: String,
    /// Σdebit over all lines, 2 places.
    pub total_debit: Amount,
    /// Σcredit over all lines, 2 places.
    pub total_credit: Amount,
    /// Signed `total_debit - total_credit`.
    pub difference: Amount,
}

impl BalanceCheck {
    /// Builds the report for `lines` from a validation result.
    ///
    /// Totals that overflow are reported as zero; such input always fails
    /// rule 3 first.
    #[must_use]
    pub fn from_result(lines: &[LineInput], result: &Result<ValidatedLines, ValidationError>) -> Self {
        let (debit, credit): (Vec<Amount>, Vec<Amount>) =
            lines.iter().map(|line| line.amount.normalize()).unzip();
        let totals = match (Amount::checked_sum(debit), Amount::checked_sum(credit)) {
            (Some(debit), Some(credit)) => EntryTotals::new(debit, credit),
            _ => EntryTotals::new(Amount::ZERO, Amount::ZERO),
        };
        let (valid, message) = match result {
            Ok(_) => (true, "Journal entry is balanced".to_string()),
            Err(e) => (false, e.to_string()),
        };
        Self {
            valid,
            message,
            total_debit: totals.total_debit,
            total_credit: totals.total_credit,
            difference: totals.difference(),
        }
    }
}

/// Validates candidate lines.
///
/// `lookup` resolves an account id to the account's current state in the
/// chart of accounts. It is only consulted after the structural rules pass.
///
/// # Errors
///
/// Returns the first [`ValidationError`] in rule order.
pub fn validate_lines<'a, F>(lines: &[LineInput], lookup: F) -> Result<ValidatedLines, ValidationError>
where
    F: Fn(&AccountId) -> Option<&'a Account>,
{
    if lines.len() < 2 {
        return Err(ValidationError::InsufficientLines { count: lines.len() });
    }
    if lines.len() > MAX_LINES {
        return Err(ValidationError::TooManyLines {
            count: lines.len(),
            max: MAX_LINES,
        });
    }

    let mut account_ids = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        match line.account_id {
            Some(id) => account_ids.push(id),
            None => return Err(ValidationError::MissingAccount { line: idx + 1 }),
        }
    }

    let mut sided = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        sided.push(side_and_amount(idx + 1, line.amount.normalize())?);
    }

    if !sided.iter().any(|(side, _)| *side == Side::Debit) {
        return Err(ValidationError::NoDebitLine);
    }
    if !sided.iter().any(|(side, _)| *side == Side::Credit) {
        return Err(ValidationError::NoCreditLine);
    }

    let mut accounts = Vec::with_capacity(lines.len());
    for (idx, account_id) in account_ids.iter().enumerate() {
        let account = lookup(account_id).ok_or(ValidationError::UnknownAccount {
            line: idx + 1,
            account_id: *account_id,
        })?;
        if !account.is_postable() {
            return Err(ValidationError::ParentAccount {
                line: idx + 1,
                account_code: account.code.clone(),
            });
        }
        accounts.push(account);
    }

    let mut seen = HashSet::with_capacity(accounts.len());
    for account in &accounts {
        if !seen.insert(account.id) {
            return Err(ValidationError::DuplicateAccount {
                account_code: account.code.clone(),
            });
        }
    }

    let journal_lines: Vec<JournalLine> = (1..)
        .zip(lines.iter().zip(account_ids).zip(sided))
        .map(|(line_number, ((input, account_id), (side, amount)))| JournalLine {
            id: JournalLineId::new(),
            line_number,
            account_id,
            side,
            amount,
            description: input.description.clone(),
        })
        .collect();

    let totals = EntryTotals::from_lines(&journal_lines).ok_or(ValidationError::TotalTooLarge)?;
    if !totals.is_balanced {
        return Err(ValidationError::Unbalanced {
            debit: totals.total_debit,
            credit: totals.total_credit,
            difference: totals.difference(),
        });
    }

    Ok(ValidatedLines {
        lines: journal_lines,
        totals,
    })
}

fn side_and_amount(line: usize, (debit, credit): (Amount, Amount)) -> Result<(Side, Amount), ValidationError> {
    if debit.is_negative() || credit.is_negative() {
        return Err(ValidationError::NegativeAmount { line });
    }
    if !debit.fits_line_column() || !credit.fits_line_column() {
        return Err(ValidationError::AmountTooLarge { line });
    }
    match (debit.is_positive(), credit.is_positive()) {
        (true, true) => Err(ValidationError::BothSides { line }),
        (true, false) => Ok((Side::Debit, debit)),
        (false, true) => Ok((Side::Credit, credit)),
        (false, false) => Err(ValidationError::ZeroAmount { line }),
    }
}
