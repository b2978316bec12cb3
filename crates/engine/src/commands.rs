//! Command structs for engine operations.
//!
//! These types group parameters for the composite workflows, keeping call
//! sites readable and avoiding long argument lists.

use crate::{AccountKind, Currency};

/// Open an account together with its paired settlement account.
#[derive(Clone, Debug)]
pub struct OpenAccountCmd {
    pub owner: String,
    pub currency: Currency,
    pub initial_balance_minor: i64,
    pub kind: AccountKind,
}

impl OpenAccountCmd {
    #[must_use]
    pub fn new(owner: impl Into<String>, currency: Currency) -> Self {
        Self {
            owner: owner.into(),
            currency,
            initial_balance_minor: 0,
            kind: AccountKind::Bank,
        }
    }

    #[must_use]
    pub fn initial_balance_minor(mut self, balance_minor: i64) -> Self {
        self.initial_balance_minor = balance_minor;
        self
    }
}

/// Move funds between two accounts.
///
/// Currency match and ownership checks are the caller's responsibility;
/// the engine validates the amount and rejects self-transfers.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount_minor: i64,
}

impl TransferCmd {
    #[must_use]
    pub fn new(from_account_id: i64, to_account_id: i64, amount_minor: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount_minor,
        }
    }
}

/// Deposit funds into a user's bank account for one currency.
#[derive(Clone, Debug)]
pub struct DepositCmd {
    pub username: String,
    pub currency: Currency,
    pub amount_minor: i64,
}

impl DepositCmd {
    #[must_use]
    pub fn new(username: impl Into<String>, currency: Currency, amount_minor: i64) -> Self {
        Self {
            username: username.into(),
            currency,
            amount_minor,
        }
    }
}
