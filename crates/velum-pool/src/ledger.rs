//! Custodian contract for public token balances.
//!
//! The pool never touches public balances directly; every movement goes
//! through a [`Ledger`]. Debits are owner-gated: the transfer authority
//! must own the source account. The vault is registered at initialize time
//! with the pool authority as its owner, so only the pool can release
//! custodial funds; every other account is owned by itself.

use std::collections::HashMap;

use velum_types::{AccountId, Amount};

/// Error types for custodian operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Source balance cannot cover the transfer.
    #[error("insufficient funds: account holds {available}, transfer needs {required}")]
    InsufficientFunds {
        /// Balance available in the source account.
        available: Amount,
        /// Amount the transfer required.
        required: Amount,
    },

    /// Authority does not own the source account (or it does not exist).
    #[error("authority does not own the debited account")]
    Unauthorized,

    /// The account id is already registered.
    #[error("account is already registered")]
    AccountExists,

    /// Crediting would overflow the destination balance.
    #[error("balance overflow")]
    Overflow,
}

/// Convenience result type for custodian operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Atomic debit/credit of public token balances.
///
/// Implementations must be all-or-nothing per call: a failed transfer
/// leaves every balance unchanged.
pub trait Ledger {
    /// Current balance of an account. Unknown accounts hold zero.
    fn balance(&self, account: &AccountId) -> Amount;

    /// Register an account under an explicit owner, starting at zero.
    fn register(&mut self, account: &AccountId, owner: &AccountId) -> LedgerResult<()>;

    /// Mint value into an account, creating it self-owned if absent.
    fn credit(&mut self, account: &AccountId, amount: Amount) -> LedgerResult<()>;

    /// Move `amount` from `from` to `to`. `authority` must own `from`.
    fn transfer(
        &mut self,
        authority: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> LedgerResult<()>;
}

#[derive(Clone, Debug)]
struct LedgerAccount {
    owner: AccountId,
    balance: Amount,
}

/// Hash-map custodian for tests, development deployments, and the daemon's
/// built-in faucet mode.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    accounts: HashMap<AccountId, LedgerAccount>,
}

impl InMemoryLedger {
    /// Create an empty custodian.
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner of an account, if registered.
    pub fn owner(&self, account: &AccountId) -> Option<&AccountId> {
        self.accounts.get(account).map(|a| &a.owner)
    }

    /// Snapshot of every account as `(account, owner, balance)`.
    pub fn snapshot(&self) -> Vec<(AccountId, AccountId, Amount)> {
        self.accounts
            .iter()
            .map(|(account, entry)| (*account, entry.owner, entry.balance))
            .collect()
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, account: &AccountId) -> Amount {
        self.accounts.get(account).map_or(0, |a| a.balance)
    }

    fn register(&mut self, account: &AccountId, owner: &AccountId) -> LedgerResult<()> {
        if self.accounts.contains_key(account) {
            return Err(LedgerError::AccountExists);
        }
        self.accounts.insert(
            *account,
            LedgerAccount {
                owner: *owner,
                balance: 0,
            },
        );
        Ok(())
    }

    fn credit(&mut self, account: &AccountId, amount: Amount) -> LedgerResult<()> {
        let credited = self
            .balance(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.accounts
            .entry(*account)
            .and_modify(|a| a.balance = credited)
            .or_insert(LedgerAccount {
                owner: *account,
                balance: credited,
            });
        Ok(())
    }

    fn transfer(
        &mut self,
        authority: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> LedgerResult<()> {
        // All checks precede the first mutation.
        let source = self.accounts.get(from).ok_or(LedgerError::Unauthorized)?;
        if source.owner != *authority {
            return Err(LedgerError::Unauthorized);
        }
        if source.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                available: source.balance,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        if let Some(source) = self.accounts.get_mut(from) {
            source.balance -= amount;
        }
        self.accounts
            .entry(*to)
            .and_modify(|a| a.balance = credited)
            .or_insert(LedgerAccount {
                owner: *to,
                balance: credited,
            });
        Ok(())
    }
}
