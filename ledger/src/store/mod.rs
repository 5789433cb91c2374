//! # Store Module
//!
//! The only code allowed to mutate a balance or append a transaction.
//!
//! ```text
//! mod.rs         — LedgerStore / BootstrapStore capability traits
//! sled_ledger.rs — persistent adapter on sled trees (production)
//! memory.rs      — mutex-guarded HashMaps with a call log (tests)
//! ```
//!
//! The wallet service only ever sees `Arc<dyn LedgerStore>`; nothing above
//! this module names a storage type.
//!
//! ## Atomicity
//!
//! `decrement` and `increment` write the balance and its transaction record
//! as one unit. For concurrent callers on the same `(user, currency)` key
//! the check-then-adjust step is indivisible, so two debits racing for the
//! last 100 units cannot both succeed.

pub mod memory;
pub mod sled_ledger;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::model::{Balance, Currency, Session, Transaction, TransactionType, User};

pub use self::memory::MemoryLedger;
pub use self::sled_ledger::SledLedger;

/// The two directions an adapter can move a balance in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Movement {
    Debit,
    Credit,
}

impl Movement {
    pub(crate) fn kind(self) -> TransactionType {
        match self {
            Movement::Debit => TransactionType::Debit,
            Movement::Credit => TransactionType::Credit,
        }
    }

    /// Checks the precondition and updates `balance.amount` in place.
    /// On error the balance is left as it was.
    pub(crate) fn apply(self, balance: &mut Balance, amount: u64) -> StoreResult<()> {
        match self {
            Movement::Debit => {
                if balance.amount < amount {
                    return Err(StoreError::InsufficientBalance {
                        available: balance.amount,
                        requested: amount,
                    });
                }
                balance.amount -= amount;
            }
            Movement::Credit => {
                balance.amount =
                    balance
                        .amount
                        .checked_add(amount)
                        .ok_or(StoreError::Overflow {
                            current: balance.amount,
                            credit: amount,
                        })?;
            }
        }
        Ok(())
    }
}

/// Capabilities the wallet service needs from storage.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_user(&self, uid: &str) -> StoreResult<User>;

    async fn get_session(&self, uid: &str) -> StoreResult<Session>;

    async fn get_currency(&self, code: &str) -> StoreResult<Currency>;

    async fn get_balance(&self, user_uid: &str, currency: &str) -> StoreResult<Balance>;

    /// Takes `amount` from the balance and records a debit transaction.
    ///
    /// # Errors
    ///
    /// [`StoreError::InsufficientBalance`](crate::StoreError::InsufficientBalance)
    /// if the balance holds less than `amount`; nothing is written in that
    /// case. [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// balance record does not exist.
    async fn decrement(
        &self,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
    ) -> StoreResult<Transaction>;

    /// Adds `amount` to the balance and records a credit transaction.
    async fn increment(
        &self,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
    ) -> StoreResult<Transaction>;

    async fn get_transaction(&self, uid: &str) -> StoreResult<Transaction>;

    /// Cheap liveness probe used by the connectivity monitor.
    async fn ping(&self) -> StoreResult<()>;

    /// Re-establishes the store handles after a failed probe.
    async fn reconnect(&self) -> StoreResult<()>;
}

/// Record creation used by seeding and tests. Not reachable from the
/// command endpoint.
#[async_trait]
pub trait BootstrapStore: Send + Sync {
    async fn create_user(&self, user: &User) -> StoreResult<()>;

    async fn create_session(&self, session: &Session) -> StoreResult<()>;

    async fn create_currency(&self, currency: &Currency) -> StoreResult<()>;

    /// Fails with `Duplicate` if a balance for the same
    /// `(user_uid, currency)` already exists.
    async fn create_balance(&self, balance: &Balance) -> StoreResult<()>;

    /// Drops every record. Callers must gate this on the dev environment.
    async fn reset(&self) -> StoreResult<()>;
}
