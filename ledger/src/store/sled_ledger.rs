//! # SledLedger — Persistent Store
//!
//! The production [`LedgerStore`], built on sled's embedded key-value
//! store. Every record is bincode-encoded into its own named tree:
//!
//! | Tree           | Key                              | Value                 |
//! |----------------|----------------------------------|-----------------------|
//! | `users`        | `uid` (UTF-8)                    | `bincode(User)`       |
//! | `sessions`     | `uid` (UTF-8)                    | `bincode(Session)`    |
//! | `currencies`   | `code` (UTF-8)                   | `bincode(Currency)`   |
//! | `balances`     | [`Balance::key`]                 | `bincode(Balance)`    |
//! | `transactions` | `uid` (UTF-8)                    | `bincode(Transaction)`|
//! | `metadata`     | key (UTF-8)                      | value (bytes)         |
//!
//! ## Atomicity
//!
//! Balance adjustments run inside a sled transaction spanning the
//! `balances` and `transactions` trees. The balance read, the precondition
//! check, the balance write and the transaction insert either all commit
//! or none do. sled retries the closure on conflict, so two concurrent
//! adjustments of one balance behave as if they ran one after the other.
//!
//! Creates use compare-and-swap against an empty slot, which is what makes
//! keys unique: one balance per `(user, currency)`, one record per uid.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};

use super::{BootstrapStore, LedgerStore, Movement};
use crate::error::{StoreError, StoreResult};
use crate::model::{Balance, Currency, Session, Transaction, User};

/// Well-known key in the `metadata` tree touched by every probe.
const META_HEARTBEAT: &[u8] = b"heartbeat";

impl From<TransactionError<StoreError>> for StoreError {
    fn from(err: TransactionError<StoreError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StoreError::Sled(e),
        }
    }
}

/// Named tree handles. Cheap to clone (each `Tree` is an `Arc`).
#[derive(Debug, Clone)]
struct Trees {
    users: Tree,
    sessions: Tree,
    currencies: Tree,
    balances: Tree,
    transactions: Tree,
    metadata: Tree,
}

impl Trees {
    fn open(db: &Db) -> StoreResult<Self> {
        Ok(Self {
            users: db.open_tree("users")?,
            sessions: db.open_tree("sessions")?,
            currencies: db.open_tree("currencies")?,
            balances: db.open_tree("balances")?,
            transactions: db.open_tree("transactions")?,
            metadata: db.open_tree("metadata")?,
        })
    }

    fn all(&self) -> [&Tree; 6] {
        [
            &self.users,
            &self.sessions,
            &self.currencies,
            &self.balances,
            &self.transactions,
            &self.metadata,
        ]
    }
}

/// sled-backed ledger store.
///
/// sled is thread-safe; share a `SledLedger` across request handlers via
/// `Arc` without any extra locking. The `RwLock` only guards the tree
/// handles so that [`LedgerStore::reconnect`] can swap them out.
#[derive(Debug)]
pub struct SledLedger {
    db: Db,
    trees: RwLock<Trees>,
}

impl SledLedger {
    /// Open or create a store at the given directory.
    ///
    /// A database that cannot be opened at all is reported as
    /// [`StoreError::Unavailable`].
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::from_db(db)
    }

    /// In-memory store that is discarded on drop. For tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let trees = Trees::open(&db)?;
        Ok(Self {
            db,
            trees: RwLock::new(trees),
        })
    }

    /// Number of transaction records.
    pub fn transaction_count(&self) -> usize {
        self.trees.read().transactions.len()
    }

    /// Every transaction recorded for `user_uid`, in issue order.
    pub fn list_transactions(&self, user_uid: &str) -> StoreResult<Vec<Transaction>> {
        let transactions = self.trees.read().transactions.clone();
        let mut out = Vec::new();
        for entry in transactions.iter() {
            let (_, bytes) = entry?;
            let txn: Transaction = decode(&bytes)?;
            if txn.user_uid == user_uid {
                out.push(txn);
            }
        }
        out.sort_by_key(|t| t.seq);
        Ok(out)
    }

    /// Blocks until all pending writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn adjust(
        &self,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
        movement: Movement,
    ) -> StoreResult<Transaction> {
        let key = Balance::key(user_uid, currency);
        let (balances, transactions) = {
            let trees = self.trees.read();
            (trees.balances.clone(), trees.transactions.clone())
        };

        let result = (&balances, &transactions).transaction(|(balances, transactions)| {
            let raw = match balances.get(&key)? {
                Some(raw) => raw,
                None => {
                    return Err(ConflictableTransactionError::Abort(StoreError::NotFound {
                        entity: "balance",
                        key: format!("{user_uid}/{currency}"),
                    }))
                }
            };
            let mut balance: Balance = decode(&raw).map_err(ConflictableTransactionError::Abort)?;
            movement
                .apply(&mut balance, amount)
                .map_err(ConflictableTransactionError::Abort)?;

            let seq = transactions.generate_id()?;
            let txn = Transaction::record(movement.kind(), &balance, amount, session_uid)
                .with_seq(seq);
            balances.insert(key.as_slice(), encode(&balance).map_err(ConflictableTransactionError::Abort)?)?;
            transactions.insert(
                txn.uid.as_bytes(),
                encode(&txn).map_err(ConflictableTransactionError::Abort)?,
            )?;
            Ok(txn)
        });

        result.map_err(|e| {
            let err = StoreError::from(e);
            tracing::warn!(
                user_uid,
                currency,
                amount,
                movement = %movement.kind(),
                error = %err,
                "balance adjustment rejected"
            );
            err
        })
    }
}

#[async_trait]
impl LedgerStore for SledLedger {
    async fn get_user(&self, uid: &str) -> StoreResult<User> {
        let tree = self.trees.read().users.clone();
        fetch(&tree, uid.as_bytes(), "user", uid)
    }

    async fn get_session(&self, uid: &str) -> StoreResult<Session> {
        let tree = self.trees.read().sessions.clone();
        fetch(&tree, uid.as_bytes(), "session", uid)
    }

    async fn get_currency(&self, code: &str) -> StoreResult<Currency> {
        let tree = self.trees.read().currencies.clone();
        fetch(&tree, code.as_bytes(), "currency", code)
    }

    async fn get_balance(&self, user_uid: &str, currency: &str) -> StoreResult<Balance> {
        let tree = self.trees.read().balances.clone();
        fetch(
            &tree,
            &Balance::key(user_uid, currency),
            "balance",
            &format!("{user_uid}/{currency}"),
        )
    }

    async fn decrement(
        &self,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
    ) -> StoreResult<Transaction> {
        self.adjust(user_uid, currency, amount, session_uid, Movement::Debit)
    }

    async fn increment(
        &self,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
    ) -> StoreResult<Transaction> {
        self.adjust(user_uid, currency, amount, session_uid, Movement::Credit)
    }

    async fn get_transaction(&self, uid: &str) -> StoreResult<Transaction> {
        let tree = self.trees.read().transactions.clone();
        fetch(&tree, uid.as_bytes(), "transaction", uid)
    }

    async fn ping(&self) -> StoreResult<()> {
        let metadata = self.trees.read().metadata.clone();
        let now = chrono::Utc::now().timestamp_millis().to_be_bytes().to_vec();
        metadata
            .insert(META_HEARTBEAT, now)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn reconnect(&self) -> StoreResult<()> {
        let trees = Trees::open(&self.db).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        *self.trees.write() = trees;
        tracing::info!("store tree handles reopened");
        Ok(())
    }
}

#[async_trait]
impl BootstrapStore for SledLedger {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let tree = self.trees.read().users.clone();
        insert_new(&tree, user.uid.as_bytes(), user, "user", &user.uid)
    }

    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        let tree = self.trees.read().sessions.clone();
        insert_new(&tree, session.uid.as_bytes(), session, "session", &session.uid)
    }

    async fn create_currency(&self, currency: &Currency) -> StoreResult<()> {
        let tree = self.trees.read().currencies.clone();
        insert_new(
            &tree,
            currency.code.as_bytes(),
            currency,
            "currency",
            &currency.code,
        )
    }

    async fn create_balance(&self, balance: &Balance) -> StoreResult<()> {
        let tree = self.trees.read().balances.clone();
        insert_new(
            &tree,
            &Balance::key(&balance.user_uid, &balance.currency),
            balance,
            "balance",
            &format!("{}/{}", balance.user_uid, balance.currency),
        )
    }

    async fn reset(&self) -> StoreResult<()> {
        let trees = self.trees.read().clone();
        for tree in trees.all() {
            tree.clear()?;
        }
        self.db.flush()?;
        tracing::warn!("store reset: all records dropped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn fetch<T: DeserializeOwned>(
    tree: &Tree,
    key: &[u8],
    entity: &'static str,
    display_key: &str,
) -> StoreResult<T> {
    match tree.get(key)? {
        Some(bytes) => decode(&bytes),
        None => {
            tracing::debug!(entity, key = display_key, "record not found");
            Err(StoreError::NotFound {
                entity,
                key: display_key.to_string(),
            })
        }
    }
}

fn insert_new<T: Serialize>(
    tree: &Tree,
    key: &[u8],
    value: &T,
    entity: &'static str,
    display_key: &str,
) -> StoreResult<()> {
    let bytes = encode(value)?;
    match tree.compare_and_swap(key, None::<&[u8]>, Some(bytes))? {
        Ok(()) => Ok(()),
        Err(_) => Err(StoreError::Duplicate {
            entity,
            key: display_key.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
