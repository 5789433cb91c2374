//! In-memory [`LedgerStore`] for tests.
//!
//! All state sits behind one mutex, which makes every operation trivially
//! atomic. Each trait call is appended to a call log so tests can assert
//! which store operations a command reached, and probe failures can be
//! scripted to drive the connectivity monitor.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BootstrapStore, LedgerStore, Movement};
use crate::error::{StoreError, StoreResult};
use crate::model::{Balance, Currency, Session, Transaction, User};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    sessions: HashMap<String, Session>,
    currencies: HashMap<String, Currency>,
    balances: HashMap<(String, String), Balance>,
    transactions: HashMap<String, Transaction>,
    calls: Vec<&'static str>,
    failing_pings: u32,
    failing_reconnects: u32,
    reconnects: u32,
    next_seq: u64,
}

/// Mutex-guarded HashMaps with a call log.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the [`LedgerStore`] methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// The next `n` pings fail with `Unavailable`.
    pub fn fail_pings(&self, n: u32) {
        self.state.lock().failing_pings = n;
    }

    /// The next `n` reconnects fail with `Unavailable`.
    pub fn fail_reconnects(&self, n: u32) {
        self.state.lock().failing_reconnects = n;
    }

    /// Successful reconnects so far.
    pub fn reconnect_count(&self) -> u32 {
        self.state.lock().reconnects
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().transactions.len()
    }

    /// Inserts a transaction record as-is, bypassing balance checks. Lets
    /// tests plant records the command surface can never produce.
    pub fn record_transaction(&self, txn: Transaction) {
        self.state.lock().transactions.insert(txn.uid.clone(), txn);
    }

    fn adjust(
        &self,
        call: &'static str,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
        movement: Movement,
    ) -> StoreResult<Transaction> {
        let mut state = self.state.lock();
        state.calls.push(call);

        let key = (user_uid.to_string(), currency.to_string());
        let balance = state
            .balances
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                entity: "balance",
                key: format!("{user_uid}/{currency}"),
            })?;
        movement.apply(balance, amount)?;

        let txn = Transaction::record(movement.kind(), balance, amount, session_uid);
        state.next_seq += 1;
        let txn = txn.with_seq(state.next_seq);
        state.transactions.insert(txn.uid.clone(), txn.clone());
        Ok(txn)
    }
}

fn lookup<T: Clone>(
    map: &HashMap<String, T>,
    key: &str,
    entity: &'static str,
) -> StoreResult<T> {
    map.get(key).cloned().ok_or_else(|| StoreError::NotFound {
        entity,
        key: key.to_string(),
    })
}

fn insert_new<T>(
    map: &mut HashMap<String, T>,
    key: &str,
    value: T,
    entity: &'static str,
) -> StoreResult<()> {
    if map.contains_key(key) {
        return Err(StoreError::Duplicate {
            entity,
            key: key.to_string(),
        });
    }
    map.insert(key.to_string(), value);
    Ok(())
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get_user(&self, uid: &str) -> StoreResult<User> {
        let mut state = self.state.lock();
        state.calls.push("get_user");
        lookup(&state.users, uid, "user")
    }

    async fn get_session(&self, uid: &str) -> StoreResult<Session> {
        let mut state = self.state.lock();
        state.calls.push("get_session");
        lookup(&state.sessions, uid, "session")
    }

    async fn get_currency(&self, code: &str) -> StoreResult<Currency> {
        let mut state = self.state.lock();
        state.calls.push("get_currency");
        lookup(&state.currencies, code, "currency")
    }

    async fn get_balance(&self, user_uid: &str, currency: &str) -> StoreResult<Balance> {
        let mut state = self.state.lock();
        state.calls.push("get_balance");
        state
            .balances
            .get(&(user_uid.to_string(), currency.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "balance",
                key: format!("{user_uid}/{currency}"),
            })
    }

    async fn decrement(
        &self,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
    ) -> StoreResult<Transaction> {
        self.adjust("decrement", user_uid, currency, amount, session_uid, Movement::Debit)
    }

    async fn increment(
        &self,
        user_uid: &str,
        currency: &str,
        amount: u64,
        session_uid: &str,
    ) -> StoreResult<Transaction> {
        self.adjust("increment", user_uid, currency, amount, session_uid, Movement::Credit)
    }

    async fn get_transaction(&self, uid: &str) -> StoreResult<Transaction> {
        let mut state = self.state.lock();
        state.calls.push("get_transaction");
        lookup(&state.transactions, uid, "transaction")
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.calls.push("ping");
        if state.failing_pings > 0 {
            state.failing_pings -= 1;
            return Err(StoreError::Unavailable("scripted ping failure".into()));
        }
        Ok(())
    }

    async fn reconnect(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.calls.push("reconnect");
        if state.failing_reconnects > 0 {
            state.failing_reconnects -= 1;
            return Err(StoreError::Unavailable("scripted reconnect failure".into()));
        }
        state.reconnects += 1;
        Ok(())
    }
}

#[async_trait]
impl BootstrapStore for MemoryLedger {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state.lock();
        insert_new(&mut state.users, &user.uid, user.clone(), "user")
    }

    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        let mut state = self.state.lock();
        insert_new(&mut state.sessions, &session.uid, session.clone(), "session")
    }

    async fn create_currency(&self, currency: &Currency) -> StoreResult<()> {
        let mut state = self.state.lock();
        insert_new(&mut state.currencies, &currency.code, currency.clone(), "currency")
    }

    async fn create_balance(&self, balance: &Balance) -> StoreResult<()> {
        let mut state = self.state.lock();
        let key = (balance.user_uid.clone(), balance.currency.clone());
        if state.balances.contains_key(&key) {
            return Err(StoreError::Duplicate {
                entity: "balance",
                key: format!("{}/{}", balance.user_uid, balance.currency),
            });
        }
        state.balances.insert(key, balance.clone());
        Ok(())
    }

    async fn reset(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.users.clear();
        state.sessions.clear();
        state.currencies.clear();
        state.balances.clear();
        state.transactions.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn with_balance(amount: u64) -> MemoryLedger {
        let store = MemoryLedger::new();
        store
            .create_balance(&Balance {
                user_uid: "u1".into(),
                currency: "USD".into(),
                amount,
                denomination: 2,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn movements_get_increasing_seq() {
        let store = with_balance(10).await;
        let first = store.decrement("u1", "USD", 1, "").await.unwrap();
        let second = store.increment("u1", "USD", 1, "").await.unwrap();
        assert!(first.seq < second.seq);
    }

    #[tokio::test]
    async fn calls_are_logged_in_order() {
        let store = with_balance(10).await;
        let _ = store.get_user("u1").await;
        let _ = store.decrement("u1", "USD", 1, "").await;
        assert_eq!(store.calls(), vec!["get_user", "decrement"]);

        store.clear_calls();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_decrement_writes_nothing() {
        let store = with_balance(10).await;
        let err = store.decrement("u1", "USD", 11, "").await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientBalance { .. }));
        assert_eq!(store.get_balance("u1", "USD").await.unwrap().amount, 10);
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn scripted_failures_run_out() {
        let store = MemoryLedger::new();
        store.fail_pings(2);
        store.fail_reconnects(1);

        assert!(store.ping().await.is_err());
        assert!(store.ping().await.is_err());
        assert!(store.ping().await.is_ok());

        assert!(store.reconnect().await.is_err());
        assert!(store.reconnect().await.is_ok());
        assert_eq!(store.reconnect_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_user_is_rejected() {
        let store = MemoryLedger::new();
        let user = User {
            uid: "u1".into(),
            nick: "a".into(),
        };
        store.create_user(&user).await.unwrap();
        assert!(matches!(
            store.create_user(&user).await.unwrap_err(),
            StoreError::Duplicate { entity: "user", .. }
        ));
    }
}
