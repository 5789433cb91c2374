//! # Ledger Records
//!
//! The five record kinds the wallet persists. Users, sessions and
//! currencies are reference data written once at bootstrap. Balances are
//! the only mutable records, and transactions are the append-only audit
//! trail of every balance movement.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A player. Identity anchor for balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub nick: String,
}

/// A game session, resolving to the user who opened it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub user_uid: String,
}

/// A registered currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO-style code, e.g. `USD`.
    pub code: String,
    /// Number of minor-unit decimal places.
    pub denomination: u32,
}

/// Funds held by one user in one currency.
///
/// There is exactly one balance per `(user_uid, currency)`; the store keys
/// records by that pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub user_uid: String,
    pub currency: String,
    /// Minor units. Never negative by construction.
    pub amount: u64,
    pub denomination: u32,
}

impl Balance {
    /// Store key for a `(user, currency)` pair: big-endian u32 length of
    /// the user uid, the uid, then the currency code. The length prefix
    /// keeps distinct pairs from ever producing the same bytes.
    pub fn key(user_uid: &str, currency: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(4 + user_uid.len() + currency.len());
        key.extend_from_slice(&(user_uid.len() as u32).to_be_bytes());
        key.extend_from_slice(user_uid.as_bytes());
        key.extend_from_slice(currency.as_bytes());
        key
    }
}

/// Direction of a balance movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
    Rollback,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Debit => "debit",
            TransactionType::Credit => "credit",
            TransactionType::Rollback => "rollback",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of a single balance movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Globally unique, assigned at creation. Rollbacks reference it.
    pub uid: String,
    pub user_uid: String,
    /// Game session the movement was made under; empty when the caller
    /// addressed the user directly.
    pub session_uid: String,
    pub amount: u64,
    pub currency: String,
    pub denomination: u32,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub created_at: DateTime<Utc>,
    /// Issue order within the store. Strictly increasing per store, so it
    /// orders records whose timestamps collide.
    pub seq: u64,
}

impl Transaction {
    /// Builds the record for a movement of `amount` on `balance`, with a
    /// fresh uid.
    pub fn record(kind: TransactionType, balance: &Balance, amount: u64, session_uid: &str) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            user_uid: balance.user_uid.clone(),
            session_uid: session_uid.to_string(),
            amount,
            currency: balance.currency.clone(),
            denomination: balance.denomination,
            kind,
            created_at: Utc::now(),
            seq: 0,
        }
    }

    /// Stamps the store-issued sequence number.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }
}
