// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Wallet Ledger — Core Library
//!
//! The money-moving half of the game-aggregator wallet. Game servers never
//! touch this crate directly; they talk to `wallet-node`, which authenticates
//! the request and hands a typed command to the [`wallet::WalletService`]
//! defined here.
//!
//! ## Architecture
//!
//! ```text
//! wallet   — business orchestration: session/user/currency resolution,
//!            debit, credit, rollback inversion
//! store    — LedgerStore trait, sled adapter, in-memory double
//! monitor  — background store heartbeat + reconnect loop
//! seed     — bootstrap records for development environments
//! model    — User, Session, Currency, Balance, Transaction
//! error    — wire error codes and the chained WalletError
//! config   — protocol constants
//! ```
//!
//! ## Ground Rules
//!
//! 1. Only the store mutates a balance, and it always writes the matching
//!    transaction record in the same atomic unit.
//! 2. A balance never goes below zero. Not even for a microsecond.
//! 3. Amounts are `u64` minor units. `denomination` is display metadata;
//!    nothing in here divides.

pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod seed;
pub mod store;
pub mod wallet;

pub use error::{ErrorCode, StoreError, WalletError};
pub use monitor::{ConnectivityMonitor, HealthObserver};
pub use model::{Balance, Currency, Session, Transaction, TransactionType, User};
pub use store::{BootstrapStore, LedgerStore};
pub use wallet::WalletService;
