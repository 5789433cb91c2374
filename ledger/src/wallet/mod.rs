//! # Wallet Module
//!
//! The business rules between the command endpoint and the store: which
//! player a request is about, whether its currency exists, and how a
//! rollback inverts the movement it references.
//!
//! ```text
//! types.rs   — request payloads and result values (wire field names)
//! service.rs — WalletService: balance, debit, credit, rollback, meta_data
//! ```
//!
//! ## Resolution Order
//!
//! Each command checks its references in a fixed order and stops at the
//! first failure. A balance query checks the currency before touching the
//! session, so an unknown currency never costs a session lookup. Debit and
//! credit resolve the player first, then the currency.
//!
//! ## Known Limitation
//!
//! There are no idempotency keys. A retried debit, credit or rollback is
//! applied again, and the same transaction can be rolled back more than
//! once. Game servers are expected not to resend a command they have a
//! response for.

pub mod service;
pub mod types;

pub use service::WalletService;
pub use types::{
    BalanceRequest, BalanceResult, MetaDataBet, MetaDataRequest, MetaDataResult, MovementRequest,
    MovementResult,
};
