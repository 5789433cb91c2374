//! Error types for the wallet ledger.
//!
//! Callers see codes, not types. Every failure that reaches a game server
//! is reduced to one [`ErrorCode`] string in the response envelope, but the
//! full chain of (origin, code) tags and underlying causes is kept on the
//! [`WalletError`] so the logs can say exactly where things went wrong.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Boxed cause attached to a [`WalletError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Wire-level error codes. The string forms are part of the integration
/// contract with game servers and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Success sentinel.
    None,
    Internal,
    Config,
    Connect,
    RepoInit,
    RepoCreate,
    InvalidApiCommand,
    InvalidRequest,
    ProcessingRequest,
    NotFound,
    /// A decrement's `amount >= requested` precondition failed.
    InsufficientBalance,
    CreditError,
    InvalidTransactionType,
    RollbackError,
    SessionNotFound,
    UserNotFound,
    BalanceNotFound,
    EmptyTransactionUid,
    TransactionNotFound,
    UnknownCurrency,
    SignInvalid,
    SignEmpty,
    ReadBody,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [ErrorCode; 23] = [
        ErrorCode::None,
        ErrorCode::Internal,
        ErrorCode::Config,
        ErrorCode::Connect,
        ErrorCode::RepoInit,
        ErrorCode::RepoCreate,
        ErrorCode::InvalidApiCommand,
        ErrorCode::InvalidRequest,
        ErrorCode::ProcessingRequest,
        ErrorCode::NotFound,
        ErrorCode::InsufficientBalance,
        ErrorCode::CreditError,
        ErrorCode::InvalidTransactionType,
        ErrorCode::RollbackError,
        ErrorCode::SessionNotFound,
        ErrorCode::UserNotFound,
        ErrorCode::BalanceNotFound,
        ErrorCode::EmptyTransactionUid,
        ErrorCode::TransactionNotFound,
        ErrorCode::UnknownCurrency,
        ErrorCode::SignInvalid,
        ErrorCode::SignEmpty,
        ErrorCode::ReadBody,
    ];

    /// The wire string for this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::None => "NO_ERROR",
            ErrorCode::Internal => "INTERNAL_ERROR",
            ErrorCode::Config => "CONFIG_ERROR",
            ErrorCode::Connect => "CONNECTION_ERROR",
            ErrorCode::RepoInit => "REPO_INIT_ERROR",
            ErrorCode::RepoCreate => "REPO_CREATE_ERROR",
            ErrorCode::InvalidApiCommand => "INVALID_API_COMMAND",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::ProcessingRequest => "PROCESSING_REQUEST_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorCode::CreditError => "CREDIT_ERROR",
            ErrorCode::InvalidTransactionType => "TRANSACTION_TYPE_INVALID",
            ErrorCode::RollbackError => "ROLLBACK_ERROR",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::BalanceNotFound => "BALANCE_NOT_FOUND",
            ErrorCode::EmptyTransactionUid => "EMPTY_TRANSACTION_ID",
            ErrorCode::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            ErrorCode::UnknownCurrency => "UNKNOWN_CURRENCY",
            ErrorCode::SignInvalid => "INVALID_SIGN",
            ErrorCode::SignEmpty => "SIGN_NOT_PROVIDED",
            ErrorCode::ReadBody => "READ_BODY_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WalletError
// ---------------------------------------------------------------------------

/// A tagged failure: where it was raised, what code it maps to, and the
/// lower-level failure it wraps (if any).
///
/// Layers never discard the error they caught. They wrap it with their own
/// origin and code, so [`WalletError::chain`] reads outermost-first.
#[derive(Debug)]
pub struct WalletError {
    origin: &'static str,
    code: ErrorCode,
    cause: Option<BoxError>,
}

impl WalletError {
    /// Creates a leaf error with no underlying cause.
    pub fn new(origin: &'static str, code: ErrorCode) -> Self {
        Self {
            origin,
            code,
            cause: None,
        }
    }

    /// Attaches the failure this error is wrapping.
    pub fn caused_by(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// The code surfaced to callers.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The component that raised this error, e.g. `wallet.debit`.
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    /// Renders the full cause chain: `origin:CODE / cause / cause ...`.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut next = std::error::Error::source(self);
        while let Some(err) = next {
            out.push_str(" / ");
            out.push_str(&err.to_string());
            next = err.source();
        }
        out
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]:{}", self.origin, self.code)
    }
}

impl std::error::Error for WalletError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures raised by a [`LedgerStore`](crate::store::LedgerStore).
///
/// These never reach a caller verbatim; the wallet service re-maps them to
/// a domain code.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record under the given key.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Record kind ("user", "balance", ...).
        entity: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// The decrement precondition failed; nothing was written.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Amount on the balance at check time.
        available: u64,
        /// Amount the caller asked to take.
        requested: u64,
    },

    /// A credit would push the balance past `u64::MAX`.
    #[error("balance overflow: current {current}, credit {credit}")]
    Overflow {
        /// Amount on the balance at check time.
        current: u64,
        /// Amount the caller asked to add.
        credit: u64,
    },

    /// A create hit an existing key.
    #[error("{entity} already exists: {key}")]
    Duplicate {
        /// Record kind.
        entity: &'static str,
        /// The conflicting key.
        key: String,
    },

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store cannot be reached right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Storage-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::NotFound { .. } => ErrorCode::NotFound,
            StoreError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            StoreError::Overflow { .. } => ErrorCode::ProcessingRequest,
            StoreError::Duplicate { .. } => ErrorCode::RepoCreate,
            StoreError::Sled(_) | StoreError::Serialization(_) => ErrorCode::Internal,
            StoreError::Unavailable(_) => ErrorCode::Connect,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate wire code {code}");
        }
    }

    #[test]
    fn wire_strings_match_contract() {
        assert_eq!(ErrorCode::None.as_str(), "NO_ERROR");
        assert_eq!(ErrorCode::InsufficientBalance.as_str(), "INSUFFICIENT_BALANCE");
        assert_eq!(ErrorCode::InvalidTransactionType.as_str(), "TRANSACTION_TYPE_INVALID");
        assert_eq!(ErrorCode::EmptyTransactionUid.as_str(), "EMPTY_TRANSACTION_ID");
        assert_eq!(ErrorCode::SignEmpty.as_str(), "SIGN_NOT_PROVIDED");
        assert_eq!(ErrorCode::SignInvalid.as_str(), "INVALID_SIGN");
    }

    #[test]
    fn code_serializes_as_wire_string() {
        let json = serde_json::to_string(&ErrorCode::UnknownCurrency).unwrap();
        assert_eq!(json, "\"UNKNOWN_CURRENCY\"");
    }

    #[test]
    fn chain_keeps_every_layer() {
        let store = StoreError::NotFound {
            entity: "currency",
            key: "EUR".into(),
        };
        let inner = WalletError::new("wallet.debit", ErrorCode::UnknownCurrency).caused_by(store);
        let outer = WalletError::new("api.process", ErrorCode::ProcessingRequest).caused_by(inner);

        assert_eq!(outer.code(), ErrorCode::ProcessingRequest);
        assert_eq!(
            outer.chain(),
            "[api.process]:PROCESSING_REQUEST_ERROR / [wallet.debit]:UNKNOWN_CURRENCY / currency not found: EUR"
        );
    }

    #[test]
    fn leaf_error_has_no_source() {
        let err = WalletError::new("wallet.rollback", ErrorCode::EmptyTransactionUid);
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(err.chain(), "[wallet.rollback]:EMPTY_TRANSACTION_ID");
    }

    #[test]
    fn store_errors_map_to_storage_codes() {
        let insufficient = StoreError::InsufficientBalance {
            available: 5,
            requested: 10,
        };
        assert_eq!(insufficient.code(), ErrorCode::InsufficientBalance);
        assert!(!insufficient.is_not_found());

        let missing = StoreError::NotFound {
            entity: "balance",
            key: "u1/USD".into(),
        };
        assert_eq!(missing.code(), ErrorCode::NotFound);
        assert!(missing.is_not_found());

        let dup = StoreError::Duplicate {
            entity: "user",
            key: "u1".into(),
        };
        assert_eq!(dup.code(), ErrorCode::RepoCreate);
    }
}
