//! [`WalletService`]: the five wallet commands over a [`LedgerStore`].

use std::sync::Arc;

use crate::error::{ErrorCode, StoreError, WalletError};
use crate::model::{Transaction, TransactionType, User};
use crate::store::LedgerStore;

use super::types::{
    BalanceRequest, BalanceResult, MetaDataRequest, MetaDataResult, MovementRequest,
    MovementResult,
};

const ORIGIN_BALANCE: &str = "wallet.balance";
const ORIGIN_DEBIT: &str = "wallet.debit";
const ORIGIN_CREDIT: &str = "wallet.credit";
const ORIGIN_ROLLBACK: &str = "wallet.rollback";
const ORIGIN_METADATA: &str = "wallet.metadata";

/// Stateless command processor. Cheap to clone; every clone shares the
/// same store.
#[derive(Clone)]
pub struct WalletService {
    store: Arc<dyn LedgerStore>,
}

impl WalletService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Current balance of the player behind a game session.
    ///
    /// Checks currency, then session, then user, then balance.
    pub async fn balance(&self, req: &BalanceRequest) -> Result<BalanceResult, WalletError> {
        tracing::debug!(session = %req.game_session_uid, currency = %req.currency, "balance");

        self.store
            .get_currency(&req.currency)
            .await
            .map_err(|e| WalletError::new(ORIGIN_BALANCE, ErrorCode::UnknownCurrency).caused_by(e))?;

        let session = self
            .store
            .get_session(&req.game_session_uid)
            .await
            .map_err(|e| WalletError::new(ORIGIN_BALANCE, ErrorCode::SessionNotFound).caused_by(e))?;

        let user = self
            .store
            .get_user(&session.user_uid)
            .await
            .map_err(|e| WalletError::new(ORIGIN_BALANCE, ErrorCode::UserNotFound).caused_by(e))?;

        let balance = self
            .store
            .get_balance(&user.uid, &req.currency)
            .await
            .map_err(|e| WalletError::new(ORIGIN_BALANCE, ErrorCode::BalanceNotFound).caused_by(e))?;

        Ok(BalanceResult {
            user_uid: user.uid,
            user_nick: user.nick,
            amount: balance.amount,
            currency: balance.currency,
            denomination: balance.denomination,
            max_win: 0,
            jp_key: String::new(),
        })
    }

    /// Takes `req.amount` from the player's balance.
    pub async fn debit(&self, req: &MovementRequest) -> Result<MovementResult, WalletError> {
        tracing::debug!(
            session = %req.game_session_uid,
            user = %req.user_uid,
            amount = req.amount,
            currency = %req.currency,
            "debit"
        );

        let user = self.resolve_player(ORIGIN_DEBIT, req).await?;
        self.check_currency(ORIGIN_DEBIT, &req.currency).await?;

        let txn = self
            .store
            .decrement(&user.uid, &req.currency, req.amount, &req.game_session_uid)
            .await
            .map_err(|e| {
                let code = match &e {
                    StoreError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
                    StoreError::NotFound { .. } => ErrorCode::BalanceNotFound,
                    _ => ErrorCode::ProcessingRequest,
                };
                WalletError::new(ORIGIN_DEBIT, code).caused_by(e)
            })?;

        Ok(movement_result(txn, user))
    }

    /// Adds `req.amount` to the player's balance.
    pub async fn credit(&self, req: &MovementRequest) -> Result<MovementResult, WalletError> {
        tracing::debug!(
            session = %req.game_session_uid,
            user = %req.user_uid,
            amount = req.amount,
            currency = %req.currency,
            "credit"
        );

        let user = self.resolve_player(ORIGIN_CREDIT, req).await?;
        self.check_currency(ORIGIN_CREDIT, &req.currency).await?;

        let txn = self
            .store
            .increment(&user.uid, &req.currency, req.amount, &req.game_session_uid)
            .await
            .map_err(|e| {
                let code = if e.is_not_found() {
                    ErrorCode::BalanceNotFound
                } else {
                    ErrorCode::CreditError
                };
                WalletError::new(ORIGIN_CREDIT, code).caused_by(e)
            })?;

        Ok(movement_result(txn, user))
    }

    /// Reverses the movement recorded under `req.transaction_uid` by
    /// applying the opposite movement for the same amount and currency.
    ///
    /// The result carries the uid of the new, reversing transaction.
    pub async fn rollback(&self, req: &MovementRequest) -> Result<MovementResult, WalletError> {
        tracing::debug!(transaction = %req.transaction_uid, "rollback");

        if req.transaction_uid.is_empty() {
            return Err(WalletError::new(ORIGIN_ROLLBACK, ErrorCode::EmptyTransactionUid));
        }

        let original = self
            .store
            .get_transaction(&req.transaction_uid)
            .await
            .map_err(|e| {
                WalletError::new(ORIGIN_ROLLBACK, ErrorCode::TransactionNotFound).caused_by(e)
            })?;

        let user = self
            .store
            .get_user(&original.user_uid)
            .await
            .map_err(|e| WalletError::new(ORIGIN_ROLLBACK, ErrorCode::UserNotFound).caused_by(e))?;

        let reversal = match original.kind {
            TransactionType::Credit => {
                self.store
                    .decrement(
                        &user.uid,
                        &original.currency,
                        original.amount,
                        &original.session_uid,
                    )
                    .await
            }
            TransactionType::Debit => {
                self.store
                    .increment(
                        &user.uid,
                        &original.currency,
                        original.amount,
                        &original.session_uid,
                    )
                    .await
            }
            TransactionType::Rollback => {
                return Err(WalletError::new(
                    ORIGIN_ROLLBACK,
                    ErrorCode::InvalidTransactionType,
                ))
            }
        };

        let txn = reversal
            .map_err(|e| WalletError::new(ORIGIN_ROLLBACK, ErrorCode::RollbackError).caused_by(e))?;

        tracing::info!(
            original = %original.uid,
            reversal = %txn.uid,
            kind = %txn.kind,
            amount = txn.amount,
            "transaction rolled back"
        );

        Ok(movement_result(txn, user))
    }

    /// Round metadata. Only resolves the session and echoes it back.
    pub async fn meta_data(&self, req: &MetaDataRequest) -> Result<MetaDataResult, WalletError> {
        tracing::debug!(session = %req.game_session_uid, api = %req.api, "metaData");

        let session = self
            .store
            .get_session(&req.game_session_uid)
            .await
            .map_err(|e| {
                WalletError::new(ORIGIN_METADATA, ErrorCode::SessionNotFound).caused_by(e)
            })?;

        Ok(MetaDataResult {
            api: req.api.clone(),
            data: session.uid,
        })
    }

    /// The session's owner when a session is given, else `req.user_uid`.
    async fn resolve_player(
        &self,
        origin: &'static str,
        req: &MovementRequest,
    ) -> Result<User, WalletError> {
        let user_uid = if req.game_session_uid.is_empty() {
            req.user_uid.clone()
        } else {
            self.store
                .get_session(&req.game_session_uid)
                .await
                .map_err(|e| WalletError::new(origin, ErrorCode::SessionNotFound).caused_by(e))?
                .user_uid
        };

        self.store
            .get_user(&user_uid)
            .await
            .map_err(|e| WalletError::new(origin, ErrorCode::UserNotFound).caused_by(e))
    }

    async fn check_currency(&self, origin: &'static str, code: &str) -> Result<(), WalletError> {
        self.store
            .get_currency(code)
            .await
            .map(|_| ())
            .map_err(|e| WalletError::new(origin, ErrorCode::UnknownCurrency).caused_by(e))
    }
}

fn movement_result(txn: Transaction, user: User) -> MovementResult {
    MovementResult {
        transaction_uid: txn.uid,
        user_nick: user.nick,
        amount: txn.amount,
        currency: txn.currency,
        denomination: txn.denomination,
        max_win: 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
