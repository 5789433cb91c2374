//! Bootstrap data for development and integration environments.
//!
//! Loads one currency, one player with an open game session, and a funded
//! balance, so a game server can start calling the command endpoint right
//! away. Records that already exist are skipped, which makes [`load`] safe
//! to run on every start.

use crate::error::{ErrorCode, StoreError, WalletError};
use crate::model::{Balance, Currency, Session, User};
use crate::store::BootstrapStore;

pub const SEED_CURRENCY: &str = "USD";
pub const SEED_DENOMINATION: u32 = 2;
pub const SEED_USER_UID: &str = "FIRST_USER_UID";
pub const SEED_USER_NICK: &str = "first_user";
pub const SEED_SESSION_UID: &str = "FIRST_SESSION_UID";
/// Opening balance in minor units.
pub const SEED_AMOUNT: u64 = 1000;

const ORIGIN: &str = "seed.load";

/// What a [`load`] run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

impl SeedReport {
    fn tally(&mut self, entity: &'static str, result: Result<(), StoreError>) -> Result<(), WalletError> {
        match result {
            Ok(()) => {
                self.created += 1;
                Ok(())
            }
            Err(StoreError::Duplicate { key, .. }) => {
                tracing::debug!(entity, key = %key, "seed record exists, skipping");
                self.skipped += 1;
                Ok(())
            }
            Err(e) => Err(WalletError::new(ORIGIN, ErrorCode::RepoCreate).caused_by(e)),
        }
    }
}

/// Inserts the bootstrap records.
pub async fn load(store: &dyn BootstrapStore) -> Result<SeedReport, WalletError> {
    let mut report = SeedReport::default();

    let currency = Currency {
        code: SEED_CURRENCY.into(),
        denomination: SEED_DENOMINATION,
    };
    report.tally("currency", store.create_currency(&currency).await)?;

    let user = User {
        uid: SEED_USER_UID.into(),
        nick: SEED_USER_NICK.into(),
    };
    report.tally("user", store.create_user(&user).await)?;

    let session = Session {
        uid: SEED_SESSION_UID.into(),
        user_uid: SEED_USER_UID.into(),
    };
    report.tally("session", store.create_session(&session).await)?;

    let balance = Balance {
        user_uid: SEED_USER_UID.into(),
        currency: SEED_CURRENCY.into(),
        amount: SEED_AMOUNT,
        denomination: SEED_DENOMINATION,
    };
    report.tally("balance", store.create_balance(&balance).await)?;

    tracing::info!(created = report.created, skipped = report.skipped, "seed data loaded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LedgerStore, MemoryLedger};

    #[tokio::test]
    async fn load_creates_a_playable_account() {
        let store = MemoryLedger::new();
        let report = load(&store).await.unwrap();

        assert_eq!(report, SeedReport { created: 4, skipped: 0 });
        let session = store.get_session(SEED_SESSION_UID).await.unwrap();
        assert_eq!(session.user_uid, SEED_USER_UID);
        let balance = store.get_balance(SEED_USER_UID, SEED_CURRENCY).await.unwrap();
        assert_eq!(balance.amount, 1000);
        assert_eq!(balance.denomination, 2);
    }

    #[tokio::test]
    async fn load_twice_skips_existing_records() {
        let store = MemoryLedger::new();
        load(&store).await.unwrap();
        store.decrement(SEED_USER_UID, SEED_CURRENCY, 400, "").await.unwrap();

        let report = load(&store).await.unwrap();
        assert_eq!(report, SeedReport { created: 0, skipped: 4 });
        // Existing balance is not reset.
        let balance = store.get_balance(SEED_USER_UID, SEED_CURRENCY).await.unwrap();
        assert_eq!(balance.amount, 600);
    }
}
