//! Request payloads and results of the wallet commands.
//!
//! Field names follow the game-processor wire format, so these types are
//! decoded from and encoded into the command envelope directly. Every
//! request field is optional on the wire and takes its zero value when
//! absent.

use serde::{Deserialize, Serialize};

/// `balance` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceRequest {
    #[serde(rename = "gameSessionId")]
    pub game_session_uid: String,
    pub currency: String,
}

/// `debit`, `credit` and `rollback` payload.
///
/// Rollback only reads `transaction_uid`; the other fields are accepted
/// and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MovementRequest {
    #[serde(rename = "transactionId")]
    pub transaction_uid: String,
    #[serde(rename = "gameSessionId")]
    pub game_session_uid: String,
    #[serde(rename = "userId")]
    pub user_uid: String,
    pub user_nick: String,
    /// Minor units.
    pub amount: u64,
    pub currency: String,
    pub denomination: u32,
    pub max_win: i64,
    pub jp_key: String,
    pub spin_meta: String,
    pub bet_meta: String,
}

/// Bet reference inside a `metaData` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaDataBet {
    pub bet_id: String,
}

/// `metaData` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaDataRequest {
    #[serde(rename = "userId")]
    pub user_uid: String,
    #[serde(rename = "gameSessionId")]
    pub game_session_uid: String,
    pub currency: String,
    /// Sub-command, e.g. `roundComplete`. Echoed back verbatim.
    pub api: String,
    pub data: MetaDataBet,
}

/// Result of a balance query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResult {
    #[serde(rename = "userId")]
    pub user_uid: String,
    pub user_nick: String,
    pub amount: u64,
    pub currency: String,
    pub denomination: u32,
    /// Always 0; max-win computation is not implemented.
    pub max_win: u64,
    /// Always empty; jackpots are not implemented.
    pub jp_key: String,
}

/// Result of a debit, credit or rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementResult {
    /// Uid of the transaction this command created.
    #[serde(rename = "transactionId")]
    pub transaction_uid: String,
    pub user_nick: String,
    pub amount: u64,
    pub currency: String,
    pub denomination: u32,
    pub max_win: u64,
}

/// Result of a metaData command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDataResult {
    pub api: String,
    /// The resolved session uid.
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn movement_request_reads_wire_names() {
        let req: MovementRequest = serde_json::from_value(json!({
            "transactionId": "t1",
            "gameSessionId": "s1",
            "userId": "u1",
            "userNick": "alice",
            "amount": 100,
            "currency": "USD",
            "denomination": 2,
            "maxWin": 0,
            "jpKey": "",
            "spinMeta": "{}",
            "betMeta": "{}"
        }))
        .unwrap();

        assert_eq!(req.transaction_uid, "t1");
        assert_eq!(req.game_session_uid, "s1");
        assert_eq!(req.user_uid, "u1");
        assert_eq!(req.user_nick, "alice");
        assert_eq!(req.amount, 100);
        assert_eq!(req.spin_meta, "{}");
    }

    #[test]
    fn missing_fields_take_zero_values() {
        let req: MovementRequest = serde_json::from_value(json!({ "currency": "USD" })).unwrap();
        assert_eq!(req.amount, 0);
        assert!(req.transaction_uid.is_empty());
        assert!(req.game_session_uid.is_empty());

        let meta: MetaDataRequest = serde_json::from_value(json!({})).unwrap();
        assert!(meta.data.bet_id.is_empty());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let res = serde_json::from_value::<MovementRequest>(json!({ "amount": -5 }));
        assert!(res.is_err());
    }

    #[test]
    fn metadata_request_nests_bet_id() {
        let req: MetaDataRequest = serde_json::from_value(json!({
            "gameSessionId": "s1",
            "api": "roundComplete",
            "data": { "betId": "b7" }
        }))
        .unwrap();
        assert_eq!(req.api, "roundComplete");
        assert_eq!(req.data.bet_id, "b7");
    }

    #[test]
    fn balance_result_writes_wire_names() {
        let value = serde_json::to_value(BalanceResult {
            user_uid: "u1".into(),
            user_nick: "alice".into(),
            amount: 1000,
            currency: "USD".into(),
            denomination: 2,
            max_win: 0,
            jp_key: String::new(),
        })
        .unwrap();

        assert_eq!(
            value,
            json!({
                "userId": "u1",
                "userNick": "alice",
                "amount": 1000,
                "currency": "USD",
                "denomination": 2,
                "maxWin": 0,
                "jpKey": ""
            })
        );
    }

    #[test]
    fn movement_result_writes_transaction_id() {
        let value = serde_json::to_value(MovementResult {
            transaction_uid: "t1".into(),
            user_nick: "alice".into(),
            amount: 5,
            currency: "USD".into(),
            denomination: 2,
            max_win: 0,
        })
        .unwrap();
        assert_eq!(value["transactionId"], "t1");
        assert_eq!(value["userNick"], "alice");
        assert_eq!(value["maxWin"], 0);
    }
}
