//! Command envelope.
//!
//! Requests are `{ "api": <command>, "data": { ... } }`. Every response,
//! success or failure, is `{ api, data, isSuccess, error, errorMsg }` with
//! `api` echoing what the caller sent.

use serde::{Deserialize, Serialize};

use wallet_ledger::ErrorCode;

/// The five commands the endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Balance,
    Debit,
    Credit,
    Rollback,
    MetaData,
}

impl ApiCommand {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "balance" => Some(ApiCommand::Balance),
            "debit" => Some(ApiCommand::Debit),
            "credit" => Some(ApiCommand::Credit),
            "rollback" => Some(ApiCommand::Rollback),
            "metaData" => Some(ApiCommand::MetaData),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApiCommand::Balance => "balance",
            ApiCommand::Debit => "debit",
            ApiCommand::Credit => "credit",
            ApiCommand::Rollback => "rollback",
            ApiCommand::MetaData => "metaData",
        }
    }
}

/// First decoding pass: just the discriminator.
#[derive(Debug, Default, Deserialize)]
pub struct CommandHeader {
    #[serde(default)]
    pub api: String,
}

impl CommandHeader {
    /// Best-effort `api` for echoing in early rejections. Never fails.
    pub fn peek(body: &[u8]) -> String {
        serde_json::from_slice::<CommandHeader>(body)
            .map(|h| h.api)
            .unwrap_or_default()
    }
}

/// Second decoding pass: the typed payload.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest<T> {
    #[serde(default)]
    pub data: T,
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ProcessResponse<T> {
    pub api: String,
    pub data: Option<T>,
    #[serde(rename = "isSuccess")]
    pub is_success: bool,
    pub error: ErrorCode,
    #[serde(rename = "errorMsg")]
    pub error_msg: ErrorCode,
}

impl<T: Serialize> ProcessResponse<T> {
    pub fn success(api: impl Into<String>, data: T) -> Self {
        Self {
            api: api.into(),
            data: Some(data),
            is_success: true,
            error: ErrorCode::None,
            error_msg: ErrorCode::None,
        }
    }
}

impl ProcessResponse<()> {
    pub fn failure(api: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            api: api.into(),
            data: None,
            is_success: false,
            error: code,
            error_msg: code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wallet_ledger::wallet::BalanceRequest;

    #[test]
    fn every_command_parses_back() {
        for cmd in [
            ApiCommand::Balance,
            ApiCommand::Debit,
            ApiCommand::Credit,
            ApiCommand::Rollback,
            ApiCommand::MetaData,
        ] {
            assert_eq!(ApiCommand::parse(cmd.as_str()), Some(cmd));
        }
        assert_eq!(ApiCommand::parse("metadata"), None);
        assert_eq!(ApiCommand::parse(""), None);
    }

    #[test]
    fn peek_tolerates_garbage() {
        assert_eq!(CommandHeader::peek(br#"{"api":"debit"}"#), "debit");
        assert_eq!(CommandHeader::peek(b"not json"), "");
        assert_eq!(CommandHeader::peek(br#"{"api":7}"#), "");
    }

    #[test]
    fn typed_request_defaults_missing_data() {
        let req: ProcessRequest<BalanceRequest> =
            serde_json::from_value(json!({ "api": "balance" })).unwrap();
        assert_eq!(req.data, BalanceRequest::default());
    }

    #[test]
    fn failure_envelope_shape() {
        let value = serde_json::to_value(ProcessResponse::failure("debit", ErrorCode::SignInvalid))
            .unwrap();
        assert_eq!(
            value,
            json!({
                "api": "debit",
                "data": null,
                "isSuccess": false,
                "error": "INVALID_SIGN",
                "errorMsg": "INVALID_SIGN"
            })
        );
    }

    #[test]
    fn success_envelope_shape() {
        let value =
            serde_json::to_value(ProcessResponse::success("metaData", json!({ "x": 1 }))).unwrap();
        assert_eq!(value["isSuccess"], true);
        assert_eq!(value["error"], "NO_ERROR");
        assert_eq!(value["errorMsg"], "NO_ERROR");
        assert_eq!(value["data"]["x"], 1);
    }
}
