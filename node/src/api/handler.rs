//! Command dispatch.
//!
//! By the time a request reaches [`process`] its signature has been
//! verified. The handler decodes the discriminator, then the typed payload,
//! runs the wallet command and renders the envelope:
//!
//! | Outcome                              | Status | error                 |
//! |--------------------------------------|--------|-----------------------|
//! | success                              | 200    | `NO_ERROR`            |
//! | body is not a JSON command           | 400    | `INVALID_REQUEST`     |
//! | unknown `api`                        | 400    | `INVALID_API_COMMAND` |
//! | payload does not decode              | 400    | `INVALID_REQUEST`     |
//! | wallet service failure               | 500    | the service's code    |

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use wallet_ledger::{ErrorCode, WalletError};

use super::envelope::{ApiCommand, CommandHeader, ProcessRequest, ProcessResponse};
use super::AppState;

/// Label used for requests whose `api` is not a known command.
const UNKNOWN_API: &str = "unknown";

/// A rendered response plus the code it carries, for metrics.
type Reply = (ErrorCode, Response);

/// `POST /open-api-games/v1/games-processor`
pub async fn process(State(state): State<AppState>, body: Bytes) -> Response {
    let started = Instant::now();
    tracing::debug!(body = %String::from_utf8_lossy(&body), "request processing");

    let (label, (code, response)) = match serde_json::from_slice::<CommandHeader>(&body) {
        Err(e) => {
            tracing::error!(error = %e, "error parsing request api command");
            (UNKNOWN_API, failure(StatusCode::BAD_REQUEST, "", ErrorCode::InvalidRequest))
        }
        Ok(header) => match ApiCommand::parse(&header.api) {
            None => {
                tracing::error!(api = %header.api, "invalid request api command");
                (
                    UNKNOWN_API,
                    failure(StatusCode::BAD_REQUEST, &header.api, ErrorCode::InvalidApiCommand),
                )
            }
            Some(command) => {
                let reply = dispatch(&state, command, &header.api, &body)
                    .await
                    .unwrap_or_else(|rejected| rejected);
                (command.as_str(), reply)
            }
        },
    };

    state
        .metrics
        .observe_command(label, code.as_str(), started.elapsed());
    response
}

async fn dispatch(
    state: &AppState,
    command: ApiCommand,
    api: &str,
    body: &[u8],
) -> Result<Reply, Reply> {
    let wallet = &state.wallet;
    Ok(match command {
        ApiCommand::Balance => render(api, wallet.balance(&decode(api, body)?).await),
        ApiCommand::Debit => render(api, wallet.debit(&decode(api, body)?).await),
        ApiCommand::Credit => render(api, wallet.credit(&decode(api, body)?).await),
        ApiCommand::Rollback => render(api, wallet.rollback(&decode(api, body)?).await),
        ApiCommand::MetaData => render(api, wallet.meta_data(&decode(api, body)?).await),
    })
}

/// Decodes the typed payload, or the 400 reply for a malformed one.
fn decode<T>(api: &str, body: &[u8]) -> Result<T, Reply>
where
    T: DeserializeOwned + Default,
{
    serde_json::from_slice::<ProcessRequest<T>>(body)
        .map(|req| req.data)
        .map_err(|e| {
            tracing::error!(api, error = %e, "error parsing request");
            failure(StatusCode::BAD_REQUEST, api, ErrorCode::InvalidRequest)
        })
}

fn render<T: Serialize>(api: &str, result: Result<T, WalletError>) -> Reply {
    match result {
        Ok(data) => (
            ErrorCode::None,
            (StatusCode::OK, Json(ProcessResponse::success(api, data))).into_response(),
        ),
        Err(e) => {
            tracing::error!(api, code = %e.code(), error = %e.chain(), "error processing request");
            failure(StatusCode::INTERNAL_SERVER_ERROR, api, e.code())
        }
    }
}

fn failure(status: StatusCode, api: &str, code: ErrorCode) -> Reply {
    (
        code,
        (status, Json(ProcessResponse::failure(api, code))).into_response(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
