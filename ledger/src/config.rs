//! # Protocol Configuration & Constants
//!
//! Fixed values shared by the ledger and the node. Anything an operator is
//! expected to tune lives in the node's runtime config instead; these are
//! the numbers that game-server integrations depend on.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Request Signing
// ---------------------------------------------------------------------------

/// Header carrying the lowercase hex digest of `body ‖ api_key`.
pub const SIGN_HEADER: &str = "Sign";

/// Upper bound on a command body. Game-processor payloads are a few hundred
/// bytes; anything past this is not a legitimate command.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Store Connectivity
// ---------------------------------------------------------------------------

/// How often the connectivity monitor probes the store.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Fixed delay between reconnect attempts once a probe has failed.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Environments
// ---------------------------------------------------------------------------

/// Development environment name. Destructive maintenance (store reset) is
/// refused anywhere else.
pub const DEV_ENV: &str = "dev";

/// Production environment name.
pub const PROD_ENV: &str = "prod";
