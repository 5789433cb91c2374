//! # CLI Interface
//!
//! Defines the command-line argument structure for `wallet-node` using
//! `clap` derive. Every flag can also be set through the environment
//! variable named next to it.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Game-aggregator wallet node.
///
/// Serves the signed game-processor command endpoint on top of an embedded
/// wallet ledger, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "wallet-node",
    about = "Game-aggregator wallet node",
    version,
    propagate_version = true
)]
pub struct WalletNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the wallet node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the wallet node.
    Run(RunArgs),
    /// Load bootstrap records into the data directory and exit.
    Seed(SeedArgs),
    /// Print the `Sign` header value for a request body.
    Sign(SignArgs),
    /// Print version information and exit.
    Version,
}

/// Flags shared by every subcommand that opens the store.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Deployment environment: `dev` or `prod`.
    #[arg(long, env = "ENV", default_value = "dev")]
    pub env: String,

    /// Log level: trace, debug, info, warn or error. `RUST_LOG` takes
    /// precedence.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Directory holding the ledger database. Created if missing.
    #[arg(long, short = 'd', env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Address for the game-processor API.
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: String,

    /// Address for the Prometheus metrics endpoint.
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:9090")]
    pub metrics_addr: String,

    /// Shared secret used to verify the `Sign` header. Required.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Load bootstrap records before serving.
    #[arg(long, env = "SEED")]
    pub seed: bool,
}

/// Arguments for the `seed` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Drop every record before seeding. Refused outside `dev`.
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for the `sign` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    /// Shared secret the node verifies against.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// File holding the exact request body. Reads stdin when omitted.
    #[arg(long)]
    pub body: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        WalletNodeCli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = WalletNodeCli::try_parse_from([
            "wallet-node",
            "run",
            "--env",
            "prod",
            "--api-key",
            "k",
            "--http-addr",
            "127.0.0.1:8081",
            "--seed",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.common.env, "prod");
                assert_eq!(args.api_key.as_deref(), Some("k"));
                assert_eq!(args.http_addr, "127.0.0.1:8081");
                assert!(args.seed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sign_takes_body_as_flag() {
        let cli = WalletNodeCli::try_parse_from([
            "wallet-node",
            "sign",
            "--api-key",
            "k",
            "--body",
            "req.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Sign(args) => {
                assert_eq!(args.api_key, "k");
                assert_eq!(args.body, Some(PathBuf::from("req.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(
            WalletNodeCli::try_parse_from(["wallet-node", "sign", "--api-key", "k", "req.json"])
                .is_err()
        );
    }
}
