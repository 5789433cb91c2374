//! Validated runtime configuration.
//!
//! [`NodeConfig`] is built once in `main` from the parsed CLI and passed
//! down explicitly. Any invalid value is a `CONFIG_ERROR` and aborts
//! startup before the store is opened.

use std::net::SocketAddr;
use std::path::PathBuf;

use wallet_ledger::config::{DEV_ENV, PROD_ENV};
use wallet_ledger::{ErrorCode, WalletError};

use crate::cli::{CommonArgs, RunArgs};
use crate::logging::LogFormat;

const ORIGIN: &str = "node.config";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Result<Self, WalletError> {
        match s {
            DEV_ENV => Ok(Environment::Dev),
            PROD_ENV => Ok(Environment::Prod),
            other => Err(config_error(format!("unknown environment: {other:?}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Dev => DEV_ENV,
            Environment::Prod => PROD_ENV,
        }
    }

    /// Destructive maintenance is only allowed in development.
    pub fn allows_reset(self) -> bool {
        self == Environment::Dev
    }
}

/// Settings shared by every subcommand that opens the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub env: Environment,
    pub log_level: String,
    pub log_format: LogFormat,
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn from_args(args: &CommonArgs) -> Result<Self, WalletError> {
        let env = Environment::parse(&args.env)?;

        let log_level = args.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(config_error(format!("unknown log level: {:?}", args.log_level)));
        }

        if args.data_dir.as_os_str().is_empty() {
            return Err(config_error("data dir must not be empty".to_string()));
        }

        Ok(Self {
            env,
            log_level,
            log_format: LogFormat::from_str_lossy(&args.log_format),
            data_dir: args.data_dir.clone(),
        })
    }

    /// Filter directive for the validated log level.
    pub fn log_directive(&self) -> String {
        crate::logging::default_directive(&self.log_level)
    }
}

/// Everything `run` needs.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub store: StoreConfig,
    pub http_addr: SocketAddr,
    pub metrics_addr: SocketAddr,
    pub api_key: String,
    pub seed: bool,
}

impl NodeConfig {
    pub fn from_args(args: &RunArgs) -> Result<Self, WalletError> {
        let store = StoreConfig::from_args(&args.common)?;
        let http_addr = parse_addr("http addr", &args.http_addr)?;
        let metrics_addr = parse_addr("metrics addr", &args.metrics_addr)?;

        let api_key = match args.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(config_error("API_KEY is required".to_string())),
        };

        if http_addr == metrics_addr {
            return Err(config_error(format!(
                "http and metrics addr must differ: {http_addr}"
            )));
        }

        Ok(Self {
            store,
            http_addr,
            metrics_addr,
            api_key,
            seed: args.seed,
        })
    }
}

fn parse_addr(name: &str, value: &str) -> Result<SocketAddr, WalletError> {
    value
        .parse()
        .map_err(|e| config_error(format!("invalid {name} {value:?}: {e}")))
}

fn config_error(msg: String) -> WalletError {
    WalletError::new(ORIGIN, ErrorCode::Config).caused_by(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            common: CommonArgs {
                env: "dev".into(),
                log_level: "info".into(),
                log_format: "json".into(),
                data_dir: PathBuf::from("./data"),
            },
            http_addr: "0.0.0.0:8080".into(),
            metrics_addr: "0.0.0.0:9090".into(),
            api_key: Some("secret".into()),
            seed: false,
        }
    }

    #[test]
    fn valid_args_build_config() {
        let cfg = NodeConfig::from_args(&args()).unwrap();
        assert_eq!(cfg.store.env, Environment::Dev);
        assert_eq!(cfg.store.log_format, LogFormat::Json);
        assert_eq!(cfg.http_addr.port(), 8080);
        assert_eq!(cfg.api_key, "secret");
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let mut a = args();
        a.api_key = None;
        assert_eq!(NodeConfig::from_args(&a).unwrap_err().code(), ErrorCode::Config);

        a.api_key = Some("   ".into());
        assert_eq!(NodeConfig::from_args(&a).unwrap_err().code(), ErrorCode::Config);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let mut a = args();
        a.common.env = "staging".into();
        let err = NodeConfig::from_args(&a).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Config);
        assert!(err.chain().contains("staging"));
    }

    #[test]
    fn bad_address_is_rejected() {
        let mut a = args();
        a.http_addr = "localhost".into();
        assert_eq!(NodeConfig::from_args(&a).unwrap_err().code(), ErrorCode::Config);
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut a = args();
        a.common.log_level = "DEBUG".into();
        assert_eq!(NodeConfig::from_args(&a).unwrap().store.log_level, "debug");

        a.common.log_level = "loud".into();
        assert!(NodeConfig::from_args(&a).is_err());
    }

    #[test]
    fn logging_settings_come_from_validated_config() {
        let mut a = args();
        a.common.log_level = "Warn".into();
        a.common.log_format = "PRETTY".into();
        let cfg = StoreConfig::from_args(&a.common).unwrap();

        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(
            cfg.log_directive(),
            "wallet_node=warn,wallet_ledger=warn,tower_http=warn"
        );
    }

    #[test]
    fn trace_is_an_accepted_level() {
        let mut a = args();
        a.common.log_level = "trace".into();
        assert_eq!(StoreConfig::from_args(&a.common).unwrap().log_level, "trace");
    }

    #[test]
    fn only_dev_allows_reset() {
        assert!(Environment::Dev.allows_reset());
        assert!(!Environment::Prod.allows_reset());
        assert_eq!(Environment::parse("prod").unwrap().as_str(), "prod");
    }
}
