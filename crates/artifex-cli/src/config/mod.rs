//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── store: StoreConfig       # Backend, bucket, signing
//! ├── staging: StagingConfig   # Signed URL lifetime
//! ├── log_format: LogFormat    # Text or JSON logs on stderr
//! └── command: Command         # prepare | commit | hash | show
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! artifex --store-backend local --store-root ./bucket --store-signing-secret s3cr3t \
//!     prepare --batch run.json create Wrench https://example.com/Wrench.zip
//!
//! # Or via environment variables
//! STORE_BACKEND=local STORE_ROOT=./bucket artifex commit --batch run.json create Wrench
//! ```

use std::process;

use anyhow::Context;
use artifex_staging::StagingConfig;
use artifex_store::{StoreBackend, StoreConfig};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::command::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Log output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "artifex")]
#[command(about = "Stage and commit derived design artifacts")]
#[command(version)]
pub struct Cli {
    /// Object store configuration.
    #[clap(flatten)]
    pub store: StoreConfig,

    /// Staging configuration.
    #[clap(flatten)]
    pub staging: StagingConfig,

    /// Log output format
    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value_t)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    ///
    /// This should be called before parsing CLI arguments so that clap's `env`
    /// feature can pick up values from .env files.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing on stderr with environment-based filtering.
    ///
    /// Stdout is reserved for command output.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let text = (self.log_format == LogFormat::Text)
            .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
        let json = (self.log_format == LogFormat::Json)
            .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

        tracing_subscriber::registry()
            .with(filter)
            .with(text)
            .with(json)
            .init();
    }

    /// Validates all configuration values.
    ///
    /// Each invocation is its own process, so the volatile `memory` backend
    /// would lose staged objects between `prepare` and `commit`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.store_backend == StoreBackend::Memory {
            anyhow::bail!("the memory backend does not persist between runs, use local or s3");
        }
        self.store
            .validate()
            .context("invalid store configuration")?;
        self.staging
            .validate()
            .context("invalid staging configuration")?;
        Ok(())
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            backend = %self.store.store_backend,
            root = ?self.store.store_root,
            bucket = ?self.store.store_bucket,
            signed_url_ttl_secs = self.staging.signed_url_ttl_secs,
            "Store configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "aws").then_some("aws"),
            cfg!(feature = "dotenv").then_some("dotenv"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_store_and_staging_flags() {
        let cli = Cli::try_parse_from([
            "artifex",
            "--store-backend",
            "local",
            "--store-root",
            "/tmp/bucket",
            "--store-signing-secret",
            "secret",
            "--signed-url-ttl",
            "600",
            "show",
            "Wrench",
        ])
        .unwrap();

        assert_eq!(cli.store.store_backend, StoreBackend::Local);
        assert_eq!(cli.staging.signed_url_ttl_secs, 600);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn rejects_memory_backend() {
        let cli = Cli::try_parse_from([
            "artifex",
            "--store-signing-secret",
            "secret",
            "show",
            "Wrench",
        ])
        .unwrap();

        assert_eq!(cli.store.store_backend, StoreBackend::Memory);
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("memory backend"));
    }

    #[test]
    fn rejects_out_of_range_ttl() {
        let cli = Cli::try_parse_from([
            "artifex",
            "--store-backend",
            "local",
            "--store-root",
            "/tmp/bucket",
            "--store-signing-secret",
            "secret",
            "--signed-url-ttl",
            "5",
            "show",
            "Wrench",
        ])
        .unwrap();
        assert!(cli.validate().is_err());
    }
}
