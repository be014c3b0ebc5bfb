//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── store: BinaryStoreConfig    # Bucket
//! ├── staging: StagingConfig      # Staging directory, expiry
//! ├── provider: ProviderConfig    # GCS or S3 and their settings
//! └── command: Command            # Operation to run
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod provider;

use std::process;

use anyhow::Context;
use bincas_staging::{StagingCache, StagingConfig};
use bincas_store::{BinaryStore, BinaryStoreConfig};
use clap::Parser;
pub use provider::{ProviderConfig, ProviderKind};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "bincas")]
#[command(about = "Content-addressed binary store")]
#[command(version)]
pub struct Cli {
    /// Bucket configuration.
    #[clap(flatten)]
    pub store: BinaryStoreConfig,

    /// Local staging configuration.
    #[clap(flatten)]
    pub staging: StagingConfig,

    /// Object-storage provider configuration.
    #[clap(flatten)]
    pub provider: ProviderConfig,

    /// Operation to run.
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

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs configuration (no credentials).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            provider = %self.provider.provider,
            bucket = %self.store.bucket,
            staging_dir = ?self.staging.staging_dir,
            staging_expiry_secs = self.staging.staging_expiry_secs,
            staging_held_expiry_secs = self.staging.staging_held_expiry_secs,
            "Store configuration"
        );
    }

    /// Builds the staging cache and connects the store.
    pub async fn connect(&self) -> anyhow::Result<BinaryStore> {
        let staging =
            StagingCache::new(&self.staging).context("failed to create staging cache")?;
        self.provider.connect(self.store.clone(), staging).await
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
