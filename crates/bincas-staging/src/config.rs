//! Staging cache configuration.

use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default unused-window, in seconds, after which staged content is swept.
pub const DEFAULT_EXPIRY_SECS: u64 = 60;

/// Default window, in seconds, after which content a caller still holds is
/// swept anyway.
pub const DEFAULT_HELD_EXPIRY_SECS: u64 = 900;

/// Configuration for the local staging cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StagingConfig {
    /// Directory for staged content (defaults to a private temporary directory)
    #[cfg_attr(
        feature = "config",
        arg(long = "staging-dir", env = "BINCAS_STAGING_DIR")
    )]
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Seconds a staged entry may stay untouched before it is swept
    #[cfg_attr(
        feature = "config",
        arg(
            long = "staging-expiry-secs",
            env = "BINCAS_STAGING_EXPIRY_SECS",
            default_value_t = DEFAULT_EXPIRY_SECS
        )
    )]
    #[serde(default = "default_expiry_secs")]
    pub staging_expiry_secs: u64,

    /// Seconds held (not yet evicted) content may stay untouched before it is swept
    #[cfg_attr(
        feature = "config",
        arg(
            long = "staging-held-expiry-secs",
            env = "BINCAS_STAGING_HELD_EXPIRY_SECS",
            default_value_t = DEFAULT_HELD_EXPIRY_SECS
        )
    )]
    #[serde(default = "default_held_expiry_secs")]
    pub staging_held_expiry_secs: u64,
}

fn default_expiry_secs() -> u64 {
    DEFAULT_EXPIRY_SECS
}

fn default_held_expiry_secs() -> u64 {
    DEFAULT_HELD_EXPIRY_SECS
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            staging_dir: None,
            staging_expiry_secs: DEFAULT_EXPIRY_SECS,
            staging_held_expiry_secs: DEFAULT_HELD_EXPIRY_SECS,
        }
    }
}

impl StagingConfig {
    /// Returns the unused-window as a Duration.
    #[inline]
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.staging_expiry_secs)
    }

    /// Returns the window for held content, never shorter than
    /// [`expiry`](Self::expiry).
    #[inline]
    pub fn held_expiry(&self) -> Duration {
        Duration::from_secs(self.staging_held_expiry_secs.max(self.staging_expiry_secs))
    }

    /// Set the staging directory.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Set the unused-window in seconds.
    #[must_use]
    pub fn with_expiry_secs(mut self, secs: u64) -> Self {
        self.staging_expiry_secs = secs;
        self
    }

    /// Set the window for held content in seconds.
    #[must_use]
    pub fn with_held_expiry_secs(mut self, secs: u64) -> Self {
        self.staging_held_expiry_secs = secs;
        self
    }
}
