#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for staging cache operations.
///
/// Use this target for logging staging, eviction and expiry sweeps.
pub const TRACING_TARGET_CACHE: &str = "bincas_staging::cache";

mod cache;
mod config;
mod error;
mod staged;

pub use cache::StagingCache;
pub use config::{DEFAULT_EXPIRY_SECS, DEFAULT_HELD_EXPIRY_SECS, StagingConfig};
pub use error::{Error, Result};
pub use staged::StagedObject;
