#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for store operations.
pub const TRACING_TARGET_STORE: &str = "bincas_store::store";

mod capability;
mod config;
mod error;
mod handle;
mod remote;
mod store;

pub mod prelude;

pub use bincas_core::ContentKey;
pub use bincas_object::ObjectReader;
pub use capability::Capabilities;
pub use config::BinaryStoreConfig;
pub use error::{Error, Result};
pub use handle::BinaryHandle;
pub use remote::{EXTRACTED_TEXT_SUFFIX, KEY_METADATA, primary_name, sidecar_name};
pub use store::BinaryStore;
