#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for object client operations.
pub const TRACING_TARGET_CLIENT: &str = "bincas_object::client";

pub mod client;
mod error;
/// Bucket-scoped GCS and S3 backends.
pub mod providers;

#[doc(hidden)]
pub mod prelude;

pub use client::{GetOutput, HeadOutput, ObjectReader, ObjectStoreClient, PutAttributes, PutOutput};
pub use error::{Error, ErrorKind};
/// Write mode re-exported for create-only uploads.
pub use object_store::PutMode;
