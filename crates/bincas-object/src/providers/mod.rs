//! Bucket-scoped backends behind the [`Provider`] trait.

mod gcs;
mod provider;
mod s3;

pub use gcs::{GcsCredentials, GcsProvider};
pub use provider::{BucketCredentials, Provider};
pub use s3::{DEFAULT_REGION, S3Credentials, S3Provider};
