//! Convenience re-exports.

pub use crate::client::{GetOutput, HeadOutput, ObjectReader, ObjectStoreClient, PutAttributes, PutOutput};
pub use crate::providers::{BucketCredentials, GcsProvider, Provider, S3Provider};
pub use crate::{Error, ErrorKind, PutMode};
