//! Convenience re-exports.

pub use crate::content_type::{OCTET_STREAM, TEXT_PLAIN};
pub use crate::{ContentKey, ContentKeyError, Digested, HashingReader};
