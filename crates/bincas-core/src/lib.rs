#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod content_key;
pub mod content_type;
mod hashing_reader;

#[doc(hidden)]
pub mod prelude;

pub use content_key::{ContentKey, ContentKeyError};
pub use hashing_reader::{Digested, HashingReader};
