//! Convenient re-exports for common use.

pub use crate::{
    BinaryHandle, BinaryStore, BinaryStoreConfig, Capabilities, ContentKey, Error, ObjectReader,
    Result,
};
