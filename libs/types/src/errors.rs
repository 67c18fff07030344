//! Error taxonomy for the order book engine
//!
//! Ordinary match outcomes (empty opposing book, zero fill) are not
//! errors; they come back as empty trade lists. Errors here are
//! persistence failures, corrupt bytes, and missing entities on restore.

use thiserror::Error;

/// Persistence boundary failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("batch write failed after {committed} of {total} entries")]
    BatchFailed { committed: usize, total: usize },
}

/// Serialization / deserialization failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("unsupported entity type: {0}")]
    UnsupportedType(String),
}

/// Top-level order book error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("entity not found under key {key}")]
    NotFound { key: String },
}
