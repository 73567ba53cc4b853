//! Object storage for relayed files.
//!
//! The relay only ever needs one write per file, so the [`ObjectStore`] trait is a single
//! `put_object` call. Two implementations are provided:
//!
//! - [`OssObjectStore`]: the production store, speaking the S3 protocol to an OSS-compatible
//!   endpoint through `aws-sdk-s3`
//! - [`InMemoryObjectStore`]: keeps objects in process, for tests and local runs without
//!   cloud credentials
//!
//! [`PublicUrls`] turns a stored key into the URL handed back to callers.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod in_memory;
pub mod oss;
mod public_url;

pub use in_memory::InMemoryObjectStore;
pub use oss::OssObjectStore;
pub use public_url::PublicUrls;

/// Errors raised by an [`ObjectStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend rejected or failed the write
    #[error("put_object for {key} failed: {message}")]
    Put { key: String, message: String },
}

/// A bucket that relayed files are written into.
///
/// The bucket and region are fixed for the lifetime of the process; implementations only
/// receive the key and body per call.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket objects are written to
    fn bucket(&self) -> &str;

    /// Store `body` under `key`, replacing any existing object.
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;
}
