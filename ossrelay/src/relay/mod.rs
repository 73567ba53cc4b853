//! Batch relay from the AI server into object storage.
//!
//! [`Relay::relay_batch`] walks the requested filenames in order. For each one it fetches the
//! file (verifying its declared length), derives a fresh object key, uploads the bytes, and
//! classifies the content to pick its public URL. Files are processed one at a time.
//!
//! The first failure aborts the batch and no partial result is returned. Objects uploaded
//! before the failing file stay in the bucket; there is no compensating delete.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::errors::{Error, Result};
use crate::storage::{ObjectStore, PublicUrls};

pub mod classify;
pub mod fetch;
pub mod naming;

use classify::{ContentKind, classify};
use fetch::{Upstream, UpstreamFetcher};

/// One relay request: which files to pull, and from where.
#[derive(Debug, Clone)]
pub struct Batch {
    pub filenames: Vec<String>,
    pub upstream: Upstream,
    /// Opaque caller identifier, carried for logging only
    pub client_id: Option<String>,
}

/// A file that has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedObject {
    pub key: String,
    pub kind: ContentKind,
    /// Public URL, empty when the content has no public form
    pub url: String,
}

/// Relays batches of files from an upstream server into an [`ObjectStore`].
#[derive(Clone)]
pub struct Relay {
    fetcher: Arc<dyn UpstreamFetcher>,
    store: Arc<dyn ObjectStore>,
    public_urls: PublicUrls,
}

impl Relay {
    pub fn new(fetcher: Arc<dyn UpstreamFetcher>, store: Arc<dyn ObjectStore>, public_urls: PublicUrls) -> Self {
        Self {
            fetcher,
            store,
            public_urls,
        }
    }

    /// Relay every file of `batch`, returning one entry per requested filename in request order.
    #[instrument(skip_all, fields(files = batch.filenames.len(), client_id = batch.client_id.as_deref().unwrap_or("-")))]
    pub async fn relay_batch(&self, batch: &Batch) -> Result<Vec<RelayedObject>> {
        let mut relayed = Vec::with_capacity(batch.filenames.len());

        for (index, filename) in batch.filenames.iter().enumerate() {
            let object = self.relay_one(&batch.upstream, filename, index).await.inspect_err(|_| {
                if index > 0 {
                    tracing::warn!(
                        stored = index,
                        "Batch aborted at {filename}; {index} earlier object(s) remain in bucket {}",
                        self.store.bucket()
                    );
                }
            })?;
            relayed.push(object);
        }

        info!(bucket = %self.store.bucket(), "Relayed {} file(s)", relayed.len());
        Ok(relayed)
    }

    #[instrument(skip(self, upstream))]
    async fn relay_one(&self, upstream: &Upstream, filename: &str, index: usize) -> Result<RelayedObject> {
        let file = self.fetcher.fetch(upstream, filename).await?;

        let key = naming::object_key_for(filename, index);
        let kind = classify(&file.bytes);
        let content_type = kind.content_type(&file.bytes);

        self.store
            .put_object(&key, file.bytes.clone(), content_type)
            .await
            .map_err(|source| Error::Storage { key: key.clone(), source })?;

        let url = self.public_urls.url_for(&key, kind);
        info!(key = %key, kind = ?kind, size = file.bytes.len(), "Stored object");

        Ok(RelayedObject { key, kind, url })
    }
}
