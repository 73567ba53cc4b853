//! Fetching generated files from the upstream AI server.
//!
//! The AI server exposes finished outputs at `GET /view?filename={name}&type=output`. The
//! [`UpstreamFetcher`] trait abstracts that call so the batch logic can be exercised against
//! a mock server.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, instrument};
use url::Url;

use crate::config::UpstreamConfig;
use crate::errors::{Error, Result};

/// Address of the AI server a batch is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub host: String,
    pub port: String,
}

/// A file read in full from the AI server.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    /// Filename as requested
    pub filename: String,
    pub bytes: Bytes,
    /// Content-Length the server declared, if any
    pub declared_len: Option<u64>,
}

impl FetchedFile {
    /// Reject the file when the server declared a length it did not deliver.
    pub fn verify_length(&self) -> Result<()> {
        let actual = self.bytes.len() as u64;
        match self.declared_len {
            Some(expected) if expected != actual => Err(Error::Truncated {
                filename: self.filename.clone(),
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    /// Fetch `filename` from `upstream`, verifying its declared length.
    ///
    /// # Errors
    /// - [`Error::InvalidUpstream`] if host and port do not form a URL
    /// - [`Error::Transport`] if the server cannot be reached
    /// - [`Error::UpstreamStatus`] for any non-2xx answer
    /// - [`Error::ReadBody`] if the body cannot be read to the end
    /// - [`Error::Truncated`] if fewer or more bytes arrive than declared
    async fn fetch(&self, upstream: &Upstream, filename: &str) -> Result<FetchedFile>;
}

/// Production fetcher using reqwest.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    view_path: String,
    file_type: String,
}

impl ReqwestFetcher {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.fetch_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            view_path: config.view_path.clone(),
            file_type: config.file_type.clone(),
        })
    }

    /// `http://{host}:{port}{view_path}?filename={filename}&type={file_type}`
    pub fn view_url(&self, upstream: &Upstream, filename: &str) -> std::result::Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("http://{}:{}", upstream.host, upstream.port))?;
        url.set_path(&self.view_path);
        url.query_pairs_mut()
            .append_pair("filename", filename)
            .append_pair("type", &self.file_type);
        Ok(url)
    }
}

#[async_trait]
impl UpstreamFetcher for ReqwestFetcher {
    #[instrument(skip(self, upstream), fields(host = %upstream.host, port = %upstream.port))]
    async fn fetch(&self, upstream: &Upstream, filename: &str) -> Result<FetchedFile> {
        let url = self.view_url(upstream, filename).map_err(|source| Error::InvalidUpstream {
            address: format!("{}:{}", upstream.host, upstream.port),
            source,
        })?;

        debug!(url = %url, "Fetching file from AI server");

        let response = self.client.get(url.clone()).send().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                filename: filename.to_string(),
                status: status.as_u16(),
            });
        }

        let declared_len = response.content_length();
        let bytes = response.bytes().await.map_err(|source| Error::ReadBody {
            filename: filename.to_string(),
            source,
        })?;

        let file = FetchedFile {
            filename: filename.to_string(),
            bytes,
            declared_len,
        };
        file.verify_length()?;

        debug!(size = file.bytes.len(), "Fetched file");
        Ok(file)
    }
}
