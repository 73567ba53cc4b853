//! OSS-backed object store.
//!
//! Aliyun OSS accepts the S3 wire protocol on `https://oss-{region}.aliyuncs.com`, so the
//! production store is a thin wrapper around `aws_sdk_s3::Client`.
//!
//! Credentials are read from `OSS_ACCESS_KEY_ID` / `OSS_ACCESS_KEY_SECRET` (and optionally
//! `OSS_SESSION_TOKEN`) when both are set, and otherwise from the default AWS provider chain.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{RequestChecksumCalculation, ResponseChecksumValidation},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use bytes::Bytes;
use tracing::{debug, info, instrument};

use super::{ObjectStore, StorageError};
use crate::config::StorageConfig;

const ACCESS_KEY_ID_VAR: &str = "OSS_ACCESS_KEY_ID";
const ACCESS_KEY_SECRET_VAR: &str = "OSS_ACCESS_KEY_SECRET";
const SESSION_TOKEN_VAR: &str = "OSS_SESSION_TOKEN";

pub struct OssObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl OssObjectStore {
    /// Build a store from configuration. Does not contact the endpoint.
    pub async fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let endpoint = config.endpoint_url();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&endpoint);

        if let Some(credentials) = credentials_from_env() {
            debug!("Using OSS credentials from {}", ACCESS_KEY_ID_VAR);
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;

        // OSS does not accept the flexible checksum headers newer SDKs send by default
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        info!(bucket = %config.bucket, region = %config.region, endpoint = %endpoint, "OSS object store configured");

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }
}

fn credentials_from_env() -> Option<Credentials> {
    let access_key_id = std::env::var(ACCESS_KEY_ID_VAR).ok()?;
    let secret_access_key = std::env::var(ACCESS_KEY_SECRET_VAR).ok()?;
    let session_token = std::env::var(SESSION_TOKEN_VAR).ok();

    Some(Credentials::new(access_key_id, secret_access_key, session_token, None, "oss-environment"))
}

#[async_trait]
impl ObjectStore for OssObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, body), fields(bucket = %self.bucket, size = body.len()))]
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Put {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!("Object stored");
        Ok(())
    }
}
