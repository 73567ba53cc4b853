use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::Error;
use crate::relay::{Batch, RelayedObject, fetch::Upstream};

/// Request body of `POST /save-oss`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SaveOssRequest {
    /// Output filenames on the AI server, relayed in this order
    pub file_name_list: Vec<String>,
    /// Host of the AI server holding the files
    pub ai_server_host: String,
    /// Port of the AI server, as a string
    pub ai_server_port: String,
    /// Opaque identifier of the calling client
    #[serde(default)]
    pub client_id: Option<String>,
}

impl SaveOssRequest {
    /// Convert into a [`Batch`], rejecting empty required values.
    pub fn into_batch(self) -> Result<Batch, Error> {
        if self.file_name_list.is_empty() {
            return Err(Error::bad_request("file_name_list must not be empty"));
        }
        if let Some(position) = self.file_name_list.iter().position(|f| f.trim().is_empty()) {
            return Err(Error::bad_request(format!("file_name_list[{position}] must not be empty")));
        }
        if self.ai_server_host.trim().is_empty() {
            return Err(Error::bad_request("ai_server_host must not be empty"));
        }
        if self.ai_server_port.trim().is_empty() {
            return Err(Error::bad_request("ai_server_port must not be empty"));
        }

        Ok(Batch {
            filenames: self.file_name_list,
            upstream: Upstream {
                host: self.ai_server_host.trim().to_string(),
                port: self.ai_server_port.trim().to_string(),
            },
            client_id: self.client_id.filter(|id| !id.is_empty()),
        })
    }
}

/// One stored file in the `POST /save-oss` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct OssFile {
    /// Object key the file was stored under
    pub filename: String,
    /// Public URL, or empty when the content type has no public form
    pub oss_url: String,
}

impl From<RelayedObject> for OssFile {
    fn from(object: RelayedObject) -> Self {
        Self {
            filename: object.key,
            oss_url: object.url,
        }
    }
}

/// Body of every error response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
}

/// Body of `GET /test`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TestResponse {
    pub result: String,
}
