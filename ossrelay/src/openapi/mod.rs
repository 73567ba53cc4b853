//! OpenAPI documentation for the relay API, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::api;
use crate::api::models::relay::{ErrorResponse, OssFile, SaveOssRequest, TestResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ossrelay",
        description = "Relays generated files from an AI server into object storage"
    ),
    paths(api::handlers::health::test, api::handlers::relay::save_oss),
    components(schemas(SaveOssRequest, OssFile, ErrorResponse, TestResponse)),
    tags(
        (name = "health", description = "Liveness checks"),
        (name = "relay", description = "Relay AI server outputs into object storage"),
    )
)]
pub struct ApiDoc;
