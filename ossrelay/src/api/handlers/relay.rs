//! HTTP handler relaying AI server outputs into object storage.

use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::AppState;
use crate::api::models::relay::{ErrorResponse, OssFile, SaveOssRequest};
use crate::errors::Result;

#[utoipa::path(
    post,
    path = "/save-oss",
    tag = "relay",
    summary = "Relay files to OSS",
    description = "Fetch each named file from the AI server, store it in the bucket, and return the stored keys with their public URLs, in request order. The first failing file aborts the batch; files stored before it are not removed.",
    request_body = SaveOssRequest,
    responses(
        (status = 200, description = "All files stored", body = [OssFile]),
        (status = 400, description = "Malformed or incomplete request body", body = ErrorResponse),
        (status = 500, description = "Fetch, read, length check or upload failed", body = ErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn save_oss(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaveOssRequest>, JsonRejection>,
) -> Result<Json<Vec<OssFile>>> {
    let Json(request) = payload?;
    let batch = request.into_batch()?;

    let relayed = state.relay.relay_batch(&batch).await?;

    Ok(Json(relayed.into_iter().map(OssFile::from).collect()))
}

#[cfg(test)]
mod tests {
    use crate::api::models::relay::OssFile;
    use crate::test_utils::{GLB, PNG, create_test_app, upstream_for};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve_file(server: &MockServer, filename: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(query_param("filename", filename))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_save_oss_relays_batch() {
        let upstream = MockServer::start().await;
        serve_file(&upstream, "ComfyUI_00001_.png", PNG).await;
        serve_file(&upstream, "mesh.glb", GLB).await;

        let (server, store) = create_test_app();
        let address = upstream_for(&upstream);

        let response = server
            .post("/save-oss")
            .json(&json!({
                "file_name_list": ["ComfyUI_00001_.png", "mesh.glb"],
                "ai_server_host": address.host,
                "ai_server_port": address.port,
                "client_id": "client-42"
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let files: Vec<OssFile> = response.json();
        assert_eq!(files.len(), 2);

        assert!(files[0].filename.ends_with("_0.png"));
        assert_eq!(
            files[0].oss_url,
            format!("https://test-bucket.oss-cn-hangzhou.aliyuncs.com/{}?x-oss-process=style/small", files[0].filename)
        );
        assert!(files[1].filename.ends_with("_1.glb"));
        assert_eq!(
            files[1].oss_url,
            format!("https://test-bucket.oss-cn-hangzhou.aliyuncs.com/{}", files[1].filename)
        );

        assert_eq!(store.len(), 2);
        assert!(store.get(&files[0].filename).is_some());
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected_without_fetching() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let (server, store) = create_test_app();
        let address = upstream_for(&upstream);

        let bodies = [
            json!({"ai_server_host": address.host, "ai_server_port": address.port}),
            json!({"file_name_list": ["a.png"], "ai_server_port": address.port}),
            json!({"file_name_list": ["a.png"], "ai_server_host": address.host}),
        ];

        for body in bodies {
            let response = server.post("/save-oss").json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let json: Value = response.json();
            assert_eq!(json["message"], "parse json args error");
            assert!(!json["error"].as_str().unwrap().is_empty());
        }

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (server, _store) = create_test_app();

        let response = server
            .post("/save-oss")
            .content_type("application/json")
            .bytes("{not json".into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["message"], "parse json args error");
    }

    #[tokio::test]
    async fn test_unparseable_port_is_a_fetch_failure() {
        let (server, store) = create_test_app();

        let response = server
            .post("/save-oss")
            .json(&json!({
                "file_name_list": ["a.png"],
                "ai_server_host": "127.0.0.1",
                "ai_server_port": "abc"
            }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = response.json();
        assert_eq!(json["message"], "Failed to fetch file from AI server");
        assert!(json["error"].as_str().unwrap().contains("127.0.0.1:abc"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_status_is_returned_to_caller() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&upstream)
            .await;

        let (server, store) = create_test_app();
        let address = upstream_for(&upstream);

        let response = server
            .post("/save-oss")
            .json(&json!({
                "file_name_list": ["missing.png"],
                "ai_server_host": address.host,
                "ai_server_port": address.port
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["message"], "Failed to fetch file");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_mid_batch_failure_returns_no_partial_results() {
        let upstream = MockServer::start().await;
        serve_file(&upstream, "a.png", PNG).await;
        Mock::given(method("GET"))
            .and(query_param("filename", "b.png"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&upstream)
            .await;

        let (server, store) = create_test_app();
        let address = upstream_for(&upstream);

        let response = server
            .post("/save-oss")
            .json(&json!({
                "file_name_list": ["a.png", "b.png"],
                "ai_server_host": address.host,
                "ai_server_port": address.port
            }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = response.json();
        assert!(json.get("message").is_some());
        assert!(!json.is_array());

        // The first file is already stored
        assert_eq!(store.len(), 1);
    }
}
