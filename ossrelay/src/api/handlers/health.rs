//! Liveness endpoints.

use axum::Json;

use crate::api::models::relay::TestResponse;

#[utoipa::path(
    get,
    path = "/test",
    tag = "health",
    summary = "Liveness check",
    responses(
        (status = 200, description = "Service is up", body = TestResponse),
    )
)]
pub async fn test() -> Json<TestResponse> {
    Json(TestResponse {
        result: "success".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_returns_success() {
        let (server, _store) = create_test_app();

        let response = server.get("/test").await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({"result": "success"}));
    }

    #[tokio::test]
    async fn test_healthz() {
        let (server, _store) = create_test_app();

        let response = server.get("/healthz").await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.text(), "OK");
    }
}
