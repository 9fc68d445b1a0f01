pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/models", get(handlers::handle_list_models))
        .route("/api/v1/estimates", post(handlers::handle_estimate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::pipeline::testing::{catalog_model, MockCall, MockProvider};

    fn config(scope_config_dir: PathBuf) -> Config {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_api_base: "http://localhost".to_string(),
            llm_timeout_secs: 5,
            scope_config_dir,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn router(provider: MockProvider, scope_config_dir: PathBuf) -> Router {
        build_router(AppState::new(Arc::new(provider), config(scope_config_dir)))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(
            router(MockProvider::new(), PathBuf::from("scope_config")),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_models_reports_selection() {
        let (status, body) = send(
            router(MockProvider::new(), PathBuf::from("scope_config")),
            Request::get("/api/v1/models").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["selected_model"], "gemini-1.5-flash");
        assert_eq!(body["available_models"][0]["full_name"], "models/gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_models_lists_catalog_once() {
        let provider = Arc::new(MockProvider::new());
        let app = build_router(AppState::new(
            provider.clone(),
            config(PathBuf::from("scope_config")),
        ));
        let (status, body) = send(
            app,
            Request::get("/api/v1/models").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected_model"], "gemini-1.5-flash");
        assert_eq!(provider.calls(), vec![MockCall::ListModels]);
    }

    #[tokio::test]
    async fn test_models_falls_back_when_catalog_has_no_match() {
        let provider = MockProvider::new()
            .with_catalog(vec![catalog_model("models/text-embedding-004", &["embedContent"])]);
        let (status, body) = send(
            router(provider, PathBuf::from("scope_config")),
            Request::get("/api/v1/models").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["selected_model"], "gemini-1.5-flash");
        assert_eq!(body["available_models"], json!([]));
    }

    #[tokio::test]
    async fn test_models_reports_catalog_failure() {
        let (status, body) = send(
            router(MockProvider::new().with_failing_catalog(), PathBuf::from("scope_config")),
            Request::get("/api/v1/models").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_estimate_rejects_blank_document_path() {
        let (status, body) = send(
            router(MockProvider::new(), PathBuf::from("scope_config")),
            post_json("/api/v1/estimates", json!({"document_path": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_estimate_requires_reference_table() {
        let empty_dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            router(MockProvider::new(), empty_dir.path().to_path_buf()),
            post_json("/api/v1/estimates", json!({"document_path": "/tmp/doc.txt"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Scope config file is required"));
    }

    #[tokio::test]
    async fn test_estimate_runs_pipeline_with_located_table() {
        let scope_dir = tempfile::tempdir().unwrap();
        std::fs::write(scope_dir.path().join("scope.csv"), "Size,Hours\nSmall,8\n").unwrap();
        let mut document = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        document.write_all(b"Product: Login.").unwrap();

        let provider = MockProvider::new()
            .with_response(r#"[{"product":"Login","features":"OAuth"}]"#)
            .with_response(r#"[{"product":"Login","features":"OAuth","size":"Small","hours":8}]"#);

        let (status, body) = send(
            router(provider, scope_dir.path().to_path_buf()),
            post_json(
                "/api/v1/estimates",
                json!({"document_path": document.path()}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record_count"], 1);
        assert_eq!(body["records"][0]["size"], "Small");
        assert_eq!(body["records"][0]["hours"], 8);
    }

    #[tokio::test]
    async fn test_estimate_surfaces_extraction_failure() {
        let scope_dir = tempfile::tempdir().unwrap();
        std::fs::write(scope_dir.path().join("scope.csv"), "Size,Hours\nSmall,8\n").unwrap();
        let mut document = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        document.write_all(b"Product: Login.").unwrap();

        let (status, body) = send(
            router(
                MockProvider::new().with_response("not json"),
                scope_dir.path().to_path_buf(),
            ),
            post_json(
                "/api/v1/estimates",
                json!({"document_path": document.path()}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
    }
}
