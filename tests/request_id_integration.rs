use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use carousel_backend::{AppConfig, AppState, build_app, config::ImagesConfig};

/// 图片目录指向一个普通文件，扫描必然失败
fn broken_folder_app(tmp: &tempfile::TempDir) -> Router {
    let bogus = tmp.path().join("plain-file");
    std::fs::write(&bogus, b"x").expect("write file");
    let config = AppConfig {
        images: ImagesConfig {
            folder: bogus.to_string_lossy().into_owned(),
            ..ImagesConfig::default()
        },
        ..AppConfig::default()
    };
    build_app(AppState::new(config).expect("app state"))
}

async fn send(app: Router, uri: &str, request_id: Option<&str>) -> (StatusCode, String, Value) {
    let mut req = Request::builder().uri(uri);
    if let Some(id) = request_id {
        req = req.header("x-request-id", id);
    }
    let resp = app
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .expect("call app");
    let status = resp.status();
    let echoed = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, echoed, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn retrieval_failure_body_carries_client_request_id() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (status, echoed, body) =
        send(broken_folder_app(&tmp), "/api/images", Some("scan.fail-01")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(echoed, "scan.fail-01");
    assert_eq!(body["code"], "RETRIEVAL_FAILED");
    assert_eq!(body["requestId"], "scan.fail-01");
}

#[tokio::test]
async fn invalid_seed_body_carries_generated_request_id() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let app = build_app(
        AppState::new(AppConfig {
            images: ImagesConfig {
                folder: tmp.path().to_string_lossy().into_owned(),
                ..ImagesConfig::default()
            },
            ..AppConfig::default()
        })
        .expect("app state"),
    );

    let (status, echoed, body) = send(app, "/api/carousel?seed=oops", Some("bad id/!")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(echoed.starts_with("req_"), "got: {echoed}");
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["requestId"], echoed.as_str());
}

#[tokio::test]
async fn successful_and_fallback_responses_still_echo_id() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let app = broken_folder_app(&tmp);

    // 轮播图加载失败时降级为兜底图片，仍是 200
    let (status, echoed, body) = send(app.clone(), "/api/carousel", Some("carousel-42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, "carousel-42");
    assert_eq!(body["meta"]["fallback"], true);
    assert!(body.get("requestId").is_none());

    let (status, echoed, _) = send(app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(echoed.starts_with("req_"));
}
