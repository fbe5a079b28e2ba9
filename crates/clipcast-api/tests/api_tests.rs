//! API integration tests.
//!
//! Routed through the full middleware stack via `tower::ServiceExt::oneshot`
//! with storage pointed at a local mock server. Nothing here shells out to
//! ffmpeg or yt-dlp.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clipcast_api::{create_router, ApiConfig, AppState};
use clipcast_storage::{SupabaseClient, SupabaseConfig};

struct TestApp {
    router: axum::Router,
    _downloads: tempfile::TempDir,
    temp: tempfile::TempDir,
}

async fn build_app(storage_server: &MockServer) -> TestApp {
    let downloads = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();

    tokio::fs::write(downloads.path().join("talk.mp4"), b"not a real mp4")
        .await
        .unwrap();

    let config = ApiConfig {
        downloads_dir: downloads.path().to_path_buf(),
        temp_dir: temp.path().to_path_buf(),
        ..ApiConfig::default()
    };
    let storage = SupabaseClient::new(SupabaseConfig {
        project_url: storage_server.uri(),
        service_key: "service-key".to_string(),
        bucket: "videos".to_string(),
    });

    TestApp {
        router: create_router(AppState::with_storage(config, storage)),
        _downloads: downloads,
        temp,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_clip_video_rejects_inverted_range() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/clip-video?inputFileName=talk.mp4&startTime=20&endTime=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("end"));
}

#[tokio::test]
async fn test_clip_video_rejects_malformed_offset() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/clip-video?inputFileName=talk.mp4&startTime=abc&endTime=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("startTime"));
}

#[tokio::test]
async fn test_clip_video_missing_local_file_is_404() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/clip-video?inputFileName=missing.mp4&startTime=0&endTime=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("missing.mp4"));
}

#[tokio::test]
async fn test_clip_video_missing_source_params_is_400() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/clip-video?startTime=0&endTime=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// An unreachable external URL fails during materialization with a JSON
/// error and leaves no temp files behind.
#[tokio::test]
async fn test_clip_video_unreachable_url_cleans_up() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/clip-video?identifier=http%3A%2F%2F127.0.0.1%3A1%2Fv.mp4&sourceType=external_url&startTime=0&endTime=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"].as_str().is_some());

    let mut entries = tokio::fs::read_dir(app.temp.path()).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_download_video_storage_object_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/sign/videos/uploads/talk.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signedURL": "/object/sign/videos/uploads/talk.mp4?token=tok123"
        })))
        .mount(&server)
        .await;

    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/download-video?identifier=uploads%2Ftalk.mp4&sourceType=supabase")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.contains("token=tok123"));
    assert!(location.starts_with(&server.uri()));
}

#[tokio::test]
async fn test_download_video_plain_url_redirects_to_source() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/download-video?identifier=https%3A%2F%2Fexample.com%2Fmedia%2Ftalk.mp4&sourceType=external_url")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/media/talk.mp4"
    );
}

#[tokio::test]
async fn test_analyze_url_rejects_non_http_url() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze-url")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"url": "ftp://example.com/v.mp4"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Invalid URL"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let server = MockServer::start().await;
    let app = build_app(&server).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().contains_key("X-Request-ID"));
}
