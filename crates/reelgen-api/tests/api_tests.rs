//! Router tests against in-memory collaborators.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use reelgen_api::{create_router, ApiConfig, AppState, SlidingWindowGovernor};
use reelgen_models::ServiceFlags;
use reelgen_pipeline::{
    Collaborators, FootageDownloader, FootageSearch, MediaProbe, PipelineOrchestrator,
    RecordingSleeper, ScriptGenerator, SearchTermGenerator, SpeechSynthesizer, StepResult,
    SubtitleGenerator, VideoAssembler,
};
use reelgen_progress::ProgressStore;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const SCRIPT: &str = "Volcanoes shape the planet from the inside out. \
                      Their ash feeds soil for centuries after an eruption.";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeScript {
    script: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl ScriptGenerator for FakeScript {
    async fn generate_script(&self, _topic: &str) -> StepResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.script.to_string())
    }
}

struct FakeTerms;

#[async_trait]
impl SearchTermGenerator for FakeTerms {
    async fn search_terms(&self, _topic: &str, count: usize, _script: &str) -> StepResult<Vec<String>> {
        Ok(["lava", "crater", "ash cloud"]
            .iter()
            .take(count)
            .map(|t| t.to_string())
            .collect())
    }
}

struct FakeSearch;

#[async_trait]
impl FootageSearch for FakeSearch {
    async fn search(&self, term: &str, _per_page: u32, _min_duration: u32) -> StepResult<Vec<String>> {
        let slug = term.replace(' ', "-");
        Ok(vec![
            format!("https://cdn.example.com/{}-1.mp4", slug),
            format!("https://cdn.example.com/{}-2.mp4", slug),
        ])
    }
}

struct FakeDownloader;

#[async_trait]
impl FootageDownloader for FakeDownloader {
    async fn download(&self, url: &str) -> StepResult<PathBuf> {
        let name = url.rsplit('/').next().unwrap_or("clip.mp4");
        Ok(PathBuf::from(format!("/work/{}", name)))
    }
}

struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _script: &str, voice: &str) -> StepResult<PathBuf> {
        Ok(PathBuf::from(format!("/work/voice_{}.mp3", voice)))
    }
}

struct FakeSubtitles;

#[async_trait]
impl SubtitleGenerator for FakeSubtitles {
    async fn generate_subtitles(&self, audio: &Path, _script: &str) -> StepResult<PathBuf> {
        Ok(audio.with_extension("srt"))
    }
}

struct FakeAssembler;

#[async_trait]
impl VideoAssembler for FakeAssembler {
    async fn assemble(&self, _videos: &[PathBuf], _audio: &Path, _subtitles: &Path) -> StepResult<PathBuf> {
        Ok(PathBuf::from("/work/final.mp4"))
    }
}

struct FakeProbe;

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn duration(&self, _path: &Path) -> StepResult<f64> {
        Ok(42.0)
    }

    async fn resolution(&self, _path: &Path) -> StepResult<String> {
        Ok("1080x1920".to_string())
    }

    async fn file_size(&self, _path: &Path) -> StepResult<u64> {
        Ok(3 * 1024 * 1024)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct TestApp {
    router: Router,
    work_dir: TempDir,
    script: Arc<FakeScript>,
}

fn test_app(config: ApiConfig, script: &'static str) -> TestApp {
    let work_dir = tempfile::tempdir().unwrap();
    let script = Arc::new(FakeScript {
        script,
        calls: AtomicUsize::new(0),
    });

    let collaborators = Collaborators {
        script: script.clone(),
        search_terms: Arc::new(FakeTerms),
        footage: Arc::new(FakeSearch),
        downloader: Arc::new(FakeDownloader),
        speech: Arc::new(FakeSpeech),
        subtitles: Arc::new(FakeSubtitles),
        assembler: Arc::new(FakeAssembler),
        publisher: None,
        probe: Arc::new(FakeProbe),
    };

    let orchestrator = PipelineOrchestrator::new(
        collaborators,
        ProgressStore::in_memory(),
        Arc::new(RecordingSleeper::new()),
    );

    let services = ServiceFlags {
        pexels_api: true,
        tiktok_session: false,
        imagemagick: false,
        assembly_ai: true,
    };

    let state = AppState::from_parts(
        config,
        orchestrator,
        SlidingWindowGovernor::new(),
        work_dir.path().to_path_buf(),
        services,
    );

    TestApp {
        router: create_router(state, None),
        work_dir,
        script,
    }
}

fn default_app() -> TestApp {
    test_app(ApiConfig::default(), SCRIPT)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// A generation request arriving from socket peer `peer`.
fn generate_request(peer: &str, body: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let ip: IpAddr = peer.parse().unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip, 40_000)));
    request
}

fn forwarded_generate_request(peer: &str, forwarded_for: &str, body: &str) -> Request<Body> {
    let mut request = generate_request(peer, body);
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ---------------------------------------------------------------------------
// Health and progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_configured_services() {
    let app = default_app();

    let (status, body) = send(&app.router, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["services"]["pexels_api"], true);
    assert_eq!(body["services"]["tiktok_session"], false);
    assert_eq!(body["services"]["imagemagick"], false);
    assert_eq!(body["services"]["assembly_ai"], true);
}

#[tokio::test]
async fn test_progress_before_any_run() {
    let app = default_app();

    let (status, body) = send(&app.router, get("/api/progress")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], 0);
    assert_eq!(body["total_steps"], 7);
    assert_eq!(body["percentage"], 0);
    assert_eq!(body["message"], "Starting...");
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = default_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("X-Request-ID", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let app = default_app();

    let response = app.router.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_generate_success_updates_progress() {
    let app = default_app();

    let (status, body) = send(
        &app.router,
        generate_request("203.0.113.1", r#"{"videoSubject":"  volcanoes  "}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["video_path"], "/work/final.mp4");
    assert_eq!(body["message"], "Video generated successfully!");
    assert_eq!(body["metadata"]["duration"], 42.0);
    assert_eq!(body["metadata"]["resolution"], "1080x1920");
    assert_eq!(body["metadata"]["file_size"], "3.0 MB");
    assert!(body.get("publish").is_none());

    let (_, progress) = send(&app.router, get("/api/progress")).await;
    assert_eq!(progress["step"], 7);
    assert_eq!(progress["percentage"], 100);
}

#[tokio::test]
async fn test_generate_pipeline_failure_is_reported_in_body() {
    let app = test_app(ApiConfig::default(), "Too short.");

    let (status, body) = send(
        &app.router,
        generate_request("203.0.113.1", r#"{"videoSubject":"volcanoes"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error_code"], "GENERATION_ERROR");
    assert!(!body["suggestions"].as_array().unwrap().is_empty());
    assert_eq!(app.script.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_generate_rejects_blank_subject() {
    let app = default_app();

    let (status, body) = send(
        &app.router,
        generate_request("203.0.113.1", r#"{"videoSubject":"   "}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("videoSubject"));
    assert_eq!(app.script.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_rejects_malformed_body() {
    let app = default_app();

    let (status, body) = send(&app.router, generate_request("203.0.113.1", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app.router,
        generate_request("203.0.113.1", r#"{"voice":"en_us_001"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_sliding_window_quota() {
    let app = default_app();
    let body = r#"{"videoSubject":"volcanoes"}"#;

    for _ in 0..3 {
        let (status, _) = send(&app.router, generate_request("198.51.100.7", body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, rejected) = send(&app.router, generate_request("198.51.100.7", body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(rejected["error"], "Rate limit exceeded");
    assert_eq!(rejected["message"], "Maximum 3 requests per 15 minutes");

    // Another client still has its own quota.
    let (status, _) = send(&app.router, generate_request("198.51.100.8", body)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.script.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_reset_quota() {
    let app = default_app();
    let body = r#"{"videoSubject":"volcanoes"}"#;

    let mut admitted = 0;
    for i in 0..8 {
        let forwarded = format!("198.18.0.{}", i);
        let (status, _) = send(
            &app.router,
            forwarded_generate_request("203.0.113.9", &forwarded, body),
        )
        .await;
        if status == StatusCode::OK {
            admitted += 1;
        } else {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        }
    }

    assert_eq!(admitted, 3);
}

#[tokio::test]
async fn test_forwarded_for_keys_quota_behind_trusted_proxy() {
    let config = ApiConfig {
        trust_proxy_headers: true,
        ..Default::default()
    };
    let app = test_app(config, SCRIPT);
    let body = r#"{"videoSubject":"volcanoes"}"#;

    for _ in 0..3 {
        let (status, _) = send(
            &app.router,
            forwarded_generate_request("10.0.0.2", "198.51.100.7", body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(
        &app.router,
        forwarded_generate_request("10.0.0.2", "198.51.100.7", body),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Same proxy, different client.
    let (status, _) = send(
        &app.router,
        forwarded_generate_request("10.0.0.2", "198.51.100.8", body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_burst_throttle() {
    let config = ApiConfig {
        rate_limit_rps: 2,
        ..Default::default()
    };
    let app = test_app(config, SCRIPT);

    for _ in 0..2 {
        let response = app.router.clone().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.router.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "1");
}

#[tokio::test]
async fn test_body_size_limit() {
    let config = ApiConfig {
        max_body_size: 64,
        ..Default::default()
    };
    let app = test_app(config, SCRIPT);

    let body = format!(r#"{{"videoSubject":"{}"}}"#, "x".repeat(200));
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ---------------------------------------------------------------------------
// Video download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_video_served_as_attachment() {
    let app = default_app();
    let bytes = b"not really an mp4".to_vec();
    std::fs::write(app.work_dir.path().join("final.mp4"), &bytes).unwrap();

    let response = app.router.clone().oneshot(get("/api/video/final.mp4")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"final.mp4\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.to_vec(), bytes);
}

#[tokio::test]
async fn test_missing_video() {
    let app = default_app();

    let (status, body) = send(&app.router, get("/api/video/nope.mp4")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({"error": "Video not found"}));
}

#[tokio::test]
async fn test_video_rejects_traversal_and_directories() {
    let app = default_app();
    std::fs::create_dir(app.work_dir.path().join("clips")).unwrap();

    for uri in ["/api/video/..%2Fsecret.env", "/api/video/clips"] {
        let (status, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "Video not found");
    }
}
