#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use illustrator_api::config::ServerConfig;
use illustrator_api::router::build_app_router;
use illustrator_api::state::AppState;
use illustrator_comfyui::gateway::{ComfyUIConfig, DEFAULT_POLL_INTERVAL};
use illustrator_pipeline::testing::FakeSynthesizer;
use illustrator_pipeline::PipelineOptions;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over a fake synthesizer and a temporary output directory.
///
/// The `TempDir` must outlive the router; keep the whole struct alive.
pub struct TestApp {
    pub router: Router,
    pub synth: Arc<FakeSynthesizer>,
    pub output: TempDir,
    /// Shares the generation lock with the router.
    pub state: AppState,
}

/// Build a test `ServerConfig` writing into `output_dir`.
pub fn test_config(output_dir: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        output_dir: output_dir.to_string(),
        comfyui: ComfyUIConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            checkpoint: "test.safetensors".to_string(),
            negative_prompt: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        },
        pipeline: PipelineOptions {
            synthesis_timeout: Duration::from_secs(5),
            ..PipelineOptions::default()
        },
    }
}

/// Build the full application router, same middleware stack as `main.rs`.
pub fn build_test_app(synth: FakeSynthesizer) -> TestApp {
    build_test_app_with(synth, |_| {})
}

/// Same as [`build_test_app`], with the config adjusted before the router is built.
pub fn build_test_app_with(
    synth: FakeSynthesizer,
    adjust: impl FnOnce(&mut ServerConfig),
) -> TestApp {
    let output = tempfile::tempdir().unwrap();
    let mut config = test_config(output.path().to_str().unwrap());
    adjust(&mut config);
    let synth = Arc::new(synth);
    let state = AppState::new(config.clone(), synth.clone());
    TestApp {
        router: build_app_router(state.clone(), &config),
        synth,
        output,
        state,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST an `application/x-www-form-urlencoded` body.
pub async fn post_form(app: Router, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    let body = serde_urlencoded::to_string(fields).unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a `multipart/form-data` body with text fields only.
pub async fn post_multipart(app: Router, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    const BOUNDARY: &str = "illustrator-test-boundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

