//! Gateway tests against an in-process fake ComfyUI server.
//!
//! The fake implements just enough of the HTTP API (`/prompt`,
//! `/history/{id}`, `/view`, `/free`, `/system_stats`) to drive a full
//! submit -> poll -> download cycle.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use illustrator_comfyui::gateway::{ComfyUIConfig, ComfyUIGateway};
use illustrator_core::gateway::{ImageSynthesizer, SynthesisError};
use illustrator_core::generation::GenerationSettings;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Fake server
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct FakeComfy {
    /// History polls answered with `{}` before the result appears.
    pending_polls: u32,
    /// When set, history reports this execution error.
    fail_with: Option<String>,
    polls: Arc<AtomicU32>,
    frees: Arc<AtomicU32>,
    submitted: Arc<Mutex<Vec<Value>>>,
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::new(64, 32);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn submit(State(fake): State<FakeComfy>, Json(body): Json<Value>) -> Json<Value> {
    fake.submitted.lock().unwrap().push(body["prompt"].clone());
    Json(json!({ "prompt_id": "p-1", "number": 0 }))
}

async fn history(State(fake): State<FakeComfy>, Path(id): Path<String>) -> Json<Value> {
    let n = fake.polls.fetch_add(1, Ordering::SeqCst);
    if n < fake.pending_polls {
        return Json(json!({}));
    }
    if let Some(msg) = &fake.fail_with {
        return Json(json!({
            id: {
                "outputs": {},
                "status": {
                    "status_str": "error",
                    "completed": false,
                    "messages": [["execution_error", {
                        "exception_type": "RuntimeError",
                        "exception_message": msg
                    }]]
                }
            }
        }));
    }
    Json(json!({
        id: {
            "outputs": { "9": { "images": [ { "filename": "out.png", "subfolder": "", "type": "output" } ] } },
            "status": { "status_str": "success", "completed": true, "messages": [] }
        }
    }))
}

async fn view(Query(params): Query<std::collections::HashMap<String, String>>) -> (StatusCode, Vec<u8>) {
    if params.get("filename").map(String::as_str) == Some("out.png")
        && params.get("type").map(String::as_str) == Some("output")
    {
        (StatusCode::OK, png_bytes())
    } else {
        (StatusCode::NOT_FOUND, Vec::new())
    }
}

async fn free(State(fake): State<FakeComfy>) -> StatusCode {
    fake.frees.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn stats() -> Json<Value> {
    Json(json!({ "system": { "comfyui_version": "test" }, "devices": [] }))
}

async fn spawn_fake(fake: FakeComfy) -> SocketAddr {
    let app = Router::new()
        .route("/prompt", post(submit))
        .route("/history/{id}", get(history))
        .route("/view", get(view))
        .route("/free", post(free))
        .route("/interrupt", post(|| async { StatusCode::OK }))
        .route("/system_stats", get(stats))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn gateway_for(addr: SocketAddr) -> ComfyUIGateway {
    ComfyUIGateway::new(ComfyUIConfig {
        api_url: format!("http://{addr}"),
        checkpoint: "sd_turbo.safetensors".into(),
        negative_prompt: String::new(),
        poll_interval: Duration::from_millis(5),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn synthesize_polls_until_output_and_downloads_image() {
    let fake = FakeComfy {
        pending_polls: 2,
        ..Default::default()
    };
    let addr = spawn_fake(fake.clone()).await;
    let gateway = gateway_for(addr);

    let request = GenerationSettings::default().request("a boy finds a dragon");
    let image = gateway.synthesize(&request).await.unwrap();

    assert_eq!((image.width, image.height), (64, 32));
    assert_eq!(fake.polls.load(Ordering::SeqCst), 3);

    let submitted = fake.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["6"]["inputs"]["text"], "a boy finds a dragon");
    assert_eq!(submitted[0]["3"]["inputs"]["steps"], 12);
}

#[tokio::test]
async fn execution_error_surfaces_as_execution_failure() {
    let fake = FakeComfy {
        fail_with: Some("CUDA out of memory".into()),
        ..Default::default()
    };
    let addr = spawn_fake(fake).await;
    let gateway = gateway_for(addr);

    let request = GenerationSettings::default().request("x");
    let err = gateway.synthesize(&request).await.unwrap_err();
    assert_matches!(err, SynthesisError::Execution(msg) if msg.contains("CUDA out of memory"));
}

#[tokio::test]
async fn release_calls_free_endpoint() {
    let fake = FakeComfy::default();
    let addr = spawn_fake(fake.clone()).await;
    let gateway = gateway_for(addr);

    gateway.release().await.unwrap();
    assert_eq!(fake.frees.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn health_succeeds_against_live_server() {
    let addr = spawn_fake(FakeComfy::default()).await;
    assert!(gateway_for(addr).health().await.is_ok());
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    // Bind and drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = gateway_for(addr).health().await.unwrap_err();
    assert_matches!(err, SynthesisError::Unavailable(_));
}
