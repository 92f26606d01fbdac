#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use shadowguard_client::ClientConfig;
use tokio::net::TcpListener;

pub type Reply = (StatusCode, Json<Value>);

pub struct BackendState {
    pub valid_token: String,
    pub check_reply: (StatusCode, Value),
    pub check_queries: Vec<HashMap<String, String>>,
    pub status_calls: usize,
    pub refresh_calls: usize,
    pub scanned: Vec<(String, usize)>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            valid_token: "acc-1".into(),
            check_reply: (StatusCode::OK, json!({"isRegistered": false})),
            check_queries: Vec::new(),
            status_calls: 0,
            refresh_calls: 0,
            scanned: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct Backend {
    pub state: Arc<Mutex<BackendState>>,
}

impl Backend {
    pub fn set_check(&self, status: StatusCode, body: Value) {
        self.state.lock().unwrap().check_reply = (status, body);
    }

    pub fn set_valid_token(&self, token: &str) {
        self.state.lock().unwrap().valid_token = token.into();
    }

    pub fn with<R>(&self, f: impl FnOnce(&BackendState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }
}

fn authorized(state: &BackendState, headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", state.valid_token))
        .unwrap_or(false)
}

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthorized", "statusCode": 401})),
    )
}

fn device(identifier: &str) -> Value {
    json!({
        "_id": "665f1c0a",
        "platform": "android",
        "osVersion": "14",
        "deviceModel": "Google Pixel 8",
        "appVersion": "1.2.3",
        "deviceIdentifier": identifier,
        "lastSeen": "2024-06-01T10:00:00.000Z",
        "lastRiskScore": 12
    })
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["password"] == "secret1" {
        (
            StatusCode::OK,
            Json(json!({
                "accessToken": "acc-1",
                "refreshToken": "ref-1",
                "user": {"_id": "u1", "email": body["email"], "name": "Amal"}
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials", "statusCode": 401})),
        )
    }
}

async fn refresh(State(b): State<Backend>, Json(body): Json<Value>) -> Reply {
    let mut s = b.state.lock().unwrap();
    s.refresh_calls += 1;
    if body["refreshToken"] == "ref-1" {
        s.valid_token = "acc-2".into();
        (
            StatusCode::OK,
            Json(json!({
                "accessToken": "acc-2",
                "refreshToken": "ref-2",
                "user": {"_id": "u1", "email": "amal@example.tn"}
            })),
        )
    } else {
        unauthorized()
    }
}

async fn register_user(Json(body): Json<Value>) -> Reply {
    if body["email"] == "taken@example.tn" {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Email already exists", "statusCode": 409})),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({"_id": "u2", "email": body["email"], "name": body["name"]})),
    )
}

async fn verify_otp(Json(body): Json<Value>) -> Reply {
    let valid = body["otp"] == "123456";
    let message = if valid { "OTP verified" } else { "Invalid OTP" };
    (
        StatusCode::OK,
        Json(json!({"message": message, "valid": valid})),
    )
}

async fn reset_password(Json(body): Json<Value>) -> Reply {
    let long_enough = body["newPassword"].as_str().is_some_and(|p| p.len() >= 6);
    if body["resetToken"] == "123456" && long_enough {
        (StatusCode::OK, Json(json!({"message": "Password reset successful"})))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Invalid reset token"})),
        )
    }
}

async fn me(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let s = b.state.lock().unwrap();
    if !authorized(&s, &headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!({"_id": "u1", "email": "amal@example.tn"})))
}

async fn update_profile(
    State(b): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let s = b.state.lock().unwrap();
    if !authorized(&s, &headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({"_id": id, "email": "amal@example.tn", "phone": body["phone"]})),
    )
}

async fn check(
    State(b): State<Backend>,
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Reply {
    let mut s = b.state.lock().unwrap();
    s.check_queries.push(q);
    if !authorized(&s, &headers) {
        return unauthorized();
    }
    let (status, body) = s.check_reply.clone();
    (status, Json(body))
}

async fn status(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let mut s = b.state.lock().unwrap();
    s.status_calls += 1;
    if !authorized(&s, &headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({"isDeviceRegistered": true, "deviceCount": 1, "devices": [device("AID123")]})),
    )
}

async fn device_by_identifier(
    State(b): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    let s = b.state.lock().unwrap();
    if !authorized(&s, &headers) {
        return unauthorized();
    }
    if id != "AID123" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Device not found", "statusCode": 404})),
        );
    }
    (StatusCode::OK, Json(device(&id)))
}

async fn register_device(
    State(b): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let s = b.state.lock().unwrap();
    if !authorized(&s, &headers) {
        return unauthorized();
    }
    let id = body["deviceIdentifier"].as_str().unwrap_or_default();
    let already = id == "AID-EXISTING";
    (
        StatusCode::OK,
        Json(json!({
            "message": "ok",
            "device": device(id),
            "isRegistered": already
        })),
    )
}

async fn scan(
    State(b): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = b.state.lock().unwrap();
    if !authorized(&s, &headers) {
        return unauthorized();
    }
    let n = body["apps"].as_array().map(Vec::len).unwrap_or(0);
    s.scanned.push((id, n));
    (
        StatusCode::OK,
        Json(json!({"scanId": "scan-1", "threatsFound": 2, "riskScore": 64})),
    )
}

/// Starts the fake backend and returns a config pointing at it.
pub async fn spawn_backend() -> (Backend, ClientConfig) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/reset-password", post(reset_password))
        .route(
            "/api/auth/forgot-password",
            post(|| async { Json(json!({"message": "Reset code sent"})) }),
        )
        .route("/api/users/register", post(register_user))
        .route("/api/users/me", get(me))
        .route("/api/users/profile/:id", axum::routing::patch(update_profile))
        .route("/api/devices/check", get(check))
        .route("/api/devices/status", get(status))
        .route("/api/devices/register", post(register_device))
        .route("/api/devices/identifier/:id", get(device_by_identifier))
        .route("/api/devices/:id/scan", post(scan))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig {
        api_base_url: format!("http://{addr}/"),
        timeout: Duration::from_secs(5),
        database_url: "sqlite::memory:".into(),
        ..Default::default()
    };
    (backend, config)
}

/// A config pointing at a port nobody listens on.
pub async fn unreachable_config() -> ClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ClientConfig {
        api_base_url: format!("http://{addr}"),
        timeout: Duration::from_secs(2),
        ..Default::default()
    }
}
