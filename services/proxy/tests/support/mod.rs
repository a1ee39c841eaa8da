//! Shared helpers for the proxy integration tests
//!
//! `FakeUpstream` stands in for the school-data API on an ephemeral port and
//! counts how often the schedule endpoint is hit.

#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use proxy::{config::ServiceConfig, routes::create_router, state::AppState};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const USERNAME: &str = "schueler";
pub const PASSWORD: &str = "geheim";
pub const VALID_TOKEN: &str = "token-schueler";

/// Behaviour of the fake schedule endpoint
#[derive(Debug, Clone, Copy)]
pub enum ScheduleMode {
    Ok,
    Status(StatusCode),
    Slow(Duration),
}

#[derive(Clone)]
struct FakeState {
    schedule_calls: Arc<AtomicUsize>,
    mode: Arc<Mutex<ScheduleMode>>,
}

/// In-process stand-in for the upstream API
pub struct FakeUpstream {
    pub base_url: String,
    state: FakeState,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let state = FakeState {
            schedule_calls: Arc::new(AtomicUsize::new(0)),
            mode: Arc::new(Mutex::new(ScheduleMode::Ok)),
        };

        let router = Router::new()
            .route("/login", post(fake_login))
            .route("/healthcheck", get(fake_healthcheck))
            .route("/api/", get(fake_schedule))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("fake upstream address");
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("fake upstream server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_mode(&self, mode: ScheduleMode) {
        *self.state.mode.lock().expect("mode lock") = mode;
    }

    pub fn schedule_calls(&self) -> usize {
        self.state.schedule_calls.load(Ordering::SeqCst)
    }
}

/// Schedule payload returned by the `n`-th upstream call
pub fn schedule_payload(n: usize) -> Value {
    json!({
        "createdAt": format!("2024-01-08T07:{:02}:00Z", n),
        "courses": {
            "5a": {
                "substitution": [{
                    "id": format!("sub-{}", n),
                    "date": "08.01.2024",
                    "weekDay": ["Mo", "Montag"],
                    "content": [{
                        "info": "Vertretung",
                        "position": "3",
                        "room": "A101",
                        "subject": "Ma",
                        "teacher": "MÜL",
                        "topic": ""
                    }]
                }]
            }
        }
    })
}

async fn fake_login(Json(body): Json<Value>) -> Response {
    match (body["username"].as_str(), body["password"].as_str()) {
        (Some(USERNAME), Some(PASSWORD)) => Json(json!({"access_token": VALID_TOKEN})).into_response(),
        (Some("gesperrt"), _) => (StatusCode::FORBIDDEN, Json(json!({}))).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"msg": "bad credentials"})),
        )
            .into_response(),
    }
}

async fn fake_healthcheck(headers: HeaderMap) -> StatusCode {
    let expected = format!("Bearer {}", VALID_TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => StatusCode::OK,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn fake_schedule(State(state): State<FakeState>) -> Response {
    let call = state.schedule_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let mode = *state.mode.lock().expect("mode lock");

    match mode {
        ScheduleMode::Ok => Json(schedule_payload(call)).into_response(),
        ScheduleMode::Status(status) => (status, Json(json!({}))).into_response(),
        ScheduleMode::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(schedule_payload(call)).into_response()
        }
    }
}

/// Build the proxy against `base_url`, letting the test adjust the config
pub fn proxy_app(base_url: &str, tweak: impl FnOnce(&mut ServiceConfig)) -> (Router, AppState) {
    let mut config = ServiceConfig {
        api_url: base_url.to_string(),
        ..ServiceConfig::default()
    };
    tweak(&mut config);

    let state = AppState::new(config).expect("app state");
    (create_router(state.clone()), state)
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub fn get_request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("auth_token={}", token));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"username": username, "password": password}).to_string(),
        ))
        .expect("request")
}

pub fn logout_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri("/api/auth");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("auth_token={}", token));
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect()
}

/// Whether the response tells the browser to drop the session cookie
pub fn clears_session(response: &Response) -> bool {
    set_cookies(response)
        .iter()
        .any(|cookie| cookie.starts_with("auth_token=;") && cookie.contains("Max-Age=0"))
}
