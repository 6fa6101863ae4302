#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sentinel_core::gate::{NotificationGate, Notifier, NotifyError, NotifyPolicy};
use sentinel_core::service::MonitorService;
use sentinel_core::store::MemoryStore;
use tokio::sync::Mutex;
use tower::ServiceExt;

use sentinel_api::config::ServerConfig;
use sentinel_api::router::build_app_router;
use sentinel_api::state::AppState;

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub contact: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentNotification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, contact: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().await.push(SentNotification {
            contact: contact.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Everything a test needs to drive the app and inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub service: MonitorService,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    /// Wait for background notification deliveries to finish.
    pub async fn settle(&self) {
        assert!(
            self.service.drain_notifications(Duration::from_secs(5)).await,
            "notifications did not settle"
        );
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.notifier.sent.lock().await.clone()
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: None,
        notify_policy: NotifyPolicy::EveryReading,
        notify_timeout: Duration::from_secs(1),
    }
}

/// Build the full application router over an in-memory store and a
/// recording notifier, using the same middleware stack as production.
pub fn build_test_app(policy: NotifyPolicy) -> TestApp {
    let config = ServerConfig {
        notify_policy: policy,
        ..test_config()
    };
    let notifier = Arc::new(RecordingNotifier::default());
    let gate = NotificationGate::new(notifier.clone(), config.notify_policy, config.notify_timeout);
    let service = MonitorService::new(Arc::new(MemoryStore::new()), Arc::new(gate));

    let state = AppState {
        service: service.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        service,
        notifier,
    }
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty(), false).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty(), false).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Body::from(body.to_string()), true).await
}

pub async fn post_raw(app: &Router, uri: &str, body: &'static str) -> Response<Body> {
    send(app, Method::POST, uri, Body::from(body), true).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Body, json: bool) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if json {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder.body(body).unwrap();
    app.clone().oneshot(request).await.unwrap()
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

/// Register a patient through the API and assert it was created.
pub async fn register(app: &Router, patient_id: &str, age: u32) {
    let response = post_json(
        app,
        "/api/new_patient",
        serde_json::json!({
            "patient_id": patient_id,
            "attending_email": "szx2@duke.edu",
            "user_age": age,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Submit a heart rate through the API and assert it was accepted.
pub async fn post_heart_rate(app: &Router, patient_id: &str, heart_rate: u32) {
    let response = post_json(
        app,
        "/api/heart_rate",
        serde_json::json!({ "patient_id": patient_id, "heart_rate": heart_rate }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
