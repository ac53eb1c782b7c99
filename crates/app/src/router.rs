use std::{sync::Arc, time::Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use workright_storage::Database;

use crate::{
    departments, documents, employees, onboarding, payroll, recruitment, rostering, telemetry,
    travel, workflow,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database) -> Self {
        Self {
            metrics,
            storage,
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Calendar day used for defaulted dates such as hire dates.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .nest("/departments", departments::routes())
        .nest("/employees", employees::routes())
        .nest("/recruitment", recruitment::routes())
        .nest("/onboarding", onboarding::routes())
        .nest("/payroll", payroll::routes())
        .nest("/rostering", rostering::routes())
        .nest("/travel", travel::routes())
        .nest("/workflow", workflow::routes())
        .nest("/documents", documents::routes())
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "WorkRight HRIS API" }))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> Response {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        Body::from(body),
    )
        .into_response()
}

/// Logs every request and records the HTTP metrics.
async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string();

    let mut response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    counter!("http_requests_total", "method" => method.clone(), "status" => status.to_string())
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method.clone())
        .record(elapsed.as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    info!(
        stage = "http",
        %request_id,
        %method,
        %path,
        status,
        latency_ms = elapsed.as_millis() as u64,
        "request completed"
    );
    response
}


#[cfg(test)]
mod tests {
    use super::testing::setup_app;
    use super::*;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn root_returns_banner() {
        let app = setup_app().await;

        let (status, body) = app.get("/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "WorkRight HRIS API");
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let app = setup_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn metrics_exports_build_info() {
        let app = setup_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        let body = String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8");
        assert!(body.contains("app_build_info"));
        assert!(body.contains("app_uptime_seconds"));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = setup_app().await;

        let (status, _) = app.get("/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clock_is_injectable() {
        let app = setup_app().await;

        assert_eq!(app.state.now(), super::testing::fixed_now());
        assert_eq!(
            app.state.today(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }
}
