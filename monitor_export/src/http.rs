//! HTTP access to the registries of a [`Monitor`].
//!
//! `GET` lists every value of a kind (an empty array when nothing has been
//! recorded), `DELETE` resets it, and `GET /{kind}/:namespace/:id` reads one
//! point.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use monitor_core::{CollectionKind, IndicatorValue, MeteringValue, Monitor, MonitorError};
use serde::Serialize;
use tracing::{info, warn};

pub fn router(monitor: Monitor) -> Router {
    Router::new()
        .route("/stopwatch", get(list_metering).delete(reset_metering))
        .route("/stopwatch/:namespace/:id", get(read_metering))
        .route("/stayset", get(list_indicators).delete(reset_indicators))
        .route("/stayset/:namespace/:id", get(read_indicator))
        .with_state(monitor)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError(MonitorError);

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MonitorError::NotFound { .. } => StatusCode::NOT_FOUND,
            MonitorError::Stopped { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

async fn list_metering(
    State(monitor): State<Monitor>,
) -> Result<Json<Vec<MeteringValue>>, ApiError> {
    Ok(Json(monitor.stop_watches().values().await?))
}

async fn reset_metering(State(monitor): State<Monitor>) -> Result<Json<&'static str>, ApiError> {
    let namespaces = monitor.stop_watches().reset().await?;
    info!("Reset metering point values ({} namespaces)", namespaces);
    Ok(Json("metering point values reset"))
}

async fn read_metering(
    State(monitor): State<Monitor>,
    Path((namespace, id)): Path<(String, String)>,
) -> Result<Json<MeteringValue>, ApiError> {
    let stop_watch = monitor
        .stop_watches()
        .get(&namespace)
        .ok_or_else(|| not_found(CollectionKind::StopWatch, &namespace, &id))?;
    Ok(Json(stop_watch.read(&id).await?))
}

async fn list_indicators(
    State(monitor): State<Monitor>,
) -> Result<Json<Vec<IndicatorValue>>, ApiError> {
    Ok(Json(monitor.indicators().values().await?))
}

async fn reset_indicators(
    State(monitor): State<Monitor>,
) -> Result<Json<&'static str>, ApiError> {
    let namespaces = monitor.indicators().reset().await?;
    info!("Reset indicator point values ({} namespaces)", namespaces);
    Ok(Json("indicator point values reset"))
}

async fn read_indicator(
    State(monitor): State<Monitor>,
    Path((namespace, id)): Path<(String, String)>,
) -> Result<Json<IndicatorValue>, ApiError> {
    let indicator = monitor
        .indicators()
        .get(&namespace)
        .ok_or_else(|| not_found(CollectionKind::StaySetIndicator, &namespace, &id))?;
    Ok(Json(indicator.read(&id).await?))
}

fn not_found(kind: CollectionKind, namespace: &str, id: &str) -> ApiError {
    ApiError(MonitorError::NotFound {
        kind,
        namespace: namespace.to_string(),
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use monitor_core::MonitorConfig;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn call(monitor: &Monitor, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router(monitor.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, body)
    }

    fn monitor() -> Monitor {
        Monitor::new(MonitorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let m = monitor();
        let (status, body) = call(&m, Method::GET, "/stopwatch").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_and_reset_metering() {
        let m = monitor();
        let mp = m.stop_watches().for_namespace("ns").metering_point("a");
        for millis in [1, 2, 3] {
            mp.record(Duration::from_millis(millis)).await.unwrap();
        }

        let (status, body) = call(&m, Method::GET, "/stopwatch").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["namespace"], "ns");
        assert_eq!(body[0]["quantity"], 3);
        assert_eq!(body[0]["average"], "2ms");

        let (status, _) = call(&m, Method::DELETE, "/stopwatch").await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&m, Method::GET, "/stopwatch").await;
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_read_single_indicator() {
        let m = monitor();
        m.indicators().for_namespace("ns").increase("b").await.unwrap();

        let (status, body) = call(&m, Method::GET, "/stayset/ns/b").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current"], 1);

        let (status, body) = call(&m, Method::GET, "/stayset/ns/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));

        let (status, _) = call(&m, Method::GET, "/stayset/unknown/b").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(m.indicators().get("unknown").is_none());
    }

    #[tokio::test]
    async fn test_stopped_monitor() {
        let m = monitor();
        m.stop_watch();
        m.stop();

        let (status, _) = call(&m, Method::GET, "/stopwatch").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = call(&m, Method::DELETE, "/stopwatch").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let m = monitor();
        let (status, _) = call(&m, Method::POST, "/stayset").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
