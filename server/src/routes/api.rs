use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const USERS_CACHE_CONTROL: &str = "public, max-age=5";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (seq, updated_at, user_count, online_count) = {
        let snapshot = state.snapshot.read().await;
        (
            snapshot.seq,
            snapshot.updated_at.clone(),
            snapshot.user_count,
            snapshot.online_count,
        )
    };
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "seq": seq,
        "updated_at": updated_at,
        "users": user_count,
        "online": online_count,
        "update_mode": state.update_mode.as_str(),
        "observability": {
            "users_requests_total": observability.users_requests_total,
            "index_renders_total": observability.index_renders_total,
            "sse_connections_total": observability.sse_connections_total,
            "sse_lagged_total": observability.sse_lagged_total,
            "snapshot_updates_total": observability.snapshot_updates_total,
            "upstream_errors_total": observability.upstream_errors_total,
        }
    }))
}

/// Serve the pre-serialized user list for polling clients.
pub async fn get_users(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    state.observability.record_users_request();
    let (etag, json): (String, Arc<Bytes>) = {
        let snapshot = state.snapshot.read().await;
        (users_etag(snapshot.seq), Arc::clone(&snapshot.users_json))
    };

    if if_none_match_matches(&headers, &etag) {
        return not_modified_response(USERS_CACHE_CONTROL, Some(etag.as_str()));
    }

    json_bytes_response((*json).clone(), USERS_CACHE_CONTROL, Some(etag.as_str()))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (user_count, online_count) = {
        let snapshot = state.snapshot.read().await;
        (snapshot.user_count, snapshot.online_count)
    };
    let observability = state.observability.snapshot();

    let body = render_prometheus_metrics(user_count, online_count, observability);

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP {name} {help}");
    let _ = writeln!(body, "# TYPE {name} {kind}");
    let _ = writeln!(body, "{name} {value}");
}

fn render_prometheus_metrics(
    user_count: usize,
    online_count: usize,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "baltimare_users",
        "gauge",
        "Users in the current snapshot.",
        user_count as u64,
    );
    write_metric(
        &mut body,
        "baltimare_users_online",
        "gauge",
        "Users currently online in the snapshot.",
        online_count as u64,
    );
    write_metric(
        &mut body,
        "baltimare_users_requests_total",
        "counter",
        "Total /api/users requests.",
        observability.users_requests_total,
    );
    write_metric(
        &mut body,
        "baltimare_index_renders_total",
        "counter",
        "Total index pages rendered with an embedded snapshot.",
        observability.index_renders_total,
    );
    write_metric(
        &mut body,
        "baltimare_sse_connections_total",
        "counter",
        "Total live event stream connections opened.",
        observability.sse_connections_total,
    );
    write_metric(
        &mut body,
        "baltimare_sse_lagged_total",
        "counter",
        "Times a live client fell behind the broadcast buffer.",
        observability.sse_lagged_total,
    );
    write_metric(
        &mut body,
        "baltimare_snapshot_updates_total",
        "counter",
        "Total user list replacements published.",
        observability.snapshot_updates_total,
    );
    write_metric(
        &mut body,
        "baltimare_upstream_errors_total",
        "counter",
        "Total failed fetches from the upstream user source.",
        observability.upstream_errors_total,
    );
    body
}

fn users_etag(seq: u64) -> String {
    format!("\"users-{seq}\"")
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use baltimare_shared::UserRecord;
    use chrono::DateTime;
    use tower::ServiceExt;

    use super::{if_none_match_matches, render_prometheus_metrics};
    use crate::services::user_source::publish_users;
    use crate::state::{AppState, ObservabilitySnapshot};

    async fn spawn_test_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = crate::app::build_app(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    fn user(id: &str, minutes: u64, online: bool) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: id.to_string(),
            online,
            minutes,
            last_seen: DateTime::from_timestamp(1_723_420_800, 0).expect("valid timestamp"),
            traits: Vec::new(),
        }
    }

    #[test]
    fn metrics_output_contains_prometheus_help_type_and_values() {
        let observability = ObservabilitySnapshot {
            users_requests_total: 12,
            index_renders_total: 4,
            sse_connections_total: 7,
            sse_lagged_total: 1,
            snapshot_updates_total: 99,
            upstream_errors_total: 3,
        };

        let metrics = render_prometheus_metrics(42, 5, observability);

        assert!(metrics.contains("# HELP baltimare_users Users in the current snapshot."));
        assert!(metrics.contains("# TYPE baltimare_users_requests_total counter"));
        assert!(metrics.contains("# TYPE baltimare_users_online gauge"));
        assert!(metrics.contains("baltimare_users 42"));
        assert!(metrics.contains("baltimare_users_online 5"));
        assert!(metrics.contains("baltimare_users_requests_total 12"));
        assert!(metrics.contains("baltimare_index_renders_total 4"));
        assert!(metrics.contains("baltimare_sse_connections_total 7"));
        assert!(metrics.contains("baltimare_sse_lagged_total 1"));
        assert!(metrics.contains("baltimare_snapshot_updates_total 99"));
        assert!(metrics.contains("baltimare_upstream_errors_total 3"));
    }

    #[test]
    fn if_none_match_supports_weak_and_multiple_etags() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::IF_NONE_MATCH,
            axum::http::HeaderValue::from_static("W/\"other\", \"users-42\""),
        );
        assert!(if_none_match_matches(&headers, "\"users-42\""));
        assert!(!if_none_match_matches(&headers, "\"users-43\""));
    }

    #[tokio::test]
    async fn users_endpoint_serves_empty_list_before_first_fetch() {
        let app = crate::app::build_app(AppState::for_tests());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("users request");

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(body.as_ref(), b"[]");
    }

    #[tokio::test]
    async fn users_endpoint_returns_not_modified_when_etag_matches() {
        let state = AppState::for_tests();
        publish_users(&state, vec![user("a", 300, true), user("b", 100, false)]).await;

        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        let first = client
            .get(format!("{base_url}/api/users"))
            .send()
            .await
            .expect("users request should succeed");
        let first_status = first.status();
        let first_etag = first
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("etag header should be present");
        let users = first
            .json::<Vec<UserRecord>>()
            .await
            .expect("users response should be a list");

        assert_eq!(first_status, reqwest::StatusCode::OK);
        assert_eq!(first_etag, "\"users-1\"");
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "a");

        let second = client
            .get(format!("{base_url}/api/users"))
            .header(reqwest::header::IF_NONE_MATCH, first_etag)
            .send()
            .await
            .expect("conditional users request should succeed");

        assert_eq!(second.status(), reqwest::StatusCode::NOT_MODIFIED);
        assert_eq!(
            second
                .headers()
                .get(reqwest::header::CACHE_CONTROL)
                .and_then(|value| value.to_str().ok()),
            Some("public, max-age=5")
        );

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn health_and_metrics_expose_expected_contract() {
        let state = AppState::for_tests();
        publish_users(&state, vec![user("a", 300, true), user("b", 100, false)]).await;
        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        client
            .get(format!("{base_url}/api/users"))
            .send()
            .await
            .expect("users request")
            .error_for_status()
            .expect("users status");

        let health = client
            .get(format!("{base_url}/api/health"))
            .send()
            .await
            .expect("health request")
            .error_for_status()
            .expect("health status")
            .json::<serde_json::Value>()
            .await
            .expect("parse health");

        assert_eq!(health.get("status").and_then(|v| v.as_str()), Some("ok"));
        assert_eq!(health.get("users").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(health.get("online").and_then(|v| v.as_u64()), Some(1));
        assert_eq!(
            health.get("update_mode").and_then(|v| v.as_str()),
            Some("live")
        );
        assert_eq!(
            health
                .get("observability")
                .and_then(|v| v.get("users_requests_total"))
                .and_then(|v| v.as_u64()),
            Some(1)
        );

        let metrics = client
            .get(format!("{base_url}/api/metrics"))
            .send()
            .await
            .expect("metrics request")
            .error_for_status()
            .expect("metrics status")
            .text()
            .await
            .expect("parse metrics text");

        assert!(metrics.contains("# TYPE baltimare_users_requests_total counter"));
        assert!(metrics.contains("baltimare_users 2"));
        assert!(metrics.contains("baltimare_users_online 1"));
        assert!(metrics.contains("baltimare_users_requests_total 1"));
        assert!(metrics.contains("baltimare_snapshot_updates_total 1"));

        server_handle.abort();
        let _ = server_handle.await;
    }
}
