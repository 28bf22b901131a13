//! API middleware
//!
//! The activity log middleware buffers each request and response so their
//! bodies can be recorded, then writes one `UserActivityLog` row per request
//! through the activity repository. A failed write is logged and the client
//! still gets its response.

use std::net::SocketAddr;
use std::sync::OnceLock;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use domain_forecast::UserActivityLog;
use infra_db::Repository;

use crate::AppState;

/// Largest request body the middleware will buffer; matches axum's default
pub const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "set-cookie"];

/// Facts about the serving process, recorded on every entry
#[derive(Debug, Clone)]
struct HostInfo {
    source_name: String,
    os_version: String,
    host: Option<String>,
    username: Option<String>,
    domain_name: Option<String>,
}

fn host_info() -> &'static HostInfo {
    static HOST_INFO: OnceLock<HostInfo> = OnceLock::new();
    HOST_INFO.get_or_init(|| HostInfo {
        source_name: env!("CARGO_PKG_NAME").to_string(),
        os_version: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        host: std::env::var("HOSTNAME").ok(),
        username: std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok(),
        domain_name: std::env::var("USERDOMAIN").ok(),
    })
}

/// Renders headers as a JSON object, hiding credentials
pub fn headers_to_json(headers: &HeaderMap) -> String {
    let map: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "[redacted]".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), serde_json::Value::String(value))
        })
        .collect();
    serde_json::Value::Object(map).to_string()
}

fn body_text(bytes: &Bytes) -> Option<String> {
    (!bytes.is_empty()).then(|| String::from_utf8_lossy(bytes).into_owned())
}

/// Activity logging middleware
///
/// Records method, path, headers, bodies, and status of every request.
pub async fn activity_log_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.application.enable_activity_log {
        return next.run(request).await;
    }

    let start = Utc::now();
    let (parts, body) = request.into_parts();
    let request_body = match to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, path = %parts.uri.path(), "Request body rejected");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let host = host_info();
    let mut entry = UserActivityLog::new(start);
    entry.source_name = Some(host.source_name.clone());
    entry.os_version = Some(host.os_version.clone());
    entry.host = host.host.clone();
    entry.username = host.username.clone();
    entry.domain_name = host.domain_name.clone();
    entry.address = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    entry.request_method = Some(parts.method.to_string());
    entry.request_path = Some(parts.uri.path().to_string());
    entry.request_headers = Some(headers_to_json(&parts.headers));
    entry.request_body = body_text(&request_body);

    let response = next
        .run(Request::from_parts(parts, Body::from(request_body)))
        .await;

    let (parts, body) = response.into_parts();
    let response_body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Response body could not be buffered");
            Bytes::new()
        }
    };

    entry.response_status_code = Some(i32::from(parts.status.as_u16()));
    entry.response_headers = Some(headers_to_json(&parts.headers));
    entry.response_body = body_text(&response_body);

    info!(
        method = entry.request_method.as_deref().unwrap_or_default(),
        path = entry.request_path.as_deref().unwrap_or_default(),
        status = parts.status.as_u16(),
        duration_ms = (Utc::now() - start).num_milliseconds(),
        "API request"
    );

    let mut repo = state.activity_repository();
    if let Err(e) = repo.create(entry).await {
        warn!(error = %e, "Failed to persist activity log entry");
    }

    Response::from_parts(parts, Body::from(response_body))
}
