use crate::config::Config;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use axum::body::{Body, HttpBody};
use axum::http::{Request, Response, header};
use axum::middleware::Next;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const BODY_LIMIT: usize = 64 * 1024;
const PREVIEW_LIMIT: usize = 16 * 1024;

/// Keep guards alive for the lifetime of the app.
pub struct LogGuards {
    _file_guard: WorkerGuard,
}

fn split_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let file = path
        .file_name()
        .unwrap_or_else(|| OsStr::new("setlog.logs"))
        .to_string_lossy()
        .to_string();
    (dir, file)
}

pub fn init_logging(config: &Config) -> LogGuards {
    let filter = EnvFilter::new(config.log_filter());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_ansi(true)
        .compact()
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()));

    let (dir, file) = split_path(&config.log_file);
    let appender = tracing_appender::rolling::never(dir, file);
    let (nb, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_writer(nb);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    LogGuards { _file_guard: guard }
}

fn request_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn preview(bytes: &[u8]) -> String {
    if bytes.len() > PREVIEW_LIMIT {
        format!(
            "{}… [truncated]",
            String::from_utf8_lossy(&bytes[..PREVIEW_LIMIT])
        )
    } else {
        String::from_utf8_lossy(bytes).to_string()
    }
}

/// One line per request: method, path, status, latency.
pub async fn access_log(req: Request<Body>, next: Next) -> Response<Body> {
    let req_id = request_id(&req);
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    tracing::info!(
        request_id = %req_id,
        method = %method,
        path = %path,
        status = %res.status(),
        latency_ms = %started.elapsed().as_millis(),
        "request"
    );
    res
}

/// Whether a body is small enough to buffer for a preview. Bodies of unknown
/// or larger size are streamed through untouched.
fn bufferable(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .and_then(|n| usize::try_from(n).ok())
        .is_some_and(|n| n <= BODY_LIMIT)
}

/// Logs JSON request & response bodies at debug level, truncating previews.
/// Includes the request-id for correlation.
pub async fn log_payloads(req: Request<Body>, next: Next) -> Response<Body> {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return next.run(req).await;
    }

    let req_id = request_id(&req);

    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let req = if is_json && bufferable(req.body()) {
        let (parts, body) = req.into_parts();
        match axum::body::to_bytes(body, BODY_LIMIT).await {
            Ok(bytes) => {
                tracing::debug!(request_id = %req_id, request_body = %preview(&bytes), "request body");
                Request::from_parts(parts, Body::from(bytes))
            }
            Err(e) => {
                tracing::warn!(request_id = %req_id, error = %e, "failed reading request body");
                Request::from_parts(parts, Body::empty())
            }
        }
    } else {
        req
    };

    let res = next.run(req).await;

    if !bufferable(res.body()) {
        tracing::debug!(request_id = %req_id, "response body too large to preview");
        return res;
    }

    let (parts, body) = res.into_parts();
    match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => {
            tracing::debug!(request_id = %req_id, response_body = %preview(&bytes), "response body");
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::warn!(request_id = %req_id, error = %e, "failed reading response body");
            Response::from_parts(parts, Body::empty())
        }
    }
}
