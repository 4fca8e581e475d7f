use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, Level, error, info, info_span, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_DIR: &str = "storage/logs";

/// Eight hex digits identifying one request in the logs.
pub fn new_request_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// Opens the `request` span for everything downstream and logs completion
/// by status class.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let span = info_span!(
        "request",
        id = %new_request_id(),
        method = %method,
        path = %path,
    );

    async move {
        info!(user_agent = %user_agent, "Incoming request");

        let response = next.run(req).await;
        let latency_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        match status {
            400..=499 => warn!(status, latency_ms, "Client error"),
            500..=599 => error!(status, latency_ms, "Server error"),
            _ => info!(status, latency_ms, "Request completed"),
        }

        response
    }
    .instrument(span)
    .await
}

/// Installs the global subscriber: JSON to stdout at `level`, and daily
/// rolling JSON and error-only files under `storage/logs`.
pub fn init_tracing(level: Level) -> std::io::Result<()> {
    use tracing_subscriber::fmt;

    std::fs::create_dir_all(LOG_DIR)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},chemstore_auth={},chemstore_db={},tower_http=warn",
            env!("CARGO_CRATE_NAME"),
            level,
            level,
            level
        ))
    });

    let console_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_target(false)
        .with_filter(console_filter);

    let error_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "chemstore.log");
    let error_layer = fmt::layer()
        .with_writer(error_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    let json_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "chemstore.json");
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(error_layer)
        .with(json_layer)
        .init();

    Ok(())
}
