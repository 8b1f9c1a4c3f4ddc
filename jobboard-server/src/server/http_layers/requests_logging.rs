//! Request logging middleware

use super::super::response::error_response;
use super::super::state::ServerState;
use axum::extract::State;
use axum::{
    body::Body,
    http::{header::HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info};

#[derive(PartialEq, PartialOrd, Clone, Debug, Default, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    Headers,
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

#[derive(Debug, PartialEq)]
enum ContentLength {
    Known(usize),
    Unknown(&'static str),
}

fn parse_content_length(headers: &HeaderMap) -> ContentLength {
    let Some(value) = headers.get("content-length") else {
        return ContentLength::Unknown("Content-length not set.");
    };
    let Ok(str_value) = value.to_str() else {
        return ContentLength::Unknown("Could not get Content-length string value.");
    };
    match str_value.parse::<usize>() {
        Ok(x) => ContentLength::Known(x),
        Err(_) => ContentLength::Unknown("Could not parse Content-length numeric value."),
    }
}

fn log_headers(title: &str, headers: &HeaderMap) {
    info!("  {}:", title);
    for (name, value) in headers.iter() {
        info!("    {:?}: {:?}", name, value);
    }
}

/// Logs a small body and hands back an equivalent one, since reading consumes it.
async fn log_body(title: &str, headers: &HeaderMap, body: Body) -> Result<Body, axum::Error> {
    match parse_content_length(headers) {
        ContentLength::Unknown(reason) => {
            info!("  {}: {}", title, reason);
            Ok(body)
        }
        ContentLength::Known(size) if size < MAX_LOGGABLE_BODY_LENGTH => {
            let bytes = axum::body::to_bytes(body, size).await?;
            info!("  {}:\n{}", title, String::from_utf8_lossy(&bytes));
            Ok(Body::from(bytes))
        }
        ContentLength::Known(size) => {
            info!(
                "  {}: Too big to log ({:#})",
                title,
                byte_unit::Byte::from(size)
            );
            Ok(body)
        }
    }
}

fn body_read_failure(what: &str, err: axum::Error) -> Response {
    error!("Failed to read {} body: {:?}", what, err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        vec![],
    )
}

pub async fn log_requests(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let level = state.config.requests_logging_level.clone();
    let start = Instant::now();

    if level > RequestsLoggingLevel::None {
        info!(">>> {} {}", request.method(), request.uri());
    }
    if level >= RequestsLoggingLevel::Headers {
        log_headers("Req Headers", request.headers());
    }

    let request = if level >= RequestsLoggingLevel::Body {
        let (parts, body) = request.into_parts();
        match log_body("Req Body", &parts.headers, body).await {
            Ok(body) => Request::from_parts(parts, body),
            Err(err) => return body_read_failure("request", err),
        }
    } else {
        request
    };

    let mut response = next.run(request).await;

    if level >= RequestsLoggingLevel::Headers {
        log_headers("Resp Headers", response.headers());
    }
    if level >= RequestsLoggingLevel::Body {
        let (parts, body) = response.into_parts();
        response = match log_body("Resp Body", &parts.headers, body).await {
            Ok(body) => Response::from_parts(parts, body),
            Err(err) => return body_read_failure("response", err),
        };
    }

    if level > RequestsLoggingLevel::None {
        info!(
            "<<< {} ({}ms)",
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
    }

    response
}
