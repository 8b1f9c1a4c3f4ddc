use anyhow::{Context, Result};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

use super::auth_routes::make_auth_routes;
use super::job_routes::make_job_routes;
use super::response::{error_response, ApiResponse, ErrorDetail};
use super::state::{GuardedJobStore, GuardedUserManager, ServerState};
use super::{log_requests, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub message: &'static str,
    pub uptime: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> ApiResponse<ServerStats> {
    let stats = ServerStats {
        message: "Welcome to the Job Board API",
        uptime: format_uptime(state.start_time.elapsed()),
    };
    ApiResponse::success("Service running", stats)
}

async fn health(State(state): State<ServerState>) -> Response {
    let check = state
        .user_manager
        .ping()
        .context("user database")
        .and_then(|_| state.job_store.ping().context("jobs database"));

    match check {
        Ok(()) => ApiResponse::success("Service healthy", json!({"db": "connected"})).into_response(),
        Err(err) => {
            warn!("Health check failed: {:#}", err);
            let body = ApiResponse::<Value> {
                success: false,
                message: "Service unhealthy".to_string(),
                data: Some(json!({"db": "error", "error": format!("{:#}", err)})),
                errors: Some(vec![ErrorDetail::new("SERVICE_UNAVAILABLE", "Database unreachable")]),
                meta: None,
            };
            body.into_response_with(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

async fn not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "Not found",
        vec![ErrorDetail::new("NOT_FOUND", "Not found")],
    )
}

async fn method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        vec![ErrorDetail::new("METHOD_NOT_ALLOWED", "Method not allowed")],
    )
}

fn make_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn make_app(
    config: ServerConfig,
    user_manager: GuardedUserManager,
    job_store: GuardedJobStore,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), user_manager, job_store);

    let app: Router = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .merge(make_auth_routes())
        .merge(make_job_routes())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(make_cors_layer(&config.cors_origins))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state);

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    user_manager: GuardedUserManager,
    job_store: GuardedJobStore,
    shutdown: CancellationToken,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, user_manager, job_store)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    info!("Server stopped");
    Ok(())
}
