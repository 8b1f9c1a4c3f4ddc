use super::response::{ApiError, ApiResponse};
use super::session::Session;
use super::state::{GuardedUserManager, ServerState};
use crate::user::{AccessGrant, Registration, UserAccount};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Deserialize)]
struct RegisterBody {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub profile_info: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    debug!("register() called for {}", body.email);
    let user = user_manager.register(Registration {
        name: body.name,
        email: body.email,
        password: body.password,
        profile_info: body.profile_info,
    })?;
    Ok(ApiResponse::success("User registered successfully", user)
        .into_response_with(StatusCode::CREATED))
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<ApiResponse<AccessGrant>, ApiError> {
    let Json(body) = body?;
    debug!("login() called for {}", body.email);
    let grant = user_manager.authenticate(&body.email, &body.password)?;
    Ok(ApiResponse::success("Login successful", grant))
}

async fn me(session: Session) -> ApiResponse<UserAccount> {
    ApiResponse::success("Current user fetched successfully", session.user)
}

pub fn make_auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}
