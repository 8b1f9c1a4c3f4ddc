use super::response::ApiError;
use super::state::ServerState;
use crate::user::UserAccount;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

pub const NOT_AUTHENTICATED_MESSAGE: &str = "Not authenticated";

/// The account behind the bearer token of the current request.
#[derive(Debug)]
pub struct Session {
    pub user: UserAccount,
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    debug!("No usable bearer token: {}", rejection);
                    ApiError::Unauthorized(NOT_AUTHENTICATED_MESSAGE.to_string())
                })?;

        let user = state.user_manager.current_user(bearer.token())?;
        debug!("Authenticated request for user {}", user.id);
        Ok(Session { user })
    }
}
