//! The JSON envelope every endpoint answers with.

use crate::user::{FieldError, UserError};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub field: Option<String>,
    pub meta: Option<Value>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            meta: None,
        }
    }

    pub fn validation(field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            field: field.map(str::to_string),
            ..Self::new(VALIDATION_ERROR_CODE, message)
        }
    }
}

impl From<FieldError> for ErrorDetail {
    fn from(err: FieldError) -> Self {
        ErrorDetail::validation(Some(err.field), err.message)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<Vec<ErrorDetail>>,
    pub meta: Option<Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Failure envelope with no data.
pub fn error_response(status: StatusCode, message: &str, errors: Vec<ErrorDetail>) -> Response {
    let body = ApiResponse::<Value> {
        success: false,
        message: message.to_string(),
        data: None,
        errors: Some(errors),
        meta: None,
    };
    (status, Json(body)).into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(Vec<ErrorDetail>),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::BadRequest(_) => error_response(
                StatusCode::BAD_REQUEST,
                &message,
                vec![ErrorDetail::new("BAD_REQUEST", message.clone())],
            ),
            ApiError::Unauthorized(_) => {
                let mut response = error_response(
                    StatusCode::UNAUTHORIZED,
                    &message,
                    vec![ErrorDetail::new("UNAUTHORIZED", message.clone())],
                );
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::NotFound(_) => error_response(
                StatusCode::NOT_FOUND,
                &message,
                vec![ErrorDetail::new("NOT_FOUND", message.clone())],
            ),
            ApiError::Validation(details) => {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, &message, details)
            }
            ApiError::Internal(err) => {
                error!("Internal error while serving request: {:#}", err);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &message,
                    vec![ErrorDetail::new("INTERNAL_ERROR", message.clone())],
                )
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailTaken => ApiError::BadRequest(err.to_string()),
            UserError::InvalidCredentials | UserError::InvalidToken | UserError::InvalidUserId => {
                ApiError::Unauthorized(err.to_string())
            }
            UserError::UserNotFound => ApiError::NotFound(err.to_string()),
            UserError::Validation(fields) => {
                ApiError::Validation(fields.into_iter().map(ErrorDetail::from).collect())
            }
            UserError::Internal(err) => ApiError::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::UNPROCESSABLE_ENTITY {
            ApiError::Validation(vec![ErrorDetail::validation(None, rejection.body_text())])
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(vec![ErrorDetail::validation(None, rejection.body_text())])
    }
}
