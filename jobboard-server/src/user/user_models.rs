use super::auth::PasswordHasher;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Public view of an account, never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_info: Map<String, Value>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordCredentials {
    pub hash: String,
    pub hasher: PasswordHasher,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessGrant {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserAccount,
}

/// Input field that failed registration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}
