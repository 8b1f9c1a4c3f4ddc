use super::{
    auth::PasswordHasher,
    jwt::TokenIssuer,
    user_models::{AccessGrant, FieldError, PasswordCredentials, UserAccount},
    UserStore,
};
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAX_NAME_CHARS: usize = 255;
const MIN_PASSWORD_CHARS: usize = 6;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid");
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token. Please login again.")]
    InvalidToken,

    #[error("Invalid user ID")]
    InvalidUserId,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Registration input as received from the client.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub profile_info: Option<Map<String, Value>>,
}

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

/// Emails are matched case-insensitively and without surrounding spaces.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self {
            user_store,
            hasher: PasswordHasher::default(),
            tokens,
        }
    }

    pub fn register(&self, registration: Registration) -> Result<UserAccount, UserError> {
        let errors = validate_registration(&registration);
        if !errors.is_empty() {
            return Err(UserError::Validation(errors));
        }

        let email = normalize_email(&registration.email);
        if self.user_store.get_user_by_email(&email)?.is_some() {
            return Err(UserError::EmailTaken);
        }

        let user = UserAccount {
            id: Uuid::new_v4(),
            name: registration.name.trim().to_string(),
            email,
            profile_info: registration.profile_info.unwrap_or_default(),
            created_at: Utc::now().naive_utc(),
        };
        let credentials = PasswordCredentials {
            hash: self.hasher.hash(&registration.password)?,
            hasher: self.hasher,
        };

        // A concurrent registration may have taken the email since the check above.
        if !self.user_store.create_user(&user, &credentials)? {
            return Err(UserError::EmailTaken);
        }

        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<AccessGrant, UserError> {
        let email = normalize_email(email);
        let (user, credentials) = match self.user_store.get_user_by_email(&email)? {
            Some(found) => found,
            None => {
                debug!("Login attempt for unknown email {}", email);
                return Err(UserError::InvalidCredentials);
            }
        };

        let matches = credentials
            .hasher
            .verify(password, &credentials.hash)
            .unwrap_or_else(|e| {
                warn!("Stored password hash of user {} is unreadable: {}", user.id, e);
                false
            });
        if !matches {
            debug!("Wrong password for user {}", user.id);
            return Err(UserError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(&user.id.to_string())?;
        Ok(AccessGrant {
            access_token,
            token_type: "bearer",
            user,
        })
    }

    /// Resolves the account a bearer token belongs to.
    pub fn current_user(&self, token: &str) -> Result<UserAccount, UserError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            debug!("Rejected access token: {}", e);
            UserError::InvalidToken
        })?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| UserError::InvalidUserId)?;

        self.user_store
            .get_user(&user_id)?
            .ok_or(UserError::UserNotFound)
    }

    pub fn ping(&self) -> anyhow::Result<()> {
        self.user_store.ping()
    }
}

fn validate_registration(registration: &Registration) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let name_chars = registration.name.trim().chars().count();
    if name_chars == 0 || name_chars > MAX_NAME_CHARS {
        errors.push(FieldError {
            field: "name",
            message: format!("Name must be between 1 and {} characters", MAX_NAME_CHARS),
        });
    }

    if !EMAIL_REGEX.is_match(registration.email.trim()) {
        errors.push(FieldError {
            field: "email",
            message: "Value is not a valid email address".to_string(),
        });
    }

    if registration.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(FieldError {
            field: "password",
            message: format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            ),
        });
    }

    errors
}
