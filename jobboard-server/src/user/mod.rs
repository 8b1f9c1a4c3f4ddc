pub mod auth;
pub mod jwt;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::PasswordHasher;
pub use jwt::{Claims, TokenIssuer};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{normalize_email, Registration, UserError, UserManager};
pub use user_models::{AccessGrant, FieldError, PasswordCredentials, UserAccount};
pub use user_store::UserStore;
