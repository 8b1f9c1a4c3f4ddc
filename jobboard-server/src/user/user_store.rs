use super::user_models::{PasswordCredentials, UserAccount};
use anyhow::Result;
use uuid::Uuid;

pub trait UserStore: Send + Sync {
    /// Inserts a new account. Returns Ok(false) without writing anything if
    /// the (already normalized) email is taken.
    fn create_user(&self, user: &UserAccount, credentials: &PasswordCredentials) -> Result<bool>;

    /// Returns Ok(None) if no user has the given id.
    fn get_user(&self, id: &Uuid) -> Result<Option<UserAccount>>;

    /// Looks up an account and its credentials by normalized email.
    fn get_user_by_email(&self, email: &str)
        -> Result<Option<(UserAccount, PasswordCredentials)>>;

    fn ping(&self) -> Result<()>;
}
