//! Password hashing

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

mod argon2_hashing {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn hash(plain: &[u8]) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash_string = Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify(plain_pw: &[u8], target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain_pw, &password_hash)
            .is_ok())
    }
}

/// Hashing scheme of a stored password. The salt is embedded in the PHC string.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum PasswordHasher {
    Argon2,
    /// Fast test-only hasher - DO NOT use in production!
    #[cfg(feature = "test-fast-hasher")]
    TestFast,
}

impl Default for PasswordHasher {
    #[cfg(not(feature = "test-fast-hasher"))]
    fn default() -> Self {
        PasswordHasher::Argon2
    }

    #[cfg(feature = "test-fast-hasher")]
    fn default() -> Self {
        PasswordHasher::TestFast
    }
}

impl FromStr for PasswordHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(PasswordHasher::Argon2),
            #[cfg(feature = "test-fast-hasher")]
            "test_fast" => Ok(PasswordHasher::TestFast),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordHasher::Argon2 => write!(f, "argon2"),
            #[cfg(feature = "test-fast-hasher")]
            PasswordHasher::TestFast => write!(f, "test_fast"),
        }
    }
}

impl PasswordHasher {
    pub fn hash(&self, plain: &str) -> Result<String> {
        match self {
            PasswordHasher::Argon2 => argon2_hashing::hash(plain.as_bytes()),
            #[cfg(feature = "test-fast-hasher")]
            PasswordHasher::TestFast => {
                let hex: String = plain.bytes().map(|b| format!("{:02x}", b)).collect();
                Ok(format!("$testfast${}", hex))
            }
        }
    }

    pub fn verify(&self, plain_pw: &str, target_hash: &str) -> Result<bool> {
        match self {
            PasswordHasher::Argon2 => argon2_hashing::verify(plain_pw.as_bytes(), target_hash),
            #[cfg(feature = "test-fast-hasher")]
            PasswordHasher::TestFast => {
                let expected: String = plain_pw.bytes().map(|b| format!("{:02x}", b)).collect();
                Ok(target_hash.strip_prefix("$testfast$") == Some(expected.as_str()))
            }
        }
    }
}
