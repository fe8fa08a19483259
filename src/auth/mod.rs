//! Password hashing and bearer-token sessions.

pub mod password;
pub mod token;

use thiserror::Error;

pub use password::{hash_password, verify_password};
pub use token::{decode_token, issue_token};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token issuance failed: {0}")]
    Token(String),

    #[error("invalid or expired token")]
    InvalidToken,
}
