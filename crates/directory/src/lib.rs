//! Client for the mail-server administration API.
//!
//! The directory is the source of truth for which addresses exist. All calls
//! carry the service credentials and target the single configured admin host;
//! there is no retry or backoff — a failure surfaces to the conversation
//! layer as a terminal error for that turn.

pub mod client;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use mailbot_core::address::EmailAddress;

pub use client::HttpDirectoryClient;
pub use memory::InMemoryDirectory;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("directory returned status {status} for {operation}: {body}")]
    UnexpectedStatus { operation: &'static str, status: u16, body: String },
    #[error("could not interpret directory response: {0}")]
    Parse(String),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MailDirectory: Send + Sync {
    /// Whether the exact address is present in the directory, scoped to the
    /// domain portion of the address. Errors are fatal, never treated as
    /// "does not exist" — a partial directory view must not trigger a
    /// duplicate provisioning attempt.
    async fn exists(&self, email: &EmailAddress) -> Result<bool, DirectoryError>;

    /// Create the account; returns the raw server acknowledgment text, which
    /// is surfaced verbatim to the requesting user.
    async fn create_account(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<String, DirectoryError>;

    /// Idempotent password reset for an existing address.
    async fn set_password(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<String, DirectoryError>;
}
