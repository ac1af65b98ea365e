use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::EmailAddress;

/// Opaque chat-platform identity, used as the storage key for provisioned
/// accounts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatUserId(pub String);

impl ChatUserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatUserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable mapping from a chat identity to its provisioned email address.
///
/// A record exists only for identities whose address the directory confirmed
/// at provisioning time; stale records are pruned lazily on the next lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: ChatUserId,
    pub email: EmailAddress,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(id: ChatUserId, email: EmailAddress) -> Self {
        Self { id, email, created_at: Utc::now() }
    }
}
