use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mailbot_core::address::EmailAddress;

use crate::{DirectoryError, MailDirectory};

/// In-memory directory double: a plain address set plus switchable failure
/// modes, with call recording so tests can assert exactly which provisioning
/// calls were issued.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<DirectoryState>,
}

#[derive(Default)]
struct DirectoryState {
    addresses: HashSet<String>,
    fail_listing: bool,
    fail_provisioning: bool,
    create_calls: Vec<(String, String)>,
    set_password_calls: Vec<(String, String)>,
}

impl InMemoryDirectory {
    pub fn with_addresses<'a>(addresses: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            state: Mutex::new(DirectoryState {
                addresses: addresses.into_iter().map(str::to_owned).collect(),
                ..DirectoryState::default()
            }),
        }
    }

    pub async fn insert(&self, email: &EmailAddress) {
        self.state.lock().await.addresses.insert(email.as_str().to_owned());
    }

    pub async fn remove(&self, email: &EmailAddress) {
        self.state.lock().await.addresses.remove(email.as_str());
    }

    pub async fn fail_listing(&self, fail: bool) {
        self.state.lock().await.fail_listing = fail;
    }

    pub async fn fail_provisioning(&self, fail: bool) {
        self.state.lock().await.fail_provisioning = fail;
    }

    pub async fn create_calls(&self) -> Vec<(String, String)> {
        self.state.lock().await.create_calls.clone()
    }

    pub async fn set_password_calls(&self) -> Vec<(String, String)> {
        self.state.lock().await.set_password_calls.clone()
    }
}

#[async_trait]
impl MailDirectory for InMemoryDirectory {
    async fn exists(&self, email: &EmailAddress) -> Result<bool, DirectoryError> {
        let state = self.state.lock().await;
        if state.fail_listing {
            return Err(DirectoryError::Unavailable("scripted listing failure".to_owned()));
        }
        Ok(state.addresses.contains(email.as_str()))
    }

    async fn create_account(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<String, DirectoryError> {
        let mut state = self.state.lock().await;
        state.create_calls.push((email.as_str().to_owned(), password.to_owned()));

        if state.fail_provisioning {
            return Err(DirectoryError::Unavailable("scripted provisioning failure".to_owned()));
        }
        if !state.addresses.insert(email.as_str().to_owned()) {
            return Err(DirectoryError::UnexpectedStatus {
                operation: "create account",
                status: 400,
                body: format!("User already exists: {email}"),
            });
        }

        Ok(format!("mail user added: {email}"))
    }

    async fn set_password(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<String, DirectoryError> {
        let mut state = self.state.lock().await;
        state.set_password_calls.push((email.as_str().to_owned(), password.to_owned()));

        if state.fail_provisioning {
            return Err(DirectoryError::Unavailable("scripted provisioning failure".to_owned()));
        }
        if !state.addresses.contains(email.as_str()) {
            return Err(DirectoryError::UnexpectedStatus {
                operation: "set password",
                status: 400,
                body: format!("That's not a user: {email}"),
            });
        }

        Ok(format!("password updated: {email}"))
    }
}
