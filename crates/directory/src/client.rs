use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use mailbot_core::address::EmailAddress;
use mailbot_core::config::MailConfig;

use crate::{DirectoryError, MailDirectory};

/// HTTP client for the admin API:
/// `GET /admin/mail/users?format=json`, `POST /admin/mail/users/add`,
/// `POST /admin/mail/users/password`, all behind HTTP basic auth.
pub struct HttpDirectoryClient {
    client: Client,
    admin_host: String,
    username: String,
    password: SecretString,
}

#[derive(Debug, Deserialize)]
struct DomainListing {
    domain: String,
    #[serde(default)]
    users: Vec<ListedUser>,
}

#[derive(Debug, Deserialize)]
struct ListedUser {
    email: String,
}

impl HttpDirectoryClient {
    pub fn new(config: &MailConfig) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            admin_host: config.admin_host.clone(),
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("https://{}/admin/mail/{path}", self.admin_host)
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        email: &EmailAddress,
        password: &str,
    ) -> Result<String, DirectoryError> {
        let form = [("email", email.as_str()), ("password", password)];
        let response = self
            .client
            .post(self.endpoint(path))
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        Ok(body.trim().to_owned())
    }
}

#[async_trait]
impl MailDirectory for HttpDirectoryClient {
    async fn exists(&self, email: &EmailAddress) -> Result<bool, DirectoryError> {
        let response = self
            .client
            .get(self.endpoint("users?format=json"))
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                operation: "list users",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let listing: Vec<DomainListing> =
            response.json().await.map_err(|error| DirectoryError::Parse(error.to_string()))?;

        address_in_listing(&listing, email)
    }

    async fn create_account(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<String, DirectoryError> {
        self.post_form("create account", "users/add", email, password).await
    }

    async fn set_password(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<String, DirectoryError> {
        self.post_form("set password", "users/password", email, password).await
    }
}

fn address_in_listing(
    listing: &[DomainListing],
    email: &EmailAddress,
) -> Result<bool, DirectoryError> {
    let domain = email
        .domain()
        .ok_or_else(|| DirectoryError::Parse(format!("address `{email}` has no domain part")))?;

    let present = listing
        .iter()
        .find(|entry| entry.domain == domain)
        .map(|entry| entry.users.iter().any(|user| user.email == email.as_str()))
        .unwrap_or(false);

    Ok(present)
}
