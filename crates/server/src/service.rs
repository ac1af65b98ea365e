use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;
use uuid::Uuid;

use mailbot_core::domain::record::ChatUserId;
use mailbot_core::errors::ApplicationError;
use mailbot_db::repositories::UserRecordRepository;
use mailbot_directory::MailDirectory;
use mailbot_engine::ConversationRuntime;
use mailbot_slack::events::{EventHandlerError, MailAccountService};

/// Bridges the Slack event handlers to the conversation runtime and maps
/// infrastructure failures to a user-safe apology instead of letting the
/// socket loop swallow them silently.
pub struct MailbotService<D, R> {
    runtime: Arc<ConversationRuntime<D, R>>,
    admin_contact: String,
}

impl<D, R> MailbotService<D, R>
where
    D: MailDirectory,
    R: UserRecordRepository,
{
    pub fn new(runtime: Arc<ConversationRuntime<D, R>>, admin_contact: impl Into<String>) -> Self {
        Self { runtime, admin_contact: admin_contact.into() }
    }

    fn absorb(
        &self,
        result: Result<Vec<String>, ApplicationError>,
        user: &ChatUserId,
    ) -> Result<Vec<String>, EventHandlerError> {
        match result {
            Ok(replies) => Ok(replies),
            Err(err) => {
                let correlation_id = Uuid::new_v4().to_string();
                let interface = err.into_interface(correlation_id.clone());
                error!(
                    event_name = "dialogue.turn_failed",
                    user_id = %user,
                    correlation_id = %correlation_id,
                    error = %interface,
                    "conversation turn aborted; reporting generic failure to user"
                );
                Ok(vec![
                    "Something went wrong! :scream:".to_owned(),
                    format!("Please contact {}", self.admin_contact),
                ])
            }
        }
    }
}

#[async_trait]
impl<D, R> MailAccountService for MailbotService<D, R>
where
    D: MailDirectory + 'static,
    R: UserRecordRepository + 'static,
{
    async fn session_active(&self, user: &ChatUserId) -> bool {
        self.runtime.session_active(user).await
    }

    async fn greeting(&self) -> Result<Vec<String>, EventHandlerError> {
        Ok(self.runtime.greeting())
    }

    async fn setup_info(&self) -> Result<Vec<String>, EventHandlerError> {
        Ok(self.runtime.setup_info())
    }

    async fn start_create(&self, user: &ChatUserId) -> Result<Vec<String>, EventHandlerError> {
        let result = self.runtime.start_create(user).await;
        self.absorb(result, user)
    }

    async fn start_reset(&self, user: &ChatUserId) -> Result<Vec<String>, EventHandlerError> {
        let result = self.runtime.start_reset(user).await;
        self.absorb(result, user)
    }

    async fn continue_dialogue(
        &self,
        user: &ChatUserId,
        text: &str,
    ) -> Result<Vec<String>, EventHandlerError> {
        let result = self.runtime.continue_dialogue(user, text).await;
        self.absorb(result, user)
    }
}
