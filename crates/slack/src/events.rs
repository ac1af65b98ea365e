use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use mailbot_core::domain::record::ChatUserId;

use crate::{
    blocks::{markdown_message, MessageTemplate},
    routing::{direct_message_intent, mention_intent, MessageIntent},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    DirectMessage(MessageEvent),
    AppMention(MessageEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::DirectMessage(_) => SlackEventType::DirectMessage,
            Self::AppMention(_) => SlackEventType::AppMention,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    DirectMessage,
    AppMention,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Vec<MessageTemplate>),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("account service failure: {0}")]
    Service(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    let service = Arc::new(NoopMailAccountService);
    dispatcher.register(DirectMessageHandler::new(service.clone()));
    dispatcher.register(MentionHandler::new(service));
    dispatcher
}

/// Conversation entry points the handlers delegate to. Implemented by the
/// server over the conversation runtime; the noop implementation keeps the
/// default dispatcher wired for previews and tests.
#[async_trait]
pub trait MailAccountService: Send + Sync {
    async fn session_active(&self, user: &ChatUserId) -> bool;
    async fn greeting(&self) -> Result<Vec<String>, EventHandlerError>;
    async fn setup_info(&self) -> Result<Vec<String>, EventHandlerError>;
    async fn start_create(&self, user: &ChatUserId) -> Result<Vec<String>, EventHandlerError>;
    async fn start_reset(&self, user: &ChatUserId) -> Result<Vec<String>, EventHandlerError>;
    async fn continue_dialogue(
        &self,
        user: &ChatUserId,
        text: &str,
    ) -> Result<Vec<String>, EventHandlerError>;
}

pub struct DirectMessageHandler<S> {
    service: Arc<S>,
}

impl<S> DirectMessageHandler<S>
where
    S: MailAccountService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for DirectMessageHandler<S>
where
    S: MailAccountService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::DirectMessage
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::DirectMessage(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let user = ChatUserId::new(event.user_id.clone());

        // An in-flight dialogue consumes the reply before any keyword
        // matching; "no" must answer the pending question, not be dropped.
        if self.service.session_active(&user).await {
            let replies = self.service.continue_dialogue(&user, &event.text).await?;
            return Ok(to_result(replies));
        }

        let replies = match direct_message_intent(&event.text) {
            Some(MessageIntent::Greeting) => self.service.greeting().await?,
            Some(MessageIntent::SetupInfo) => self.service.setup_info().await?,
            Some(MessageIntent::CreateAccount) => self.service.start_create(&user).await?,
            Some(MessageIntent::ResetPassword) => self.service.start_reset(&user).await?,
            None => return Ok(HandlerResult::Processed),
        };

        Ok(to_result(replies))
    }
}

pub struct MentionHandler<S> {
    service: Arc<S>,
}

impl<S> MentionHandler<S>
where
    S: MailAccountService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MentionHandler<S>
where
    S: MailAccountService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::AppMention
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::AppMention(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let replies = match mention_intent(&event.text) {
            Some(MessageIntent::Greeting) => self.service.greeting().await?,
            Some(MessageIntent::SetupInfo) => self.service.setup_info().await?,
            _ => return Ok(HandlerResult::Processed),
        };

        Ok(to_result(replies))
    }
}

fn to_result(replies: Vec<String>) -> HandlerResult {
    if replies.is_empty() {
        return HandlerResult::Processed;
    }
    HandlerResult::Responded(replies.into_iter().map(markdown_message).collect())
}

#[derive(Default)]
pub struct NoopMailAccountService;

#[async_trait]
impl MailAccountService for NoopMailAccountService {
    async fn session_active(&self, _user: &ChatUserId) -> bool {
        false
    }

    async fn greeting(&self) -> Result<Vec<String>, EventHandlerError> {
        Ok(vec!["Hi there! I'm the mail bot. (preview mode)".to_owned()])
    }

    async fn setup_info(&self) -> Result<Vec<String>, EventHandlerError> {
        Ok(vec!["Setup information is not available in preview mode.".to_owned()])
    }

    async fn start_create(&self, user: &ChatUserId) -> Result<Vec<String>, EventHandlerError> {
        Ok(vec![format!("Preview mode: would start account creation for {user}.")])
    }

    async fn start_reset(&self, user: &ChatUserId) -> Result<Vec<String>, EventHandlerError> {
        Ok(vec![format!("Preview mode: would start a password reset for {user}.")])
    }

    async fn continue_dialogue(
        &self,
        _user: &ChatUserId,
        _text: &str,
    ) -> Result<Vec<String>, EventHandlerError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use mailbot_core::domain::record::ChatUserId;

    use super::{
        default_dispatcher, DirectMessageHandler, EventContext, EventDispatcher,
        EventHandlerError, HandlerResult, MailAccountService, MessageEvent, SlackEnvelope,
        SlackEvent,
    };

    fn dm_envelope(id: &str, text: &str) -> SlackEnvelope {
        SlackEnvelope {
            envelope_id: id.to_owned(),
            event: SlackEvent::DirectMessage(MessageEvent {
                channel_id: "D1".to_owned(),
                user_id: "U1".to_owned(),
                text: text.to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn dispatcher_routes_direct_message_greetings() {
        let dispatcher = default_dispatcher();
        let result = dispatcher
            .dispatch(&dm_envelope("env-1", "hello"), &EventContext::default())
            .await
            .expect("dispatch");

        assert!(matches!(result, HandlerResult::Responded(_)));
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();
        let result = dispatcher
            .dispatch(&dm_envelope("env-2", "hello"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn default_dispatcher_registers_handlers() {
        let dispatcher = default_dispatcher();
        assert_eq!(dispatcher.handler_count(), 2);
    }

    #[tokio::test]
    async fn dispatcher_silently_ignores_unmatched_text_without_session() {
        let dispatcher = default_dispatcher();
        let result = dispatcher
            .dispatch(&dm_envelope("env-3", "random banter"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
    }

    #[tokio::test]
    async fn mentions_do_not_trigger_account_creation() {
        let dispatcher = default_dispatcher();
        let envelope = SlackEnvelope {
            envelope_id: "env-4".to_owned(),
            event: SlackEvent::AppMention(MessageEvent {
                channel_id: "C1".to_owned(),
                user_id: "U1".to_owned(),
                text: "create an account for me".to_owned(),
            }),
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
    }

    /// Service double that records which entry points were invoked.
    #[derive(Default)]
    struct RecordingService {
        active: Mutex<bool>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailAccountService for RecordingService {
        async fn session_active(&self, _user: &ChatUserId) -> bool {
            *self.active.lock().await
        }

        async fn greeting(&self) -> Result<Vec<String>, EventHandlerError> {
            self.calls.lock().await.push("greeting".to_owned());
            Ok(vec!["hi".to_owned()])
        }

        async fn setup_info(&self) -> Result<Vec<String>, EventHandlerError> {
            self.calls.lock().await.push("setup_info".to_owned());
            Ok(vec!["info".to_owned()])
        }

        async fn start_create(
            &self,
            _user: &ChatUserId,
        ) -> Result<Vec<String>, EventHandlerError> {
            self.calls.lock().await.push("start_create".to_owned());
            Ok(vec!["are you ready?".to_owned()])
        }

        async fn start_reset(&self, _user: &ChatUserId) -> Result<Vec<String>, EventHandlerError> {
            self.calls.lock().await.push("start_reset".to_owned());
            Ok(vec!["are you sure?".to_owned()])
        }

        async fn continue_dialogue(
            &self,
            _user: &ChatUserId,
            text: &str,
        ) -> Result<Vec<String>, EventHandlerError> {
            self.calls.lock().await.push(format!("continue:{text}"));
            Ok(vec!["next question".to_owned()])
        }
    }

    #[tokio::test]
    async fn create_keyword_reaches_the_create_entry_point() {
        let service = Arc::new(RecordingService::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(DirectMessageHandler::new(service.clone()));

        let result = dispatcher
            .dispatch(&dm_envelope("env-5", "create"), &EventContext::default())
            .await
            .expect("dispatch");

        assert!(matches!(result, HandlerResult::Responded(_)));
        assert_eq!(*service.calls.lock().await, vec!["start_create".to_owned()]);
    }

    #[tokio::test]
    async fn active_session_consumes_replies_before_keyword_matching() {
        let service = Arc::new(RecordingService::default());
        *service.active.lock().await = true;
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(DirectMessageHandler::new(service.clone()));

        // "create" would normally start a new dialogue, but the active
        // session gets the reply instead.
        let result = dispatcher
            .dispatch(&dm_envelope("env-6", "create"), &EventContext::default())
            .await
            .expect("dispatch");

        assert!(matches!(result, HandlerResult::Responded(_)));
        assert_eq!(*service.calls.lock().await, vec!["continue:create".to_owned()]);
    }
}
