use tracing::{error, info, warn};

use mailbot_core::config::AppConfig;
use mailbot_core::credential::generate_password;
use mailbot_core::dialogue::{
    classify_answer, Answer, DialogueAction, DialogueContext, DialogueEngine, DialogueEvent,
    DialogueFlow, DialogueState, ProvisionDialogue, ResetDialogue, TransitionOutcome,
};
use mailbot_core::domain::record::{ChatUserId, UserRecord};
use mailbot_core::errors::{ApplicationError, DomainError};
use mailbot_db::repositories::UserRecordRepository;
use mailbot_directory::MailDirectory;

use crate::messages;
use crate::session::{DialogueSession, SessionTable};

/// Dialogue-facing slice of the application configuration, passed in at
/// construction so the runtime never reaches into ambient state.
#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    pub email_domain: String,
    pub admin_host: String,
    pub admin_contact: String,
    pub max_reprompts: u32,
    pub password_length: usize,
}

impl RuntimeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            email_domain: config.mail.email_domain.clone(),
            admin_host: config.mail.admin_host.clone(),
            admin_contact: config.mail.admin_contact.clone(),
            max_reprompts: config.dialogue.max_reprompts,
            password_length: config.dialogue.password_length,
        }
    }
}

/// Drives one dialogue turn at a time: classifies the reply for the current
/// state, applies the pure transition, then executes the returned actions
/// (directory calls, storage calls, outbound text). The step that issued a
/// call does not advance until the call resolves.
pub struct ConversationRuntime<D, R> {
    directory: D,
    records: R,
    settings: RuntimeSettings,
    sessions: SessionTable,
    provision: DialogueEngine<ProvisionDialogue>,
    reset: DialogueEngine<ResetDialogue>,
}

impl<D, R> ConversationRuntime<D, R>
where
    D: MailDirectory,
    R: UserRecordRepository,
{
    pub fn new(directory: D, records: R, settings: RuntimeSettings) -> Self {
        Self {
            directory,
            records,
            settings,
            sessions: SessionTable::default(),
            provision: DialogueEngine::new(ProvisionDialogue),
            reset: DialogueEngine::new(ResetDialogue),
        }
    }

    pub async fn session_active(&self, user: &ChatUserId) -> bool {
        self.sessions.contains(user).await
    }

    pub fn greeting(&self) -> Vec<String> {
        messages::greeting(&self.settings.email_domain)
    }

    pub fn setup_info(&self) -> Vec<String> {
        messages::setup_info(&self.settings.admin_host, &self.settings.admin_contact)
    }

    /// Entry point for create intent. A confirmed existing record
    /// short-circuits without entering the state machine.
    pub async fn start_create(
        &self,
        user: &ChatUserId,
    ) -> Result<Vec<String>, ApplicationError> {
        if let Some(record) = self.lookup_user(user).await? {
            info!(
                event_name = "dialogue.create_short_circuit",
                user_id = %user,
                email = %record.email,
                "create requested but a confirmed account already exists"
            );
            return Ok(messages::already_have_account(&record.email, &self.settings.admin_contact));
        }

        let session = DialogueSession {
            flow: DialogueFlow::Provision,
            state: self.provision.initial_state(),
            context: DialogueContext::for_provision(
                self.settings.email_domain.clone(),
                self.settings.max_reprompts,
            ),
        };
        self.sessions.insert(user, session).await;
        info!(event_name = "dialogue.provision_started", user_id = %user, "provision dialogue opened");

        Ok(messages::create_intro())
    }

    /// Entry point for reset intent; requires a confirmed stored record.
    pub async fn start_reset(&self, user: &ChatUserId) -> Result<Vec<String>, ApplicationError> {
        let Some(record) = self.lookup_user(user).await? else {
            return Ok(messages::no_account_yet());
        };

        let session = DialogueSession {
            flow: DialogueFlow::PasswordReset,
            state: self.reset.initial_state(),
            context: DialogueContext::for_reset(
                record.email.clone(),
                self.settings.max_reprompts,
            ),
        };
        self.sessions.insert(user, session).await;
        info!(
            event_name = "dialogue.reset_started",
            user_id = %user,
            email = %record.email,
            "reset dialogue opened"
        );

        Ok(messages::reset_intro(&record.email))
    }

    /// Feeds a free-text reply into the user's active dialogue. Returns no
    /// messages if there is no session for this identity.
    pub async fn continue_dialogue(
        &self,
        user: &ChatUserId,
        text: &str,
    ) -> Result<Vec<String>, ApplicationError> {
        let Some(session) = self.sessions.take(user).await else {
            return Ok(Vec::new());
        };

        let event = classify_event(&session.state, text);
        self.drive(user, session, event).await
    }

    /// Record lookup with lazy reconciliation: a stored address the directory
    /// no longer confirms is deleted and treated as absent.
    async fn lookup_user(
        &self,
        user: &ChatUserId,
    ) -> Result<Option<UserRecord>, ApplicationError> {
        let record = self
            .records
            .find_by_id(user)
            .await
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
        let Some(record) = record else {
            return Ok(None);
        };

        let exists = self
            .directory
            .exists(&record.email)
            .await
            .map_err(|e| ApplicationError::Directory(e.to_string()))?;
        if exists {
            return Ok(Some(record));
        }

        info!(
            event_name = "dialogue.stale_record_pruned",
            user_id = %user,
            email = %record.email,
            "stored address no longer exists in the directory; deleting record"
        );
        self.records
            .delete(user)
            .await
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;

        Ok(None)
    }

    async fn drive(
        &self,
        user: &ChatUserId,
        mut session: DialogueSession,
        event: DialogueEvent,
    ) -> Result<Vec<String>, ApplicationError> {
        let mut replies = Vec::new();
        let mut pending = Some(event);
        // The credential and server acknowledgment live only for the duration
        // of this turn; they are delivered once and never stored.
        let mut credential: Option<String> = None;
        let mut server_ack: Option<String> = None;

        while let Some(event) = pending.take() {
            let outcome = self.apply(&session, &event)?;
            session.state = outcome.to.clone();
            session.context = outcome.context.clone();

            for action in &outcome.actions {
                match action {
                    DialogueAction::AskFirstName => {
                        match outcome.from {
                            DialogueState::AwaitingReadyConfirmation => {
                                replies.push(messages::lets_get_started());
                            }
                            DialogueState::AwaitingRetryDecision
                            | DialogueState::AwaitingFinalRetryDecision => {
                                replies.push(messages::retry_acknowledged());
                            }
                            _ => {}
                        }
                        replies.extend(messages::ask_first_name(&self.settings.email_domain));
                    }
                    DialogueAction::AskLastName => replies.push(messages::ask_last_name()),
                    DialogueAction::CheckAvailability => {
                        let candidate = self.candidate(&session)?;
                        let taken = self
                            .directory
                            .exists(&candidate)
                            .await
                            .map_err(|e| ApplicationError::Directory(e.to_string()))?;
                        pending = Some(if taken {
                            DialogueEvent::AddressTaken
                        } else {
                            DialogueEvent::AddressAvailable
                        });
                    }
                    DialogueAction::AskEmailConfirmation => {
                        replies.extend(messages::confirm_candidate(&self.candidate(&session)?));
                    }
                    DialogueAction::OfferCollisionRetry => {
                        replies.extend(messages::candidate_taken(&self.candidate(&session)?));
                    }
                    DialogueAction::OfferConfirmRetry => {
                        replies.push(messages::offer_confirm_retry());
                    }
                    DialogueAction::ProvisionAccount => {
                        replies.push(messages::provisioning_started());
                        let candidate = self.candidate(&session)?;
                        let password = generate_password(self.settings.password_length);
                        match self.directory.create_account(&candidate, &password).await {
                            Ok(ack) => {
                                info!(
                                    event_name = "dialogue.account_created",
                                    user_id = %user,
                                    email = %candidate,
                                    "directory acknowledged account creation"
                                );
                                credential = Some(password);
                                server_ack = Some(ack);
                                pending = Some(DialogueEvent::ProvisionSucceeded);
                            }
                            Err(err) => {
                                warn!(
                                    event_name = "dialogue.account_create_failed",
                                    user_id = %user,
                                    email = %candidate,
                                    error = %err,
                                    "directory rejected account creation"
                                );
                                pending = Some(DialogueEvent::ProvisionFailed);
                            }
                        }
                    }
                    DialogueAction::PersistRecord => {
                        let record = UserRecord::new(user.clone(), self.candidate(&session)?);
                        match self.records.save(record).await {
                            Ok(()) => pending = Some(DialogueEvent::RecordSaved),
                            Err(err) => {
                                // The remote account is already live at this
                                // point; the collision branch absorbs the
                                // next create attempt for this identity.
                                error!(
                                    event_name = "dialogue.record_save_failed",
                                    user_id = %user,
                                    error = %err,
                                    "account created remotely but record persistence failed"
                                );
                                pending = Some(DialogueEvent::RecordSaveFailed);
                            }
                        }
                    }
                    DialogueAction::DeliverCredentials => {
                        let candidate = self.candidate(&session)?;
                        let password = credential.take().ok_or_else(|| {
                            invariant("credential missing at delivery step")
                        })?;
                        let ack = server_ack.take().unwrap_or_default();
                        replies.extend(messages::account_created(
                            &ack,
                            &candidate,
                            &password,
                            &self.settings.admin_host,
                        ));
                    }
                    DialogueAction::SendSetupInfo => replies.extend(self.setup_info()),
                    DialogueAction::ResetPassword => {
                        replies.push(messages::reset_started());
                        let email = self.stored_email(&session)?;
                        let password = generate_password(self.settings.password_length);
                        match self.directory.set_password(&email, &password).await {
                            Ok(ack) => {
                                info!(
                                    event_name = "dialogue.password_reset",
                                    user_id = %user,
                                    email = %email,
                                    "directory acknowledged password reset"
                                );
                                credential = Some(password);
                                server_ack = Some(ack);
                                pending = Some(DialogueEvent::ResetSucceeded);
                            }
                            Err(err) => {
                                warn!(
                                    event_name = "dialogue.password_reset_failed",
                                    user_id = %user,
                                    email = %email,
                                    error = %err,
                                    "directory rejected password reset"
                                );
                                pending = Some(DialogueEvent::ResetFailed);
                            }
                        }
                    }
                    DialogueAction::DeliverNewPassword => {
                        let password = credential.take().ok_or_else(|| {
                            invariant("credential missing at delivery step")
                        })?;
                        let ack = server_ack.take().unwrap_or_default();
                        replies.extend(messages::password_reset(
                            &ack,
                            &password,
                            &self.settings.admin_host,
                        ));
                    }
                    DialogueAction::ReportFailure => {
                        replies.extend(messages::failure_notice(&self.settings.admin_contact));
                    }
                    DialogueAction::ReportStorageFailure => {
                        replies
                            .extend(messages::storage_failure_notice(&self.settings.admin_contact));
                    }
                    DialogueAction::RepeatQuestion => {
                        replies.push(messages::did_not_understand());
                        if let Some(question) = question_for_state(&session) {
                            replies.push(question);
                        }
                    }
                    DialogueAction::AcknowledgeDecline => {
                        replies.push(decline_for(&outcome.from));
                    }
                    DialogueAction::AbortRepromptsExhausted => {
                        replies.push(messages::reprompts_exhausted());
                    }
                }
            }
        }

        if session.state == DialogueState::Terminal {
            info!(event_name = "dialogue.terminal", user_id = %user, "dialogue finished");
        } else {
            self.sessions.insert(user, session).await;
        }

        Ok(replies)
    }

    fn apply(
        &self,
        session: &DialogueSession,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, ApplicationError> {
        let result = match session.flow {
            DialogueFlow::Provision => self.provision.apply(&session.state, event, &session.context),
            DialogueFlow::PasswordReset => self.reset.apply(&session.state, event, &session.context),
        };
        result.map_err(|e| ApplicationError::Domain(DomainError::from(e)))
    }

    fn candidate(
        &self,
        session: &DialogueSession,
    ) -> Result<mailbot_core::address::EmailAddress, ApplicationError> {
        session
            .context
            .candidate
            .clone()
            .ok_or_else(|| invariant("candidate address missing from dialogue context"))
    }

    fn stored_email(
        &self,
        session: &DialogueSession,
    ) -> Result<mailbot_core::address::EmailAddress, ApplicationError> {
        session
            .context
            .stored_email
            .clone()
            .ok_or_else(|| invariant("stored address missing from reset context"))
    }
}

fn invariant(message: &str) -> ApplicationError {
    ApplicationError::Domain(DomainError::InvariantViolation(message.to_owned()))
}

/// Replies at name-collection states are free text; everything else is a
/// three-way confirmation.
fn classify_event(state: &DialogueState, text: &str) -> DialogueEvent {
    match state {
        DialogueState::AwaitingFirstName | DialogueState::AwaitingLastName => {
            DialogueEvent::NameSubmitted(text.to_owned())
        }
        _ => match classify_answer(text) {
            Answer::Affirmative => DialogueEvent::Affirmed,
            Answer::Negative => DialogueEvent::Declined,
            Answer::Other => DialogueEvent::Unrecognized,
        },
    }
}

fn question_for_state(session: &DialogueSession) -> Option<String> {
    match session.state {
        DialogueState::AwaitingReadyConfirmation => Some("Are you ready?".to_owned()),
        DialogueState::AwaitingEmailConfirmation => Some("Is that correct?".to_owned()),
        DialogueState::AwaitingResetConfirmation => Some("Are you sure about this?".to_owned()),
        _ => None,
    }
}

fn decline_for(from: &DialogueState) -> String {
    match from {
        DialogueState::AwaitingReadyConfirmation => messages::decline_create(),
        DialogueState::AwaitingResetConfirmation => messages::decline_reset(),
        _ => messages::decline_retry(),
    }
}
