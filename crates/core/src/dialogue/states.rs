use serde::{Deserialize, Serialize};

use crate::address::EmailAddress;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueFlow {
    Provision,
    PasswordReset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    AwaitingReadyConfirmation,
    AwaitingFirstName,
    AwaitingLastName,
    CheckingAvailability,
    AwaitingRetryDecision,
    AwaitingEmailConfirmation,
    AwaitingFinalRetryDecision,
    Provisioning,
    Persisting,
    AwaitingResetConfirmation,
    Resetting,
    Terminal,
}

/// Inputs to the transition function. User replies arrive pre-classified
/// (`Affirmed`/`Declined`/`Unrecognized` at confirmation steps,
/// `NameSubmitted` at name steps); the remaining events are injected by the
/// runtime as the results of directory and storage calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueEvent {
    Affirmed,
    Declined,
    Unrecognized,
    NameSubmitted(String),
    AddressAvailable,
    AddressTaken,
    ProvisionSucceeded,
    ProvisionFailed,
    RecordSaved,
    RecordSaveFailed,
    ResetSucceeded,
    ResetFailed,
}

/// Side effects the runtime must perform after a transition. The machine
/// never performs I/O itself; it only names the calls and prompts due next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueAction {
    AskFirstName,
    AskLastName,
    CheckAvailability,
    AskEmailConfirmation,
    OfferCollisionRetry,
    OfferConfirmRetry,
    ProvisionAccount,
    PersistRecord,
    DeliverCredentials,
    SendSetupInfo,
    ResetPassword,
    DeliverNewPassword,
    ReportFailure,
    ReportStorageFailure,
    RepeatQuestion,
    AcknowledgeDecline,
    AbortRepromptsExhausted,
}

/// Accumulated answers for one in-flight dialogue. Discarded at terminal;
/// never persisted. The generated credential deliberately does not live
/// here — it stays local to the runtime step that uses it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueContext {
    pub email_domain: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub candidate: Option<EmailAddress>,
    pub stored_email: Option<EmailAddress>,
    pub reprompts: u32,
    pub max_reprompts: u32,
}

impl DialogueContext {
    pub fn for_provision(email_domain: impl Into<String>, max_reprompts: u32) -> Self {
        Self { email_domain: email_domain.into(), max_reprompts, ..Self::default() }
    }

    pub fn for_reset(stored_email: EmailAddress, max_reprompts: u32) -> Self {
        Self { stored_email: Some(stored_email), max_reprompts, ..Self::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogueState,
    pub to: DialogueState,
    pub actions: Vec<DialogueAction>,
    pub context: DialogueContext,
}
