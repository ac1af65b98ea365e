use thiserror::Error;

use crate::address::{normalize_name_part, EmailAddress};
use crate::dialogue::states::{
    DialogueAction, DialogueContext, DialogueEvent, DialogueFlow, DialogueState, TransitionOutcome,
};

/// A dialogue flow as a pure transition function. Every branch is a function
/// of (current state, event, context) and returns the next state plus the
/// side effects the runtime must perform, which keeps each branch
/// independently testable without any I/O.
pub trait DialogueDefinition {
    fn flow(&self) -> DialogueFlow;
    fn initial_state(&self) -> DialogueState;
    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        context: &DialogueContext,
    ) -> Result<TransitionOutcome, DialogueTransitionError>;
}

/// Account-creation flow: ready confirmation, name collection, collision
/// loop, final confirmation, provisioning, persistence.
#[derive(Clone, Debug, Default)]
pub struct ProvisionDialogue;

impl DialogueDefinition for ProvisionDialogue {
    fn flow(&self) -> DialogueFlow {
        DialogueFlow::Provision
    }

    fn initial_state(&self) -> DialogueState {
        DialogueState::AwaitingReadyConfirmation
    }

    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        context: &DialogueContext,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        transition_provision(current, event, context)
    }
}

/// Password-reset flow: one confirmation, one directory call.
#[derive(Clone, Debug, Default)]
pub struct ResetDialogue;

impl DialogueDefinition for ResetDialogue {
    fn flow(&self) -> DialogueFlow {
        DialogueFlow::PasswordReset
    }

    fn initial_state(&self) -> DialogueState {
        DialogueState::AwaitingResetConfirmation
    }

    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        context: &DialogueContext,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        transition_reset(current, event, context)
    }
}

pub struct DialogueEngine<F> {
    flow: F,
}

impl<F> DialogueEngine<F>
where
    F: DialogueDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> DialogueFlow {
        self.flow.flow()
    }

    pub fn initial_state(&self) -> DialogueState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        context: &DialogueContext,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for DialogueEngine<ProvisionDialogue> {
    fn default() -> Self {
        Self::new(ProvisionDialogue)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: DialogueState, event: DialogueEvent },
}

fn transition_provision(
    current: &DialogueState,
    event: &DialogueEvent,
    context: &DialogueContext,
) -> Result<TransitionOutcome, DialogueTransitionError> {
    use DialogueAction::{
        AcknowledgeDecline, AskEmailConfirmation, AskFirstName, AskLastName, CheckAvailability,
        DeliverCredentials, OfferCollisionRetry, OfferConfirmRetry, PersistRecord,
        ProvisionAccount, ReportFailure, ReportStorageFailure, SendSetupInfo,
    };
    use DialogueEvent::{
        AddressAvailable, AddressTaken, Affirmed, Declined, NameSubmitted, ProvisionFailed,
        ProvisionSucceeded, RecordSaveFailed, RecordSaved, Unrecognized,
    };
    use DialogueState::{
        AwaitingEmailConfirmation, AwaitingFinalRetryDecision, AwaitingFirstName, AwaitingLastName,
        AwaitingReadyConfirmation, AwaitingRetryDecision, CheckingAvailability, Persisting,
        Provisioning, Terminal,
    };

    let mut context = context.clone();
    if !matches!(event, Unrecognized) {
        context.reprompts = 0;
    }

    let (to, actions) = match (current, event) {
        (AwaitingReadyConfirmation, Affirmed) => (AwaitingFirstName, vec![AskFirstName]),
        (AwaitingReadyConfirmation, Declined) => (Terminal, vec![AcknowledgeDecline]),
        (AwaitingReadyConfirmation, Unrecognized) => {
            return Ok(reprompt_or_abort(current, context));
        }
        (AwaitingFirstName, NameSubmitted(name)) => {
            context.first_name = Some(normalize_name_part(name));
            (AwaitingLastName, vec![AskLastName])
        }
        (AwaitingLastName, NameSubmitted(name)) => {
            let last = normalize_name_part(name);
            let first = context.first_name.clone().unwrap_or_default();
            context.candidate = Some(EmailAddress::candidate(&first, &last, &context.email_domain));
            context.last_name = Some(last);
            (CheckingAvailability, vec![CheckAvailability])
        }
        (CheckingAvailability, AddressAvailable) => {
            (AwaitingEmailConfirmation, vec![AskEmailConfirmation])
        }
        (CheckingAvailability, AddressTaken) => (AwaitingRetryDecision, vec![OfferCollisionRetry]),
        (AwaitingRetryDecision, Affirmed) | (AwaitingFinalRetryDecision, Affirmed) => {
            clear_collected_names(&mut context);
            (AwaitingFirstName, vec![AskFirstName])
        }
        // Anything but an explicit yes at a retry decision abandons; these
        // prompts never re-ask.
        (AwaitingRetryDecision, Declined | Unrecognized)
        | (AwaitingFinalRetryDecision, Declined | Unrecognized) => {
            (Terminal, vec![AcknowledgeDecline])
        }
        (AwaitingEmailConfirmation, Affirmed) => (Provisioning, vec![ProvisionAccount]),
        (AwaitingEmailConfirmation, Declined | Unrecognized) => {
            (AwaitingFinalRetryDecision, vec![OfferConfirmRetry])
        }
        (Provisioning, ProvisionSucceeded) => (Persisting, vec![PersistRecord]),
        (Provisioning, ProvisionFailed) => (Terminal, vec![ReportFailure]),
        (Persisting, RecordSaved) => (Terminal, vec![DeliverCredentials, SendSetupInfo]),
        (Persisting, RecordSaveFailed) => (Terminal, vec![ReportStorageFailure]),
        _ => {
            return Err(DialogueTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, actions, context })
}

fn transition_reset(
    current: &DialogueState,
    event: &DialogueEvent,
    context: &DialogueContext,
) -> Result<TransitionOutcome, DialogueTransitionError> {
    use DialogueAction::{AcknowledgeDecline, DeliverNewPassword, ReportFailure, ResetPassword};
    use DialogueEvent::{Affirmed, Declined, ResetFailed, ResetSucceeded, Unrecognized};
    use DialogueState::{AwaitingResetConfirmation, Resetting, Terminal};

    let mut context = context.clone();
    if !matches!(event, Unrecognized) {
        context.reprompts = 0;
    }

    let (to, actions) = match (current, event) {
        (AwaitingResetConfirmation, Affirmed) => (Resetting, vec![ResetPassword]),
        (AwaitingResetConfirmation, Declined) => (Terminal, vec![AcknowledgeDecline]),
        (AwaitingResetConfirmation, Unrecognized) => {
            return Ok(reprompt_or_abort(current, context));
        }
        (Resetting, ResetSucceeded) => (Terminal, vec![DeliverNewPassword]),
        (Resetting, ResetFailed) => (Terminal, vec![ReportFailure]),
        _ => {
            return Err(DialogueTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, actions, context })
}

/// A decision point must never silently proceed on unrecognized input: it
/// repeats the question, up to the configured cap, then aborts the dialogue.
fn reprompt_or_abort(current: &DialogueState, mut context: DialogueContext) -> TransitionOutcome {
    context.reprompts += 1;
    if context.reprompts > context.max_reprompts {
        return TransitionOutcome {
            from: current.clone(),
            to: DialogueState::Terminal,
            actions: vec![DialogueAction::AbortRepromptsExhausted],
            context,
        };
    }

    TransitionOutcome {
        from: current.clone(),
        to: current.clone(),
        actions: vec![DialogueAction::RepeatQuestion],
        context,
    }
}

fn clear_collected_names(context: &mut DialogueContext) {
    context.first_name = None;
    context.last_name = None;
    context.candidate = None;
}
