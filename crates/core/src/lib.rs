pub mod address;
pub mod config;
pub mod credential;
pub mod dialogue;
pub mod domain;
pub mod errors;

pub use address::{normalize_name_part, EmailAddress};
pub use credential::generate_password;
pub use dialogue::engine::{DialogueDefinition, DialogueEngine, ProvisionDialogue, ResetDialogue};
pub use dialogue::patterns::{classify_answer, Answer};
pub use dialogue::states::{
    DialogueAction, DialogueContext, DialogueEvent, DialogueFlow, DialogueState, TransitionOutcome,
};
pub use domain::record::{ChatUserId, UserRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError};
