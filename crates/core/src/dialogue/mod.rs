pub mod engine;
pub mod patterns;
pub mod states;

pub use engine::{
    DialogueDefinition, DialogueEngine, DialogueTransitionError, ProvisionDialogue, ResetDialogue,
};
pub use patterns::{classify_answer, Answer};
pub use states::{
    DialogueAction, DialogueContext, DialogueEvent, DialogueFlow, DialogueState, TransitionOutcome,
};
