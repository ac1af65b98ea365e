//! Conversation runtime: drives the pure dialogue machine from
//! `mailbot-core` against the directory client and the record store, one
//! suspended step at a time, with an explicit per-identity session table.

pub mod messages;
pub mod runtime;
pub mod session;

pub use runtime::{ConversationRuntime, RuntimeSettings};
pub use session::{DialogueSession, SessionTable};
