use std::collections::HashMap;

use tokio::sync::Mutex;

use mailbot_core::dialogue::{DialogueContext, DialogueFlow, DialogueState};
use mailbot_core::domain::record::ChatUserId;

/// One in-flight dialogue for one chat identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogueSession {
    pub flow: DialogueFlow,
    pub state: DialogueState,
    pub context: DialogueContext,
}

/// Explicit session table keyed by chat identity. Conversations for distinct
/// identities proceed independently; a session is taken out for the duration
/// of one turn, so the turn's outbound calls complete before the next turn
/// of the same conversation is processed.
#[derive(Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<String, DialogueSession>>,
}

impl SessionTable {
    pub async fn contains(&self, id: &ChatUserId) -> bool {
        self.sessions.lock().await.contains_key(id.as_str())
    }

    pub async fn insert(&self, id: &ChatUserId, session: DialogueSession) {
        self.sessions.lock().await.insert(id.as_str().to_owned(), session);
    }

    /// Removes and returns the session so the caller can process a turn
    /// without holding the table lock across awaits.
    pub async fn take(&self, id: &ChatUserId) -> Option<DialogueSession> {
        self.sessions.lock().await.remove(id.as_str())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
