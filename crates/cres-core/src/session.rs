//! Session state and the checkpoint store trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Document, Generation, Result};

/// Per-thread state of one research conversation.
///
/// Owned exclusively by the workflow engine while a session is in flight and
/// checkpointed to the [`SessionStore`] after each committed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Current (possibly rewritten) query
    pub question: String,
    /// Gap identified by the completeness grader; overwritten each grading pass
    pub follow_up_question: String,
    /// Latest produced answer
    pub generation: Generation,
    /// Evidence currently in scope; replaced wholesale each retrieval
    pub documents: Vec<Document>,
    /// Raw search hits after credibility scoring, kept for traceability
    pub web_results: Vec<Document>,
    /// Completed refinement cycles; never decremented
    pub retry_count: u32,
}

impl SessionState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            follow_up_question: String::new(),
            generation: Generation::Empty,
            documents: Vec::new(),
            web_results: Vec::new(),
            retry_count: 0,
        }
    }
}

/// Trait for session checkpoint stores (`thread_id -> SessionState`)
///
/// The store is the only process-wide mutable structure; each session owns
/// its slot exclusively while a workflow run is in flight.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the state for a thread, replacing any previous checkpoint
    async fn checkpoint(&self, thread_id: &str, state: &SessionState) -> Result<()>;

    /// Load the last checkpointed state for a thread
    async fn load(&self, thread_id: &str) -> Result<Option<SessionState>>;

    /// Drop the state for a thread
    async fn evict(&self, thread_id: &str) -> Result<()>;
}
