//! In-memory session checkpoint store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use cres_core::{Result, SessionState, SessionStore};

/// Process-local `thread_id -> SessionState` store.
///
/// The default checkpoint backend; state lives for the lifetime of the
/// process and is evicted explicitly.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn checkpoint(&self, thread_id: &str, state: &SessionState) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(thread_id.to_string(), state.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<SessionState>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(thread_id).cloned())
    }

    async fn evict(&self, thread_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(thread_id);
        Ok(())
    }
}
