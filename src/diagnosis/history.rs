use crate::diagnosis::types::DiagnosisResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Identifies one user session. History never crosses sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(SessionId)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        SessionId(id)
    }
}

/// Append-only diagnosis history, scoped per session.
///
/// Entries are handed out as shared read-only `Arc`s; once appended an entry
/// is never modified or reordered. `clear` is only called when a session ends.
pub trait HistoryStore: Send + Sync {
    fn append(&self, session: SessionId, entry: Arc<DiagnosisResult>);
    fn entries(&self, session: SessionId) -> Vec<Arc<DiagnosisResult>>;
    /// Removes and returns the session's entries, oldest first.
    fn clear(&self, session: SessionId) -> Vec<Arc<DiagnosisResult>>;
    fn sessions(&self) -> Vec<SessionId>;
}

/// Process-lifetime store.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    sessions: RwLock<HashMap<SessionId, Vec<Arc<DiagnosisResult>>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&self, session: SessionId, entry: Arc<DiagnosisResult>) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.entry(session).or_default().push(entry);
    }

    fn entries(&self, session: SessionId) -> Vec<Arc<DiagnosisResult>> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(&session).cloned().unwrap_or_default()
    }

    fn clear(&self, session: SessionId) -> Vec<Arc<DiagnosisResult>> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&session).unwrap_or_default()
    }

    fn sessions(&self) -> Vec<SessionId> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.keys().copied().collect()
    }
}
