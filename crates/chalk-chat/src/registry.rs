//! In-memory registry of live sessions for the HTTP surface.
//!
//! Each session sits behind its own async mutex so one slow completion
//! never blocks other sessions. Idle sessions expire after the configured
//! timeout.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::ChatError;
use crate::session::ConversationSession;

pub type SessionHandle = Arc<tokio::sync::Mutex<ConversationSession>>;

struct Entry {
    handle: SessionHandle,
    last_access: Instant,
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    timeout: Option<Duration>,
}

impl SessionRegistry {
    /// `timeout_minutes == 0` keeps sessions until they are removed.
    pub fn new(timeout_minutes: u64) -> Self {
        let timeout = (timeout_minutes > 0).then(|| Duration::from_secs(timeout_minutes * 60));
        Self::with_timeout(timeout)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Entry>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::Storage(format!("session registry poisoned: {}", e)))
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        self.timeout
            .is_some_and(|t| now.duration_since(entry.last_access) >= t)
    }

    pub fn create(&self, session: ConversationSession) -> Result<(Uuid, SessionHandle), ChatError> {
        let id = session.id();
        let handle = Arc::new(tokio::sync::Mutex::new(session));
        self.lock()?.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_access: Instant::now(),
            },
        );
        tracing::debug!(session_id = %id, "Session registered");
        Ok((id, handle))
    }

    /// Look up a session and refresh its idle timer.
    pub fn get(&self, id: Uuid) -> Result<SessionHandle, ChatError> {
        let now = Instant::now();
        let mut sessions = self.lock()?;
        let expired = match sessions.get(&id) {
            None => return Err(ChatError::SessionNotFound(id)),
            Some(entry) => self.is_expired(entry, now),
        };
        if expired {
            sessions.remove(&id);
            tracing::info!(session_id = %id, "Session expired");
            return Err(ChatError::SessionNotFound(id));
        }
        let entry = sessions
            .get_mut(&id)
            .ok_or(ChatError::SessionNotFound(id))?;
        entry.last_access = now;
        Ok(entry.handle.clone())
    }

    pub fn remove(&self, id: Uuid) -> Result<(), ChatError> {
        match self.lock()?.remove(&id) {
            Some(_) => {
                tracing::info!(session_id = %id, "Session closed");
                Ok(())
            }
            None => Err(ChatError::SessionNotFound(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, ChatError> {
        if self.timeout.is_none() {
            return Ok(0);
        }
        let now = Instant::now();
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::info!(purged, "Expired sessions purged");
        }
        Ok(purged)
    }
}
