//! In-memory session table with idle eviction.
//!
//! Sessions live only as long as the process. Each entry records when it
//! was last touched; any entry idle past the threshold is swept on the next
//! `get_or_create` or an explicit `evict_idle`.

use async_trait::async_trait;
use kubeclaw_core::error::SessionError;
use kubeclaw_core::session::{Session, SessionHandle, SessionId, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

/// Default idle threshold: 30 minutes.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct Entry {
    handle: SessionHandle,
    last_accessed: Instant,
}

/// A session store backed by a `HashMap` behind an async `RwLock`.
pub struct InMemorySessionStore {
    persona: String,
    idle_timeout: Duration,
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemorySessionStore {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn sweep(&self, entries: &mut HashMap<String, Entry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|id, e| {
            let keep = now.duration_since(e.last_accessed) <= self.idle_timeout;
            if !keep {
                debug!(session_id = %id, "Evicting idle session");
            }
            keep
        });
        before - entries.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: Option<&str>) -> Result<SessionHandle, SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let evicted = self.sweep(&mut entries, now);
        if evicted > 0 {
            info!(evicted, remaining = entries.len(), "Swept idle sessions");
        }

        if let Some(id) = id.filter(|s| !s.trim().is_empty()) {
            if let Some(entry) = entries.get_mut(id) {
                entry.last_accessed = now;
                return Ok(entry.handle.clone());
            }
        }

        let session_id = match id.filter(|s| !s.trim().is_empty()) {
            Some(id) => SessionId::from(id),
            None => SessionId::generate(),
        };
        let key = session_id.as_str().to_string();
        let handle = Arc::new(Mutex::new(Session::new(session_id, self.persona.clone())));
        entries.insert(
            key.clone(),
            Entry {
                handle: handle.clone(),
                last_accessed: now,
            },
        );
        debug!(session_id = %key, "Created session");
        Ok(handle)
    }

    async fn get(&self, id: &str) -> Result<Option<SessionHandle>, SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            Some(entry) if now.duration_since(entry.last_accessed) <= self.idle_timeout => {
                entry.last_accessed = now;
                Ok(Some(entry.handle.clone()))
            }
            Some(_) => {
                entries.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, SessionError> {
        Ok(self.entries.write().await.remove(id).is_some())
    }

    async fn evict_idle(&self) -> Result<usize, SessionError> {
        let mut entries = self.entries.write().await;
        Ok(self.sweep(&mut entries, Instant::now()))
    }

    async fn len(&self) -> Result<usize, SessionError> {
        Ok(self.entries.read().await.len())
    }

    async fn ids(&self) -> Result<Vec<SessionId>, SessionError> {
        let entries = self.entries.read().await;
        let mut ids: Vec<SessionId> = entries.keys().map(|k| SessionId::from(k.as_str())).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}
