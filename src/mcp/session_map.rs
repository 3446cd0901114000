use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

const MAX_SESSIONS: usize = 1000;

#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub agent_name: String,
    pub workspace_id: String,
}

/// Bounded, LRU-evicted `sessionId → identity` map (spec §4.8). `register`
/// populates it; every other tool looks the caller up here instead of
/// re-authenticating.
pub struct SessionMap {
    inner: Mutex<LruCache<String, SessionIdentity>>,
}

impl Default for SessionMap {
    fn default() -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(MAX_SESSIONS).expect("MAX_SESSIONS is nonzero"),
            )),
        }
    }
}

impl SessionMap {
    pub fn bind(&self, session_id: &str, agent_name: &str, workspace_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(
                session_id.to_string(),
                SessionIdentity {
                    agent_name: agent_name.to_string(),
                    workspace_id: workspace_id.to_string(),
                },
            );
    }

    pub fn identity(&self, session_id: &str) -> Option<SessionIdentity> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
    }

    pub fn remove(&self, session_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop(session_id);
    }
}
