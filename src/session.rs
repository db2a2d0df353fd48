use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::coords::SelectionState;
use crate::types::Estimate;

/// Per-session dashboard state. Only the click selection and the estimate
/// currently on display outlive a single interaction.
#[derive(Debug, Default)]
pub struct Session {
    pub selection: SelectionState,
    pub last_estimate: Option<Estimate>,
}

impl Session {
    /// Forget both clicks and whatever fare was shown.
    pub fn reset(&mut self) {
        self.selection.reset();
        self.last_estimate = None;
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// How long an untouched session survives before a sweep drops it.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct Entry {
    handle: SessionHandle,
    touched: parking_lot::Mutex<Instant>,
}

/// Sessions keyed by id. The async mutex on each entry is held for a whole
/// interaction, so one session never runs two passes at once.
///
/// Clients that never call `DELETE` would otherwise pile up forever, so every
/// lookup refreshes the entry's timestamp and sessions idle longer than
/// `idle_timeout` are swept on `create` and by [`SessionStore::evict_idle`].
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn create(&self) -> Uuid {
        let now = Instant::now();
        self.evict_idle_at(now);
        let id = Uuid::new_v4();
        self.sessions.write().insert(
            id,
            Entry {
                handle: SessionHandle::default(),
                touched: parking_lot::Mutex::new(now),
            },
        );
        tracing::debug!("session {} created", id);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        let sessions = self.sessions.read();
        let entry = sessions.get(id)?;
        *entry.touched.lock() = Instant::now();
        Some(entry.handle.clone())
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::debug!("session {} closed", id);
        }
        removed
    }

    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    /// Drop every session last touched more than `idle_timeout` before `now`.
    /// An interaction already holding a handle finishes on its own copy.
    pub fn evict_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(*entry.touched.lock()) <= self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!("evicted {} idle sessions; {} remain", evicted, sessions.len());
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::LatLon;

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();
        store
            .get(&a)
            .unwrap()
            .lock()
            .await
            .selection
            .capture_click(LatLon::new(40.0, -73.0));
        assert!(store.get(&b).unwrap().lock().await.selection.pickup.is_none());
        assert!(store.remove(&a));
        assert!(store.get(&a).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::from_secs(60));
        let stale = store.create();
        let fresh = store.create();

        assert_eq!(store.evict_idle_at(Instant::now()), 0, "Nothing is idle yet");

        // only `fresh` is touched, 45s into the future
        let later = Instant::now() + Duration::from_secs(45);
        *store.sessions.read()[&fresh].touched.lock() = later;

        assert_eq!(store.evict_idle_at(later + Duration::from_secs(30)), 1);
        assert!(store.get(&stale).is_none(), "Stale session must be gone");
        assert!(store.get(&fresh).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_refreshes_session() {
        let store = SessionStore::with_idle_timeout(Duration::from_secs(60));
        let id = store.create();
        let created = *store.sessions.read()[&id].touched.lock();
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get(&id).is_some());
        assert!(*store.sessions.read()[&id].touched.lock() > created);
        // idle past the timeout when measured from creation, but not from the lookup
        let deadline = created + Duration::from_secs(60) + Duration::from_millis(2);
        assert_eq!(store.evict_idle_at(deadline), 0);
        assert_eq!(store.len(), 1);
    }
}
