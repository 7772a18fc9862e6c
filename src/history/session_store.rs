use log::{ debug, info };
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{ Duration, Instant };
use tokio::sync::{ Mutex, RwLock };
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{ ChatSession, SessionSnapshot };

/// Locked for the whole turn, including the upstream call.
pub type SharedSession = Arc<Mutex<ChatSession>>;

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
    snapshot: Option<SessionSnapshot>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `id`, or starts a fresh session under a new id when it is
    /// absent or unknown. Client-supplied ids are never adopted.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SharedSession) {
        let mut map = self.inner.write().await;
        if let Some(id) = id {
            if let Some(entry) = map.get_mut(&id) {
                entry.last_seen = Instant::now();
                return (id, entry.session.clone());
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::new(id.to_string())));
        map.insert(id, SessionEntry {
            session: session.clone(),
            last_seen: Instant::now(),
            snapshot: None,
        });
        debug!("Created chat session {}", id);
        (id, session)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.inner.read().await.get(id).map(|e| e.session.clone())
    }

    /// Remembers how `id` looked before a turn, for readers that find it locked.
    pub async fn record_snapshot(&self, id: &Uuid, snapshot: SessionSnapshot) {
        if let Some(entry) = self.inner.write().await.get_mut(id) {
            entry.snapshot = Some(snapshot);
        }
    }

    pub async fn snapshot(&self, id: &Uuid) -> Option<SessionSnapshot> {
        self.inner.read().await.get(id).and_then(|e| e.snapshot.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.inner.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops sessions idle longer than `ttl`. Sessions mid-turn are kept.
    pub async fn purge_idle(&self, ttl: Duration) -> usize {
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, entry| {
            let busy = entry.session.try_lock().is_err();
            busy || entry.last_seen.elapsed() < ttl
        });
        before - map.len()
    }

    pub fn spawn_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = (ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let purged = store.purge_idle(ttl).await;
                if purged > 0 {
                    info!("Expired {} idle chat session(s)", purged);
                }
            }
        })
    }
}
