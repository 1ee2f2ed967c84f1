//! In-memory session store (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, RwLock, TryLockError};
use tokio::time::Instant;
use uuid::Uuid;

use crate::chat::ChatSession;

use super::types::MessageView;

/// A stored session.
///
/// The session itself is locked for the whole of a turn, so turns within one
/// session run one at a time while different sessions proceed in parallel.
/// Readers that must not wait for a turn use [`snapshot`](Self::snapshot),
/// the transcript as of the last finished turn.
pub struct SessionEntry {
    session: Mutex<ChatSession>,
    snapshot: RwLock<Vec<MessageView>>,
    configured: bool,
}

pub type SharedSession = Arc<SessionEntry>;

impl SessionEntry {
    fn new(session: ChatSession) -> Self {
        Self {
            snapshot: RwLock::new(MessageView::from_transcript(session.transcript())),
            configured: session.is_configured(),
            session: Mutex::new(session),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Wait for the session, e.g. to run a turn.
    pub async fn lock(&self) -> MutexGuard<'_, ChatSession> {
        self.session.lock().await
    }

    /// Take the session only if no turn is running.
    pub fn try_lock(&self) -> Result<MutexGuard<'_, ChatSession>, TryLockError> {
        self.session.try_lock()
    }

    /// Record the transcript of a session the caller holds, and return it.
    pub async fn publish(&self, session: &ChatSession) -> Vec<MessageView> {
        let messages = MessageView::from_transcript(session.transcript());
        *self.snapshot.write().await = messages.clone();
        messages
    }

    pub async fn snapshot(&self) -> Vec<MessageView> {
        self.snapshot.read().await.clone()
    }

    pub fn into_session(self) -> ChatSession {
        self.session.into_inner()
    }
}

struct Slot {
    entry: SharedSession,
    last_used: Instant,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Slot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ChatSession) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let entry = Arc::new(SessionEntry::new(session));
        self.sessions.write().await.insert(
            id,
            Slot {
                entry: entry.clone(),
                last_used: Instant::now(),
            },
        );
        (id, entry)
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(&id)?;
        slot.last_used = Instant::now();
        Some(slot.entry.clone())
    }

    pub async fn remove(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.write().await.remove(&id).map(|slot| slot.entry)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Dispose sessions unused for at least `max_idle`. Sessions in the
    /// middle of a turn are kept. Returns how many were removed.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let expired: Vec<(Uuid, SharedSession)> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, slot)| {
                    slot.last_used.elapsed() >= max_idle && slot.entry.try_lock().is_ok()
                })
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|slot| (id, slot.entry)))
                .collect()
        };

        let removed = expired.len();
        for (id, entry) in expired {
            // A request still holding the entry drops it when it finishes.
            match Arc::into_inner(entry) {
                Some(entry) => {
                    let transcript = entry.into_session().dispose();
                    tracing::info!(session_id = %id, messages = transcript.len(), "Idle session disposed");
                }
                None => tracing::info!(session_id = %id, "Idle session removed while still referenced"),
            }
        }
        removed
    }
}

/// Periodically dispose sessions idle longer than `max_idle`.
pub fn spawn_idle_sweeper(store: SessionStore, max_idle: Duration) -> tokio::task::JoinHandle<()> {
    let period = (max_idle / 2).clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let removed = store.sweep_idle(max_idle).await;
            if removed > 0 {
                let remaining = store.len().await;
                tracing::info!(removed, remaining, "Swept idle sessions");
            }
        }
    })
}
