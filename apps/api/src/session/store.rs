//! In-memory session store. Sessions are never persisted; a restart forgets them, and a
//! background sweep drops sessions that have sat idle past the configured TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::session::controller::{Controller, ControllerSnapshot};

pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub controller: Controller,
    /// Monotonic twin of `updated_at`; idle eviction is measured against it.
    last_active: Instant,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            controller: Controller::new(),
            last_active: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            state: self.controller.snapshot(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: ControllerSnapshot,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> SessionSnapshot {
        let session = Session::new();
        let snapshot = session.snapshot();
        self.sessions.write().await.insert(session.id, session);
        snapshot
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Runs `f` under the read lock. `None` if the session does not exist.
    pub async fn read<R>(&self, id: Uuid, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.sessions.read().await.get(&id).map(f)
    }

    /// Runs `f` under the write lock and bumps `updated_at`. Keep `f` synchronous and short:
    /// the lock is held for its whole duration.
    pub async fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;
        session.updated_at = Utc::now();
        session.last_active = Instant::now();
        Some(f(session))
    }

    /// Drops every session not updated within `ttl`. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_active) < ttl);
        before - sessions.len()
    }

    /// Runs [`evict_idle`](Self::evict_idle) every `every` for the life of the runtime.
    pub fn spawn_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(ttl).await;
                if evicted > 0 {
                    let remaining = store.len().await;
                    info!(evicted, remaining, "Evicted idle sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TemplateStyle;

    #[tokio::test]
    async fn test_create_then_read() {
        let store = SessionStore::new();
        let created = store.create().await;
        let view = store
            .read(created.id, |s| s.controller.snapshot().view)
            .await
            .unwrap();
        assert_eq!(view, crate::session::controller::AppView::Input);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = SessionStore::new();
        assert!(store.read(Uuid::new_v4(), |_| ()).await.is_none());
        assert!(store.update(Uuid::new_v4(), |_| ()).await.is_none());
        assert!(!store.remove(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_update_is_visible_to_clones() {
        let store = SessionStore::new();
        let id = store.create().await.id;
        let other = store.clone();

        other
            .update(id, |s| {
                s.controller.select_template(TemplateStyle::ExecutiveElegance)
            })
            .await
            .unwrap();

        let template = store.read(id, |s| s.controller.template()).await.unwrap();
        assert_eq!(template, TemplateStyle::ExecutiveElegance);
        assert!(store.remove(id).await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_flattens_controller_state() {
        let store = SessionStore::new();
        let snapshot = store.create().await;
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["view"], "input");
        assert_eq!(value["template"], "modern-hybrid");
        assert_eq!(value["container_id"], "resume-container-modern-hybrid");
        assert!(value["id"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_keeps_recently_updated() {
        let store = SessionStore::new();
        let idle = store.create().await.id;
        let busy = store.create().await.id;

        tokio::time::advance(Duration::from_secs(90)).await;
        store.update(busy, |_| ()).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.evict_idle(Duration::from_secs(100)).await, 1);
        assert!(store.read(idle, |_| ()).await.is_none());
        assert!(store.read(busy, |_| ()).await.is_some());
        assert_eq!(store.evict_idle(Duration::from_secs(100)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drops_idle_sessions() {
        let store = SessionStore::new();
        store.create().await;
        let sweeper = store.spawn_sweeper(Duration::from_secs(60), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.len().await, 1);

        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(store.len().await, 0);
        sweeper.abort();
    }
}
