//! Session registry: maps session IDs to live conversations.
//!
//! Shared by every connection of the web server. Lookup, insert and remove
//! happen under one write lock, so concurrent first contact for the same id
//! creates exactly one session. Each session sits behind its own async
//! mutex, which serializes `send` calls on it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use friendly_common::{ConfigError, SessionId};
use tokio::sync::{Mutex, RwLock};

use crate::{CompletionGateway, ConversationSession};

/// A session shared between the registry and the tasks using it.
pub type SharedSession = Arc<Mutex<ConversationSession>>;

/// Produces the gateway for a new session. A `ConfigError` aborts the
/// session's creation.
pub type GatewayFactory =
    Box<dyn Fn() -> Result<Arc<dyn CompletionGateway>, ConfigError> + Send + Sync>;

struct Entry {
    session: SharedSession,
    last_active: Instant,
}

/// Thread-safe session registry.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Entry>>>,
    factory: Arc<GatewayFactory>,
    context_window: usize,
}

impl SessionRegistry {
    pub fn new(factory: GatewayFactory) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            factory: Arc::new(factory),
            context_window: 0,
        }
    }

    /// Registry whose sessions all share one gateway.
    pub fn with_gateway(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self::new(Box::new(move || Ok(gateway.clone())))
    }

    /// Context window applied to sessions created from now on.
    pub fn with_context_window(mut self, entries: usize) -> Self {
        self.context_window = entries;
        self
    }

    /// Return the session for `id`, creating it if absent.
    ///
    /// An existing session is returned untouched (its transcript is not
    /// reset) and its activity timestamp is refreshed. If the gateway
    /// cannot be built nothing is stored.
    pub async fn get_or_create(
        &self,
        id: &SessionId,
        system_prompt: &str,
    ) -> Result<SharedSession, ConfigError> {
        let mut map = self.sessions.write().await;

        if let Some(entry) = map.get_mut(id) {
            entry.last_active = Instant::now();
            return Ok(entry.session.clone());
        }

        let factory: &GatewayFactory = &self.factory;
        let gateway = factory().inspect_err(|e| {
            tracing::warn!(session = %id, error = %e, "session creation failed");
        })?;

        let session = ConversationSession::create(id.clone(), gateway, system_prompt)
            .with_context_window(self.context_window);
        let session = Arc::new(Mutex::new(session));

        map.insert(
            id.clone(),
            Entry {
                session: session.clone(),
                last_active: Instant::now(),
            },
        );
        tracing::info!(session = %id, sessions = map.len(), "session created");

        Ok(session)
    }

    /// Remove and close a session. Returns false (and does nothing) when the
    /// id is unknown.
    pub async fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(entry) => {
                tracing::info!(session = %id, "session removed");
                close_session(entry.session);
                true
            }
            None => false,
        }
    }

    /// Remove sessions with no activity for longer than `max_idle`.
    /// Returns how many were reaped.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut reaped = Vec::new();
        {
            let mut map = self.sessions.write().await;
            map.retain(|id, entry| {
                let stale = now.duration_since(entry.last_active) > max_idle;
                if stale {
                    tracing::info!(session = %id, "Reaping idle session");
                    reaped.push(entry.session.clone());
                }
                !stale
            });
        }

        let count = reaped.len();
        for session in reaped {
            close_session(session);
        }
        count
    }

    /// Check if a session exists.
    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Number of active sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Close a session that has left the registry.
///
/// A session busy with a `send` is closed once that call releases it.
fn close_session(session: SharedSession) {
    if let Ok(mut guard) = session.try_lock() {
        guard.close();
        return;
    }
    tokio::spawn(async move {
        session.lock().await.close();
    });
}
