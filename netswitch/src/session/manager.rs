//! Session table with idle eviction.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, info, warn};
use tokio::sync::MutexGuard;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use super::factory::SwitchFactory;
use crate::driver::Switch;
use crate::error::{Result, SessionError};

/// Timing knobs for a [`SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions idle for longer than this are evicted.
    pub inactivity_timeout: Duration,

    /// Interval between passes of the background reaper.
    pub reaper_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(60),
            reaper_period: Duration::from_secs(10),
        }
    }
}

/// A connected switch reserved under a session id.
pub struct Session {
    id: String,
    hostname: String,
    switch: tokio::sync::Mutex<Box<dyn Switch>>,
    last_access: Mutex<Instant>,
}

impl Session {
    fn new(id: String, hostname: String, switch: Box<dyn Switch>) -> Self {
        Self {
            id,
            hostname,
            switch: tokio::sync::Mutex::new(switch),
            last_access: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Take exclusive use of the switch.
    ///
    /// Last-access is stamped before waiting and again once the switch is
    /// ours, so a slow operation never looks idle when it starts.
    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn Switch>> {
        self.touch();
        let guard = self.switch.lock().await;
        self.touch();
        guard
    }

    fn touch(&self) {
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    fn is_busy(&self) -> bool {
        self.switch.try_lock().is_err()
    }

    /// Disconnect the switch, logging failures.
    async fn shutdown(&self) {
        let mut switch = self.switch.lock().await;
        if switch.is_connected() {
            if let Err(e) = switch.disconnect().await {
                warn!("session {}: disconnect from {} failed: {e}", self.id, self.hostname);
            }
        }
    }
}

/// Keeps switches connected across independent requests.
///
/// Each session holds its switch (and through it the device lock) until it
/// is closed or left idle for longer than
/// [`SessionConfig::inactivity_timeout`].
pub struct SessionManager {
    factory: Arc<dyn SwitchFactory>,
    sessions: DashMap<String, Arc<Session>>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn SwitchFactory>, config: SessionConfig) -> Self {
        Self {
            factory,
            sessions: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of sessions in the table, expired or not.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Connect the switch registered for `hostname` and bind it to a
    /// session. A random id is generated when `session_id` is `None`.
    pub async fn open_session(&self, hostname: &str, session_id: Option<String>) -> Result<String> {
        let id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.lookup(&id).await.is_some() {
            return Err(SessionError::SessionAlreadyExists { id }.into());
        }

        let mut switch = self.factory.get_switch(hostname)?;
        switch.connect().await?;
        let session = Arc::new(Session::new(id.clone(), hostname.to_string(), switch));

        let inserted = match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&session));
                true
            }
        };
        if !inserted {
            // Lost a race against another open with the same id
            session.shutdown().await;
            return Err(SessionError::SessionAlreadyExists { id }.into());
        }

        info!("session {id} opened on {hostname}");
        Ok(id)
    }

    /// The session bound to `id`, with its last-access refreshed.
    pub async fn resolve(&self, id: &str) -> Result<Arc<Session>> {
        let session = self
            .lookup(id)
            .await
            .ok_or_else(|| SessionError::UnknownSession { id: id.to_string() })?;
        session.touch();
        Ok(session)
    }

    /// Refresh a session without using its switch.
    pub async fn keep_alive(&self, id: &str) -> Result<()> {
        self.resolve(id).await?;
        debug!("session {id} kept alive");
        Ok(())
    }

    /// Disconnect the session's switch and forget the session.
    pub async fn close_session(&self, id: &str) -> Result<()> {
        let Some((_, session)) = self.sessions.remove(id) else {
            return Err(SessionError::UnknownSession { id: id.to_string() }.into());
        };

        let mut switch = session.switch.lock().await;
        let outcome = if switch.is_connected() {
            switch.disconnect().await
        } else {
            Ok(())
        };
        info!("session {id} closed on {}", session.hostname);
        outcome
    }

    pub async fn start_transaction(&self, id: &str) -> Result<()> {
        let session = self.resolve(id).await?;
        let mut switch = session.lock().await;
        switch.start_transaction().await
    }

    pub async fn end_transaction(&self, id: &str) -> Result<()> {
        let session = self.resolve(id).await?;
        let mut switch = session.lock().await;
        switch.end_transaction().await
    }

    pub async fn commit_transaction(&self, id: &str) -> Result<()> {
        let session = self.resolve(id).await?;
        let mut switch = session.lock().await;
        switch.commit_transaction().await
    }

    pub async fn rollback_transaction(&self, id: &str) -> Result<()> {
        let session = self.resolve(id).await?;
        let mut switch = session.lock().await;
        switch.rollback_transaction().await
    }

    /// Evict every idle session whose switch is not in use. Returns how many
    /// were evicted.
    pub async fn evict_idle(&self) -> usize {
        let expired: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .filter(|entry| self.is_expired(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut evicted = 0;
        for session in expired {
            if self.evict(&session).await {
                evicted += 1;
            }
        }
        evicted
    }

    /// Run [`evict_idle`](Self::evict_idle) every
    /// [`SessionConfig::reaper_period`] until the manager is dropped.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        let period = self.config.reaper_period;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let evicted = manager.evict_idle().await;
                if evicted > 0 {
                    debug!("reaper evicted {evicted} idle session(s)");
                }
            }
        })
    }

    fn is_expired(&self, session: &Session) -> bool {
        session.idle_for() > self.config.inactivity_timeout && !session.is_busy()
    }

    /// Live session for `id`, evicting it first if it has expired.
    async fn lookup(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;
        if !self.is_expired(&session) {
            return Some(session);
        }
        self.evict(&session).await;
        None
    }

    /// Remove `session` if it is still the one bound to its id, then
    /// disconnect it. Returns whether it was removed.
    async fn evict(&self, session: &Arc<Session>) -> bool {
        let removed = self
            .sessions
            .remove_if(&session.id, |_, bound| Arc::ptr_eq(bound, session))
            .is_some();
        if removed {
            info!(
                "session {} on {} expired after {:?} idle",
                session.id,
                session.hostname,
                session.idle_for()
            );
            session.shutdown().await;
        }
        removed
    }
}
