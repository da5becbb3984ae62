use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

/// External authentication service.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> CoreResult<Option<Session>>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// The session a flow runs under, passed explicitly to each flow.
#[derive(Clone)]
pub struct SessionContext {
    current: watch::Receiver<Option<Session>>,
}

impl SessionContext {
    /// A context that never changes, e.g. one built per HTTP request from a
    /// verified token.
    pub fn fixed(session: Option<Session>) -> Self {
        let (_tx, current) = watch::channel(session);
        Self { current }
    }

    /// Reads the provider's current session, then keeps following it: every
    /// event triggers a fresh read. The returned observer owns the listener.
    pub async fn observe(provider: Arc<dyn SessionProvider>) -> CoreResult<(Self, SessionObserver)> {
        let mut events = provider.subscribe();
        let initial = provider.current_session().await?;
        let (tx, current) = watch::channel(initial);

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => debug!("Session event: {:?}", event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Session listener lagged by {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                match provider.current_session().await {
                    Ok(session) => {
                        tx.send_replace(session);
                    }
                    Err(e) => warn!("Failed to re-read session: {}", e),
                }
            }
            info!("Session provider closed, listener stopped");
        });

        Ok((Self { current }, SessionObserver { task }))
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn require(&self) -> CoreResult<Session> {
        self.current().ok_or(CoreError::Unauthenticated)
    }

    /// Waits for the next identity change. Returns `false` once nothing can
    /// change any more.
    pub async fn changed(&mut self) -> bool {
        self.current.changed().await.is_ok()
    }
}

/// Handle on the listener started by [`SessionContext::observe`].
pub struct SessionObserver {
    task: JoinHandle<()>,
}

impl SessionObserver {
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for SessionObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Provider whose state lives in this process, for embedded clients and tests.
pub struct LocalSessionProvider {
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl LocalSessionProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            session: RwLock::new(None),
            events,
        }
    }

    pub fn sign_in(&self, session: Session) {
        self.replace(Some(session.clone()));
        let _ = self.events.send(SessionEvent::SignedIn(session));
    }

    pub fn refresh(&self, session: Session) {
        self.replace(Some(session.clone()));
        let _ = self.events.send(SessionEvent::TokenRefreshed(session));
    }

    pub fn sign_out(&self) {
        self.replace(None);
        let _ = self.events.send(SessionEvent::SignedOut);
    }

    fn replace(&self, session: Option<Session>) {
        let mut guard = self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = session;
    }
}

impl Default for LocalSessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for LocalSessionProvider {
    async fn current_session(&self) -> CoreResult<Option<Session>> {
        let guard = self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn session(email: &str) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: Some(email.to_string()),
        }
    }

    #[test]
    fn test_fixed_context() {
        let s = session("ravi@example.com");
        let ctx = SessionContext::fixed(Some(s.clone()));
        assert_eq!(ctx.current(), Some(s.clone()));
        assert_eq!(ctx.require().unwrap(), s);

        let anonymous = SessionContext::fixed(None);
        assert!(matches!(anonymous.require(), Err(CoreError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_observer_follows_sign_in_and_out() {
        let provider = Arc::new(LocalSessionProvider::new());
        let (mut ctx, _observer) = SessionContext::observe(provider.clone()).await.unwrap();
        assert_eq!(ctx.current(), None);

        let s = session("asha@example.com");
        provider.sign_in(s.clone());
        assert!(timeout(Duration::from_secs(1), ctx.changed()).await.unwrap());
        assert_eq!(ctx.current(), Some(s));

        provider.sign_out();
        assert!(timeout(Duration::from_secs(1), ctx.changed()).await.unwrap());
        assert_eq!(ctx.current(), None);
    }

    #[tokio::test]
    async fn test_observe_picks_up_existing_session() {
        let provider = Arc::new(LocalSessionProvider::new());
        let s = session("asha@example.com");
        provider.sign_in(s.clone());

        let (ctx, observer) = SessionContext::observe(provider.clone()).await.unwrap();
        assert_eq!(ctx.current(), Some(s));
        observer.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_following() {
        let provider = Arc::new(LocalSessionProvider::new());
        let (mut ctx, observer) = SessionContext::observe(provider.clone()).await.unwrap();

        observer.shutdown();
        provider.sign_in(session("late@example.com"));

        // the sender side went away with the aborted task
        let changed = timeout(Duration::from_secs(1), ctx.changed()).await.unwrap();
        assert!(!changed);
        assert_eq!(ctx.current(), None);
    }
}
