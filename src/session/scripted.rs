//! Scripted in-memory session for tests
//!
//! Routes map URLs to canned replies. The factory counts creates and closes
//! and remembers which session served each visit, so lifecycle rules can be
//! asserted.

use crate::session::{LoadedPage, Session, SessionError, SessionFactory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Canned response for one URL
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Loads the given markup at the requested URL
    Page(String),
    /// Loads the given markup after redirecting to another URL
    Redirect(String, String),
    /// Reports a session-side timeout immediately
    Timeout,
    /// Reports a navigation failure
    Fail(String),
    /// Never completes
    Hang,
    /// Panics inside the session
    Panic(String),
}

impl Reply {
    pub(crate) fn page(content: &str) -> Self {
        Self::Page(content.to_string())
    }
}

#[derive(Default)]
struct Shared {
    routes: Mutex<HashMap<String, Reply>>,
    visits: Mutex<Vec<(usize, String)>>,
    created: AtomicUsize,
    closed: AtomicUsize,
    max_live: AtomicUsize,
    unhealthy: AtomicBool,
    create_limit: Mutex<Option<usize>>,
}

impl Shared {
    fn live(&self) -> usize {
        self.created
            .load(Ordering::SeqCst)
            .saturating_sub(self.closed.load(Ordering::SeqCst))
    }
}

/// Factory for scripted sessions; clones share routes and counters
#[derive(Clone, Default)]
pub(crate) struct ScriptedFactory {
    shared: Arc<Shared>,
}

impl ScriptedFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a route; the URL is normalized the way `Url` prints it
    pub(crate) fn route(self, url: &str, reply: Reply) -> Self {
        let key = Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string());
        self.shared.routes.lock().unwrap().insert(key, reply);
        self
    }

    /// Allows `limit` successful creates, failing every one after
    pub(crate) fn fail_creates_after(self, limit: usize) -> Self {
        *self.shared.create_limit.lock().unwrap() = Some(limit);
        self
    }

    /// Marks the current session (un)healthy; new sessions start healthy
    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.shared.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub(crate) fn visits(&self) -> Vec<String> {
        self.visits_by_session().into_iter().map(|(_, url)| url).collect()
    }

    /// Visits paired with the serving session: 1 for the first created
    /// session, 2 for the next; 0 for sessions from `session()`
    pub(crate) fn visits_by_session(&self) -> Vec<(usize, String)> {
        self.shared.visits.lock().unwrap().clone()
    }

    pub(crate) fn created(&self) -> usize {
        self.shared.created.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn live(&self) -> usize {
        self.shared.live()
    }

    pub(crate) fn max_live(&self) -> usize {
        self.shared.max_live.load(Ordering::SeqCst)
    }

    /// A session on this factory's routes, without counting a create
    pub(crate) fn session(&self) -> ScriptedSession {
        self.session_numbered(0)
    }

    fn session_numbered(&self, id: usize) -> ScriptedSession {
        ScriptedSession {
            shared: Arc::clone(&self.shared),
            id,
            closed: false,
        }
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn create(&self) -> Result<Box<dyn Session>, SessionError> {
        if let Some(limit) = *self.shared.create_limit.lock().unwrap() {
            if self.created() >= limit {
                return Err(SessionError::Launch("scripted launch failure".to_string()));
            }
        }

        let id = self.shared.created.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.unhealthy.store(false, Ordering::SeqCst);
        self.shared.max_live.fetch_max(self.shared.live(), Ordering::SeqCst);
        Ok(Box::new(self.session_numbered(id)))
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

pub(crate) struct ScriptedSession {
    shared: Arc<Shared>,
    id: usize,
    closed: bool,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<LoadedPage, SessionError> {
        if self.closed {
            return Err(SessionError::Disconnected("closed".to_string()));
        }

        let key = url.to_string();
        self.shared.visits.lock().unwrap().push((self.id, key.clone()));
        let reply = self.shared.routes.lock().unwrap().get(&key).cloned();

        match reply {
            Some(Reply::Page(content)) => Ok(LoadedPage::new(url.clone(), url.clone(), content)),
            Some(Reply::Redirect(target, content)) => {
                let final_url = Url::parse(&target).map_err(|e| SessionError::Navigation(e.to_string()))?;
                Ok(LoadedPage::new(url.clone(), final_url, content))
            }
            Some(Reply::Timeout) => Err(SessionError::Timeout(timeout)),
            Some(Reply::Fail(message)) => Err(SessionError::Navigation(message)),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Panic(message)) => panic!("{}", message),
            None => Err(SessionError::Navigation(format!("no route for {}", key))),
        }
    }

    async fn is_healthy(&self) -> bool {
        !self.closed && !self.shared.unhealthy.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if !self.closed {
            self.closed = true;
            self.shared.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
