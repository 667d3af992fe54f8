//! Session lifecycle
//!
//! The manager holds at most one live session. A replacement is only
//! installed after the previous session has been closed.

use crate::session::{Session, SessionError, SessionFactory};
use crate::state::RestartReason;

/// Owns the active session and replaces it on demand
pub struct SessionManager {
    factory: Box<dyn SessionFactory>,
    session: Option<Box<dyn Session>>,
}

impl SessionManager {
    /// Creates the manager and its first session
    ///
    /// # Errors
    ///
    /// Returns the factory's error when the first session cannot be created.
    /// The caller treats this as fatal.
    pub async fn start(factory: Box<dyn SessionFactory>) -> Result<Self, SessionError> {
        tracing::info!("Starting {} session", factory.backend_name());
        let session = factory.create().await?;
        Ok(Self {
            factory,
            session: Some(session),
        })
    }

    /// The live session, if any
    pub fn session(&mut self) -> Option<&mut (dyn Session + 'static)> {
        self.session.as_deref_mut()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Closes the live session
    ///
    /// Never fails; close errors are only logged.
    pub async fn destroy(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::warn!("Error while closing session: {}", e);
            }
        }
    }

    /// Replaces the live session with a fresh one
    ///
    /// # Errors
    ///
    /// If the new session cannot be created the manager is left without a
    /// session and the error is returned.
    pub async fn restart(&mut self, reason: RestartReason) -> Result<(), SessionError> {
        tracing::info!("Restarting {} session ({})", self.factory.backend_name(), reason);
        self.destroy().await;
        let session = self.factory.create().await?;
        self.session = Some(session);
        Ok(())
    }

    /// Restarts the session if it reports itself unusable
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A restart was performed
    /// * `Ok(false)` - The session was healthy
    pub async fn ensure_healthy(&mut self) -> Result<bool, SessionError> {
        let healthy = match self.session.as_ref() {
            Some(session) => session.is_healthy().await,
            None => false,
        };
        if healthy {
            return Ok(false);
        }

        tracing::warn!("Session is not healthy");
        self.restart(RestartReason::Unhealthy).await?;
        Ok(true)
    }

    /// Closes the session at the end of a run
    pub async fn shutdown(&mut self) {
        if self.session.is_some() {
            tracing::info!("Closing {} session", self.factory.backend_name());
        }
        self.destroy().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::scripted::ScriptedFactory;

    #[tokio::test]
    async fn test_start_creates_one_session() {
        let factory = ScriptedFactory::new();
        let manager = SessionManager::start(Box::new(factory.clone())).await.unwrap();

        assert!(manager.is_active());
        assert_eq!(factory.created(), 1);
        assert_eq!(factory.live(), 1);
    }

    #[tokio::test]
    async fn test_start_failure() {
        let factory = ScriptedFactory::new().fail_creates_after(0);
        let result = SessionManager::start(Box::new(factory)).await;
        assert!(matches!(result, Err(SessionError::Launch(_))));
    }

    #[tokio::test]
    async fn test_restart_closes_before_creating() {
        let factory = ScriptedFactory::new();
        let mut manager = SessionManager::start(Box::new(factory.clone())).await.unwrap();

        manager.restart(RestartReason::Routine).await.unwrap();
        manager.restart(RestartReason::ConsecutiveErrors).await.unwrap();

        assert_eq!(factory.created(), 3);
        assert_eq!(factory.closed(), 2);
        assert_eq!(factory.max_live(), 1);
    }

    #[tokio::test]
    async fn test_failed_restart_leaves_no_session() {
        let factory = ScriptedFactory::new().fail_creates_after(1);
        let mut manager = SessionManager::start(Box::new(factory.clone())).await.unwrap();

        assert!(manager.restart(RestartReason::Routine).await.is_err());
        assert!(!manager.is_active());
        assert!(manager.session().is_none());
        assert_eq!(factory.live(), 0);
    }

    #[tokio::test]
    async fn test_ensure_healthy() {
        let factory = ScriptedFactory::new();
        let mut manager = SessionManager::start(Box::new(factory.clone())).await.unwrap();

        assert!(!manager.ensure_healthy().await.unwrap());

        factory.set_healthy(false);
        assert!(manager.ensure_healthy().await.unwrap());
        assert_eq!(factory.created(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let factory = ScriptedFactory::new();
        let mut manager = SessionManager::start(Box::new(factory.clone())).await.unwrap();

        manager.shutdown().await;
        manager.shutdown().await;
        assert_eq!(factory.closed(), 1);
        assert!(!manager.is_active());
    }
}
