use std::sync::Arc;

use portal_core::model::{Access, SessionRole};
use storage::repository::SessionRepository;

use crate::error::SessionServiceError;

/// Role-based gate in front of the two dashboards.
///
/// Signing in only records the chosen role; credentials are not checked.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
}

impl SessionService {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the marker cannot be written.
    pub async fn sign_in(&self, role: SessionRole) -> Result<(), SessionServiceError> {
        self.sessions.save_session(Some(role)).await?;
        tracing::info!(%role, "signed in");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the marker cannot be cleared.
    pub async fn sign_out(&self) -> Result<(), SessionServiceError> {
        self.sessions.save_session(None).await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the marker cannot be read.
    pub async fn current(&self) -> Result<Option<SessionRole>, SessionServiceError> {
        Ok(self.sessions.load_session().await?)
    }

    /// Decide whether the current session may open a dashboard for `required`.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the marker cannot be read.
    pub async fn authorize(&self, required: SessionRole) -> Result<Access, SessionServiceError> {
        let current = self.current().await?;
        let access = Access::check(current, required);
        if !access.is_granted() {
            tracing::debug!(?current, %required, "redirecting to login");
        }
        Ok(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;

    #[tokio::test]
    async fn dashboards_require_the_matching_role() {
        let service = SessionService::new(Storage::in_memory().sessions);
        assert_eq!(
            service.authorize(SessionRole::User).await.unwrap(),
            Access::RedirectToLogin
        );

        service.sign_in(SessionRole::User).await.unwrap();
        assert!(service.authorize(SessionRole::User).await.unwrap().is_granted());
        assert!(!service.authorize(SessionRole::Admin).await.unwrap().is_granted());

        service.sign_in(SessionRole::Admin).await.unwrap();
        assert_eq!(service.current().await.unwrap(), Some(SessionRole::Admin));

        service.sign_out().await.unwrap();
        assert_eq!(service.current().await.unwrap(), None);
        assert!(!service.authorize(SessionRole::Admin).await.unwrap().is_granted());
    }
}
