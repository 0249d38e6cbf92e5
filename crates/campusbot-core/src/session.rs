//! Explicit session context handed to every component that needs to know
//! who is signed in.

use tracing::info;

use crate::error::Result;
use crate::store::LocalStore;
use crate::types::{Role, Session, GUEST_DISPLAY_NAME, GUEST_USER_KEY};

/// The current session plus the local store it is persisted in.
#[derive(Debug)]
pub struct SessionContext {
    store: LocalStore,
}

impl SessionContext {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// A context with no persistence and nobody signed in.
    pub fn ephemeral() -> Self {
        Self::new(LocalStore::in_memory())
    }

    pub fn session(&self) -> Option<&Session> {
        self.store.state().session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session().is_some()
    }

    /// Key under which history is stored server-side.
    pub fn user_key(&self) -> &str {
        self.session()
            .map(|s| s.user_key.as_str())
            .unwrap_or(GUEST_USER_KEY)
    }

    pub fn display_name(&self) -> &str {
        self.session()
            .map(|s| s.display_name.as_str())
            .unwrap_or(GUEST_DISPLAY_NAME)
    }

    pub fn role(&self) -> Role {
        self.session().map(|s| s.role).unwrap_or_default()
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|s| s.token.as_str())
    }

    pub fn sign_in(&mut self, session: Session) -> Result<()> {
        info!(user = %session.user_key, role = %session.role, "Signed in");
        self.store.update(|s| s.session = Some(session))
    }

    /// Forget the session. Remembered suggestions are kept.
    pub fn sign_out(&mut self) -> Result<()> {
        if let Some(session) = self.session() {
            info!(user = %session.user_key, "Signed out");
        }
        self.store.update(|s| s.session = None)
    }

    pub fn suggestions(&self) -> &[String] {
        &self.store.state().suggestions
    }

    pub fn save_suggestions(&mut self, suggestions: Vec<String>) -> Result<()> {
        self.store.update(|s| s.suggestions = suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Session {
        Session {
            user_key: "admin1@mmec.edu".into(),
            display_name: "Registrar".into(),
            role: Role::Admin,
            token: "secret-token".into(),
        }
    }

    #[test]
    fn test_guest_defaults() {
        let ctx = SessionContext::ephemeral();
        assert!(!ctx.is_signed_in());
        assert_eq!(ctx.user_key(), "guest");
        assert_eq!(ctx.display_name(), "Guest");
        assert_eq!(ctx.role(), Role::Student);
        assert!(ctx.token().is_none());
    }

    #[test]
    fn test_sign_in_and_out() {
        let mut ctx = SessionContext::ephemeral();
        ctx.sign_in(admin()).unwrap();
        assert_eq!(ctx.user_key(), "admin1@mmec.edu");
        assert_eq!(ctx.role(), Role::Admin);
        assert_eq!(ctx.token(), Some("secret-token"));

        ctx.save_suggestions(vec!["fees".into()]).unwrap();
        ctx.sign_out().unwrap();
        assert!(ctx.token().is_none());
        assert_eq!(ctx.role(), Role::Student);
        assert_eq!(ctx.suggestions(), &["fees".to_string()]);
    }

    #[test]
    fn test_sign_out_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut ctx = SessionContext::new(LocalStore::open(&path));
        ctx.sign_in(admin()).unwrap();
        ctx.sign_out().unwrap();

        let reopened = SessionContext::new(LocalStore::open(&path));
        assert!(!reopened.is_signed_in());
    }
}
