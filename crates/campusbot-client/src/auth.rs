//! Sign-in and registration.

use tracing::{info, warn};

use campusbot_core::error::{CampusError, Result};
use campusbot_core::session::SessionContext;
use campusbot_core::types::{Credentials, LoginReply, Registration, Role, Session};

use crate::api::ApiClient;

const LOGIN_FALLBACK: &str = "Account not found";
const REGISTER_FALLBACK: &str = "Registration failed";
const USER_EXISTS_CODE: &str = "user_exists";
const USER_EXISTS_TEXT: &str = "User already exists. Please login.";

/// Logs users in and out of a [`SessionContext`].
#[derive(Clone, Debug)]
pub struct Authenticator {
    api: ApiClient,
}

impl Authenticator {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Sign in with e-mail and password and store the session in `ctx`.
    pub async fn login(
        &self,
        ctx: &mut SessionContext,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        let credentials = Credentials::validated(email, password)?;
        let session = self.request_session(&credentials).await?;
        ctx.sign_in(session.clone())?;
        Ok(session)
    }

    /// Create an account, then sign in with it.
    ///
    /// Returns `None` when the account was created but the automatic
    /// sign-in did not succeed; the user has to log in manually.
    pub async fn register(
        &self,
        ctx: &mut SessionContext,
        form: Registration,
    ) -> Result<Option<Session>> {
        let form = form.validated()?;
        let request = self.api.post("/api/register", None).json(&form);
        match self.api.call(request, REGISTER_FALLBACK).await {
            Ok(_) => {}
            Err(CampusError::Server { status, message }) if message == USER_EXISTS_CODE => {
                return Err(CampusError::server(status, USER_EXISTS_TEXT));
            }
            Err(e) => return Err(e),
        }
        info!(email = %form.email, "Registered");

        let credentials = Credentials {
            email: form.email.clone(),
            password: form.password.clone(),
        };
        match self.request_session(&credentials).await {
            Ok(mut session) => {
                session.display_name = form.name.clone();
                ctx.sign_in(session.clone())?;
                Ok(Some(session))
            }
            Err(e) => {
                warn!(error = %e, "Automatic sign-in after registration failed");
                Ok(None)
            }
        }
    }

    /// Forget the stored session.
    pub fn logout(&self, ctx: &mut SessionContext) -> Result<()> {
        ctx.sign_out()
    }

    async fn request_session(&self, credentials: &Credentials) -> Result<Session> {
        let request = self.api.post("/api/login", None).json(credentials);
        let reply: LoginReply = self.api.call_as(request, LOGIN_FALLBACK).await?;
        let token = reply
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CampusError::Serialization("login reply has no token".into()))?;
        let role = reply
            .role
            .as_deref()
            .map(Role::from_server)
            .unwrap_or_default();
        let display_name = reply
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| credentials.email.clone());
        Ok(Session {
            user_key: credentials.email.clone(),
            display_name,
            role,
            token,
        })
    }
}
