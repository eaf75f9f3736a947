//! Authentication callback orchestration.
//!
//! The identity provider owns credentials; this service only exchanges the
//! callback code for a verified identity and materialises a local user row.
//! First login creates the row with role `user`; subsequent logins never
//! mutate it, so an out-of-band promotion to admin sticks.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::Error;
use super::ports::{IdentityError, IdentityProvider, UserRepository};
use super::user::{self, Role, User};

/// Exchanges authorisation codes and materialises local users.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    /// Wire the service to its ports.
    pub fn new(identity: Arc<dyn IdentityProvider>, users: Arc<dyn UserRepository>) -> Self {
        Self { identity, users }
    }

    /// Complete a login: exchange the code, then create-or-load the user.
    ///
    /// The returned [`User`] carries the stored role, which drives the
    /// post-login redirect.
    pub async fn callback(&self, code: &str) -> Result<User, Error> {
        let identity = self.identity.exchange_code(code).await.map_err(|err| {
            warn!(error = %err, "authorisation code exchange failed");
            match err {
                IdentityError::Rejected { .. } => Error::unauthorized("Authentication failed"),
                other => Error::internal(format!("identity provider: {other}")),
            }
        })?;
        let full_name = identity
            .full_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user::name_from_email(&identity.email));
        let candidate_user = User::new(identity.id, identity.email, full_name, Role::User);
        let stored = self
            .users
            .insert_if_absent(&candidate_user)
            .await
            .map_err(|err| Error::internal(format!("user store: {err}")))?;
        info!(user_id = %stored.id(), role = %stored.role(), "login completed");
        Ok(stored)
    }

    /// Load the stored user behind a session, if it still exists.
    pub async fn user_by_id(
        &self,
        id: &super::user::UserId,
    ) -> Result<Option<User>, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(|err| Error::internal(format!("user store: {err}")))
    }
}
