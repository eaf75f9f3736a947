//! Typed access to the login session.
//!
//! Handlers never touch `actix_session` directly: the extractor below narrows
//! the cookie session to the one value this backend stores, the authenticated
//! user's id, and maps session failures onto the domain error type.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

/// Session entry under which the user id is stored.
pub(crate) const USER_ID_KEY: &str = "user_id";

/// The caller's login session, narrowed to domain operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap a raw cookie session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record a successful login in the session cookie.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("session write failed: {error}")))
    }

    /// The logged-in user's id, when the cookie holds a valid one.
    ///
    /// A cookie that decrypts but carries a malformed id reads as an
    /// anonymous caller; the stored value is ignored with a warning rather
    /// than failing the request.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let stored = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("session read failed: {error}")))?;
        let Some(raw) = stored else {
            return Ok(None);
        };
        match UserId::new(raw) {
            Ok(id) => Ok(Some(id)),
            Err(error) => {
                warn!(%error, "ignoring session with malformed user id");
                Ok(None)
            }
        }
    }

    /// The logged-in user's id, or `401 Unauthorized` for anonymous callers.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop the session entirely, invalidating the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
