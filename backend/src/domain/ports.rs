//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (database, identity provider, change-notification fan-out). Each trait
//! exposes strongly typed errors so adapters map their failures into
//! predictable variants instead of returning `anyhow::Result`.
//!
//! In-memory test doubles for every port live in the `fixtures` submodule and
//! are re-exported here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::ballot::{Vote, VoteRecord};
use super::candidate::{Candidate, CandidateId};
use super::user::{Role, User, UserId};
use super::voting_session::VotingSession;

mod fixtures;

pub use fixtures::{
    FixtureCandidateRepository, FixtureIdentityProvider, FixtureUserRepository,
    FixtureVoteRepository, FixtureVotingSessionRepository,
};

/// Persistence errors raised by [`VotingSessionRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SessionPersistenceError {
    /// Repository connection could not be established.
    #[error("voting session store connection failed: {message}")]
    Connection {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// The singleton session row is missing.
    #[error("voting session row not found")]
    Missing,
    /// Query or mutation failed during execution.
    #[error("voting session query failed: {message}")]
    Query {
        /// Adapter-supplied diagnostic.
        message: String,
    },
}

impl SessionPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`VoteRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum VotePersistenceError {
    /// Repository connection could not be established.
    #[error("vote store connection failed: {message}")]
    Connection {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// The unique constraint on `votes.user_id` rejected the insert. This is
    /// the storage half of the one-vote-per-user invariant; callers map it to
    /// the same outcome as a failed pre-check.
    #[error("user has already voted")]
    DuplicateVote,
    /// Query or mutation failed during execution.
    #[error("vote store query failed: {message}")]
    Query {
        /// Adapter-supplied diagnostic.
        message: String,
    },
}

impl VotePersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`CandidateRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CandidatePersistenceError {
    /// Repository connection could not be established.
    #[error("candidate store connection failed: {message}")]
    Connection {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// Query failed during execution.
    #[error("candidate store query failed: {message}")]
    Query {
        /// Adapter-supplied diagnostic.
        message: String,
    },
}

impl CandidatePersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`UserRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user store connection failed: {message}")]
    Connection {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query {
        /// Adapter-supplied diagnostic.
        message: String,
    },
}

impl UserPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Failures raised by [`IdentityProvider`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum IdentityError {
    /// The provider rejected the authorisation code.
    #[error("authorisation code rejected: {message}")]
    Rejected {
        /// Provider-supplied diagnostic.
        message: String,
    },
    /// Transport-level failure reaching the provider.
    #[error("identity provider unreachable: {message}")]
    Transport {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// The provider response could not be decoded.
    #[error("identity provider response invalid: {message}")]
    Decode {
        /// Adapter-supplied diagnostic.
        message: String,
    },
}

impl IdentityError {
    /// Helper for provider rejections.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Helper for transport failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for decode failures.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Table a change event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    /// The singleton voting-window record.
    VotingStatus,
    /// The candidate read model.
    Candidates,
    /// The vote set.
    Votes,
}

/// Operation a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
}

/// A coarse change notification: consumers re-fetch rather than apply deltas.
///
/// Delivery is at-least-once with no ordering guarantee; the payload
/// deliberately carries no row data so a dropped or reordered event can never
/// leave a consumer with stale state beyond its next re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Originating table.
    pub table: ChangeTable,
    /// Kind of mutation.
    pub op: ChangeOp,
}

/// Persistence port for the singleton voting session.
#[async_trait]
pub trait VotingSessionRepository: Send + Sync {
    /// Fetch the session record.
    async fn fetch(&self) -> Result<VotingSession, SessionPersistenceError>;

    /// Replace the session record with the supplied state.
    async fn update(&self, session: VotingSession)
    -> Result<VotingSession, SessionPersistenceError>;
}

/// Persistence port for votes.
///
/// Implementations MUST enforce uniqueness of `user_id` atomically at insert
/// time and surface a violation as [`VotePersistenceError::DuplicateVote`];
/// two racing submissions may both pass the in-process pre-check.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Fetch the caller's existing vote, if any.
    async fn find_for_user(&self, user_id: &UserId)
    -> Result<Option<Vote>, VotePersistenceError>;

    /// Persist an accepted vote. Conditional on no existing vote for the same
    /// user; the conflict maps to [`VotePersistenceError::DuplicateVote`].
    async fn insert(&self, record: &VoteRecord) -> Result<Vote, VotePersistenceError>;

    /// All votes, for tallying.
    async fn list(&self) -> Result<Vec<Vote>, VotePersistenceError>;

    /// Total number of votes.
    async fn count(&self) -> Result<u64, VotePersistenceError>;
}

/// Read-only port for the candidate roster.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// All candidates ordered by `order_index` ascending.
    async fn list(&self) -> Result<Vec<Candidate>, CandidatePersistenceError>;

    /// True when a candidate with the given id exists.
    async fn exists(&self, id: &CandidateId) -> Result<bool, CandidatePersistenceError>;
}

/// Persistence port for user aggregates.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Insert the user unless a row with the same id exists; returns the
    /// stored row either way. First login wins; later logins never mutate.
    async fn insert_if_absent(&self, user: &User) -> Result<User, UserPersistenceError>;

    /// Number of users holding the given role.
    async fn count_by_role(&self, role: Role) -> Result<u64, UserPersistenceError>;
}

/// Identity asserted by the provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Provider subject, reused as the user id.
    pub id: UserId,
    /// Verified email address.
    pub email: String,
    /// Full name from provider metadata, when present.
    pub full_name: Option<String>,
}

/// Port to the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorisation code for the caller's identity.
    async fn exchange_code(&self, code: &str) -> Result<AuthenticatedIdentity, IdentityError>;
}

/// Fan-out port for change notifications.
///
/// Publishing is fire-and-forget: a notifier with no subscribers is not an
/// error, and a slow subscriber must never block a mutation.
pub trait ChangeNotifier: Send + Sync {
    /// Publish one change event.
    fn publish(&self, event: ChangeEvent);
}

/// No-op notifier for contexts without subscribers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpChangeNotifier;

impl ChangeNotifier for NoOpChangeNotifier {
    fn publish(&self, _event: ChangeEvent) {}
}
