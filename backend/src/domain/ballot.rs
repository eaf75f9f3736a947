//! Eligibility engine: may this user vote, and what record results?
//!
//! These functions are pure and synchronous. Persistence and the storage-level
//! uniqueness guarantee live behind [`crate::domain::ports::VoteRepository`];
//! callers must map a storage conflict to [`VoteError::AlreadyVoted`] so a
//! lost race is indistinguishable from a failed pre-check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;
use uuid::Uuid;

use super::candidate::CandidateId;
use super::error::Error;
use super::user::UserId;
use super::voting_session::VotingSession;

/// A persisted vote. Immutable and permanent once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Vote {
    /// Storage-assigned identifier.
    #[schema(value_type = String)]
    pub id: Uuid,
    /// The voter; unique across all votes.
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// The chosen candidate.
    #[schema(value_type = String)]
    pub candidate_id: CandidateId,
    /// When the vote was accepted.
    pub created_at: DateTime<Utc>,
}

/// A vote accepted by the engine but not yet persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRecord {
    /// The voter.
    pub user_id: UserId,
    /// The chosen candidate.
    pub candidate_id: CandidateId,
    /// When the engine accepted the vote.
    pub created_at: DateTime<Utc>,
}

/// Reasons the engine refuses a vote, in precondition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum VoteError {
    /// The voting window is closed.
    #[error("voting is not open")]
    VotingClosed,
    /// The user has already cast a vote.
    #[error("user has already voted")]
    AlreadyVoted,
    /// The referenced candidate does not exist.
    #[error("invalid candidate")]
    InvalidCandidate,
}

impl From<VoteError> for Error {
    fn from(value: VoteError) -> Self {
        match value {
            VoteError::VotingClosed => Self::voting_closed(),
            VoteError::AlreadyVoted => Self::already_voted(),
            VoteError::InvalidCandidate => Self::invalid_candidate(),
        }
    }
}

/// True iff the session is open and the user has not voted.
///
/// # Examples
/// ```
/// use backend::domain::{VotingSession, can_vote};
/// use chrono::Utc;
///
/// let open = VotingSession::closed().apply_transition(true, Utc::now());
/// assert!(can_vote(&open, None));
/// ```
#[must_use]
pub const fn can_vote(session: &VotingSession, existing_vote: Option<&Vote>) -> bool {
    session.is_open && existing_vote.is_none()
}

/// Check all submission preconditions and produce the record to persist.
///
/// Preconditions are checked in order and short-circuit on the first failure:
/// the window must be open, the user must not have voted, and the candidate
/// must exist. The returned [`VoteRecord`] is not persisted here.
pub const fn submit_vote(
    session: &VotingSession,
    existing_vote: Option<&Vote>,
    user_id: UserId,
    candidate_id: CandidateId,
    candidate_exists: bool,
    now: DateTime<Utc>,
) -> Result<VoteRecord, VoteError> {
    if !session.is_open {
        return Err(VoteError::VotingClosed);
    }
    if existing_vote.is_some() {
        return Err(VoteError::AlreadyVoted);
    }
    if !candidate_exists {
        return Err(VoteError::InvalidCandidate);
    }
    Ok(VoteRecord {
        user_id,
        candidate_id,
        created_at: now,
    })
}
