//! Results and statistics projections.
//!
//! Reads are taken from the live stores on every call; nothing is cached, so
//! results consumers re-polling after a change notification always observe the
//! latest accepted votes.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::error::Error;
use super::ports::{
    CandidatePersistenceError, CandidateRepository, SessionPersistenceError, UserPersistenceError,
    UserRepository, VotePersistenceError, VoteRepository, VotingSessionRepository,
};
use super::tally::{self, TallyReport};
use super::user::Role;
use super::voting_session::VotingSession;

/// Admin dashboard snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    /// Current window state.
    pub voting_status: VotingSession,
    /// Number of accepted votes.
    pub total_votes: u64,
    /// Number of eligible voters (role `user`; admins excluded).
    pub total_users: u64,
    /// Rounded percentage of eligible voters who have voted.
    pub participation_rate: u32,
}

/// Read-side service deriving results and statistics.
#[derive(Clone)]
pub struct ResultsReporter {
    sessions: Arc<dyn VotingSessionRepository>,
    votes: Arc<dyn VoteRepository>,
    candidates: Arc<dyn CandidateRepository>,
    users: Arc<dyn UserRepository>,
}

impl ResultsReporter {
    /// Wire the reporter to its ports.
    pub fn new(
        sessions: Arc<dyn VotingSessionRepository>,
        votes: Arc<dyn VoteRepository>,
        candidates: Arc<dyn CandidateRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            sessions,
            votes,
            candidates,
            users,
        }
    }

    /// Current per-candidate results, visible regardless of window state.
    pub async fn results(&self) -> Result<TallyReport, Error> {
        let candidates = self
            .candidates
            .list()
            .await
            .map_err(|err| candidate_error("list candidates", &err))?;
        let votes = self
            .votes
            .list()
            .await
            .map_err(|err| vote_error("list votes", &err))?;
        Ok(tally::tally(&candidates, &votes))
    }

    /// Aggregate statistics for the admin dashboard.
    pub async fn admin_stats(&self) -> Result<AdminStats, Error> {
        let voting_status = self
            .sessions
            .fetch()
            .await
            .map_err(|err| session_error("load voting session", &err))?;
        let total_votes = self
            .votes
            .count()
            .await
            .map_err(|err| vote_error("count votes", &err))?;
        let total_users = self
            .users
            .count_by_role(Role::User)
            .await
            .map_err(|err| user_error("count users", &err))?;
        Ok(AdminStats {
            voting_status,
            total_votes,
            total_users,
            participation_rate: tally::participation_rate(total_votes, total_users),
        })
    }
}

fn session_error(context: &str, err: &SessionPersistenceError) -> Error {
    Error::internal(format!("{context}: {err}"))
}

fn vote_error(context: &str, err: &VotePersistenceError) -> Error {
    Error::internal(format!("{context}: {err}"))
}

fn candidate_error(context: &str, err: &CandidatePersistenceError) -> Error {
    Error::internal(format!("{context}: {err}"))
}

fn user_error(context: &str, err: &UserPersistenceError) -> Error {
    Error::internal(format!("{context}: {err}"))
}
