//! In-memory port implementations for tests.
//!
//! These mirror the behaviour the real adapters get from the database,
//! including the storage-level uniqueness guarantee on votes and the
//! first-login-wins user upsert, so services hit the same edge cases against
//! either backing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    AuthenticatedIdentity, CandidatePersistenceError, CandidateRepository, IdentityError,
    IdentityProvider, SessionPersistenceError, UserPersistenceError, UserRepository,
    VotePersistenceError, VoteRepository, VotingSessionRepository,
};
use crate::domain::ballot::{Vote, VoteRecord};
use crate::domain::candidate::{Candidate, CandidateId};
use crate::domain::user::{Role, User, UserId};
use crate::domain::voting_session::VotingSession;

/// In-memory session repository; starts closed.
#[derive(Debug)]
pub struct FixtureVotingSessionRepository {
    state: Mutex<VotingSession>,
}

impl FixtureVotingSessionRepository {
    /// Start from an explicit session state.
    pub fn with_state(session: VotingSession) -> Self {
        Self {
            state: Mutex::new(session),
        }
    }

    /// Start from an open window.
    pub fn open() -> Self {
        Self::with_state(VotingSession::closed().apply_transition(true, Utc::now()))
    }
}

impl Default for FixtureVotingSessionRepository {
    fn default() -> Self {
        Self::with_state(VotingSession::closed())
    }
}

#[async_trait]
impl VotingSessionRepository for FixtureVotingSessionRepository {
    async fn fetch(&self) -> Result<VotingSession, SessionPersistenceError> {
        Ok(*self.state.lock().expect("session fixture poisoned"))
    }

    async fn update(
        &self,
        session: VotingSession,
    ) -> Result<VotingSession, SessionPersistenceError> {
        let mut guard = self.state.lock().expect("session fixture poisoned");
        *guard = session;
        Ok(session)
    }
}

/// In-memory vote repository, enforcing user uniqueness the way the database
/// constraint does.
#[derive(Debug, Default)]
pub struct FixtureVoteRepository {
    votes: Mutex<HashMap<UserId, Vote>>,
}

impl FixtureVoteRepository {
    /// Seed the repository with existing votes.
    pub fn with_votes(votes: impl IntoIterator<Item = Vote>) -> Self {
        Self {
            votes: Mutex::new(votes.into_iter().map(|v| (v.user_id, v)).collect()),
        }
    }
}

#[async_trait]
impl VoteRepository for FixtureVoteRepository {
    async fn find_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vote>, VotePersistenceError> {
        let guard = self.votes.lock().expect("vote fixture poisoned");
        Ok(guard.get(user_id).copied())
    }

    async fn insert(&self, record: &VoteRecord) -> Result<Vote, VotePersistenceError> {
        let mut guard = self.votes.lock().expect("vote fixture poisoned");
        if guard.contains_key(&record.user_id) {
            return Err(VotePersistenceError::DuplicateVote);
        }
        let vote = Vote {
            id: Uuid::new_v4(),
            user_id: record.user_id,
            candidate_id: record.candidate_id,
            created_at: record.created_at,
        };
        guard.insert(vote.user_id, vote);
        Ok(vote)
    }

    async fn list(&self) -> Result<Vec<Vote>, VotePersistenceError> {
        let guard = self.votes.lock().expect("vote fixture poisoned");
        Ok(guard.values().copied().collect())
    }

    async fn count(&self) -> Result<u64, VotePersistenceError> {
        let guard = self.votes.lock().expect("vote fixture poisoned");
        Ok(guard.len() as u64)
    }
}

/// In-memory candidate roster.
#[derive(Debug, Default)]
pub struct FixtureCandidateRepository {
    candidates: Vec<Candidate>,
}

impl FixtureCandidateRepository {
    /// Seed the roster; callers should supply ascending `order_index`.
    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl CandidateRepository for FixtureCandidateRepository {
    async fn list(&self) -> Result<Vec<Candidate>, CandidatePersistenceError> {
        Ok(self.candidates.clone())
    }

    async fn exists(&self, id: &CandidateId) -> Result<bool, CandidatePersistenceError> {
        Ok(self.candidates.iter().any(|c| c.id == *id))
    }
}

/// In-memory user store.
#[derive(Debug, Default)]
pub struct FixtureUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl FixtureUserRepository {
    /// Seed the store with existing users.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: Mutex::new(users.into_iter().map(|u| (*u.id(), u)).collect()),
        }
    }
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let guard = self.users.lock().expect("user fixture poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn insert_if_absent(&self, user: &User) -> Result<User, UserPersistenceError> {
        let mut guard = self.users.lock().expect("user fixture poisoned");
        Ok(guard.entry(*user.id()).or_insert_with(|| user.clone()).clone())
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, UserPersistenceError> {
        let guard = self.users.lock().expect("user fixture poisoned");
        Ok(guard.values().filter(|u| u.role() == role).count() as u64)
    }
}

/// Deterministic identity provider: accepts [`Self::VALID_CODE`] only.
#[derive(Debug, Clone, Default)]
pub struct FixtureIdentityProvider;

impl FixtureIdentityProvider {
    /// The only authorisation code the fixture accepts.
    pub const VALID_CODE: &'static str = "fixture-code";
    /// Subject returned for the valid code.
    pub const SUBJECT: &'static str = "123e4567-e89b-12d3-a456-426614174000";
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<AuthenticatedIdentity, IdentityError> {
        if code == Self::VALID_CODE {
            let id = UserId::new(Self::SUBJECT)
                .map_err(|err| IdentityError::decode(format!("fixture subject: {err}")))?;
            Ok(AuthenticatedIdentity {
                id,
                email: "voter@example.org".to_owned(),
                full_name: Some("Fixture Voter".to_owned()),
            })
        } else {
            Err(IdentityError::rejected("unknown code"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn fixture_vote_repository_enforces_uniqueness() {
        let repo = FixtureVoteRepository::default();
        let record = VoteRecord {
            user_id: UserId::random(),
            candidate_id: CandidateId::random(),
            created_at: Utc::now(),
        };

        actix_rt::System::new().block_on(async move {
            repo.insert(&record).await.expect("first insert succeeds");
            let second = repo.insert(&record).await;
            assert_eq!(second, Err(VotePersistenceError::DuplicateVote));
            assert_eq!(repo.count().await.expect("count"), 1);
        });
    }

    #[rstest]
    fn fixture_user_repository_first_login_wins() {
        let id = UserId::random();
        let first = User::new(
            id,
            "first@example.org".to_owned(),
            "First".to_owned(),
            Role::User,
        );
        let second = User::new(
            id,
            "second@example.org".to_owned(),
            "Second".to_owned(),
            Role::Admin,
        );
        let repo = FixtureUserRepository::default();

        actix_rt::System::new().block_on(async move {
            repo.insert_if_absent(&first).await.expect("insert");
            let stored = repo.insert_if_absent(&second).await.expect("reinsert");
            assert_eq!(stored.email(), "first@example.org");
            assert_eq!(stored.role(), Role::User);
        });
    }

    #[rstest]
    fn fixture_identity_provider_rejects_unknown_codes() {
        actix_rt::System::new().block_on(async {
            let provider = FixtureIdentityProvider;
            let err = provider
                .exchange_code("wrong")
                .await
                .expect_err("unknown code rejected");
            assert!(matches!(err, IdentityError::Rejected { .. }));
        });
    }
}
