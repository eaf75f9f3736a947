//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::ports::{
    FixtureCandidateRepository, FixtureIdentityProvider, FixtureUserRepository,
    FixtureVoteRepository, FixtureVotingSessionRepository, NoOpChangeNotifier,
};
use crate::domain::{
    AuthService, Candidate, CandidateId, ResultsReporter, Role, User, UserId,
    VoteSubmissionService, VotingStatusService,
};
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Fixture-backed service graph with the repositories still accessible, so
/// tests can seed data and assert on persisted state.
pub struct FixtureBackend {
    pub sessions: Arc<FixtureVotingSessionRepository>,
    pub votes: Arc<FixtureVoteRepository>,
    pub candidates: Arc<FixtureCandidateRepository>,
    pub users: Arc<FixtureUserRepository>,
}

impl FixtureBackend {
    /// A closed window, no candidates, no users.
    pub fn new() -> Self {
        Self::with_parts(
            FixtureVotingSessionRepository::default(),
            Vec::new(),
            Vec::new(),
        )
    }

    /// Assemble from explicit seeds.
    pub fn with_parts(
        sessions: FixtureVotingSessionRepository,
        candidates: Vec<Candidate>,
        users: Vec<User>,
    ) -> Self {
        Self {
            sessions: Arc::new(sessions),
            votes: Arc::new(FixtureVoteRepository::default()),
            candidates: Arc::new(FixtureCandidateRepository::with_candidates(candidates)),
            users: Arc::new(FixtureUserRepository::with_users(users)),
        }
    }

    /// Wire the fixtures into handler state.
    pub fn state(&self) -> HttpState {
        let notifier = Arc::new(NoOpChangeNotifier);
        HttpState::new(
            AuthService::new(Arc::new(FixtureIdentityProvider), self.users.clone()),
            VotingStatusService::new(self.sessions.clone(), notifier.clone()),
            VoteSubmissionService::new(
                self.sessions.clone(),
                self.votes.clone(),
                self.candidates.clone(),
                notifier,
            ),
            ResultsReporter::new(
                self.sessions.clone(),
                self.votes.clone(),
                self.candidates.clone(),
                self.users.clone(),
            ),
        )
    }
}

impl Default for FixtureBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// The user id asserted by [`FixtureIdentityProvider`].
pub fn fixture_user_id() -> UserId {
    UserId::new(FixtureIdentityProvider::SUBJECT).expect("fixture subject is a valid UUID")
}

/// The user [`FixtureIdentityProvider`] logs in, with the given role. Seed it
/// before the callback to control the role the login resolves to.
pub fn fixture_user(role: Role) -> User {
    User::new(
        fixture_user_id(),
        "voter@example.org".to_owned(),
        "Fixture Voter".to_owned(),
        role,
    )
}

/// A candidate with deterministic display fields.
pub fn fixture_candidate(name: &str, order_index: i32) -> Candidate {
    Candidate {
        id: CandidateId::random(),
        name: name.to_owned(),
        party_name: format!("{name} Party"),
        is_independent: false,
        description: format!("{name} stands for testing"),
        order_index,
    }
}
