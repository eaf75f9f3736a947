//! Vote submission orchestration.
//!
//! Pulls the session, the caller's prior vote, and candidate existence from
//! their ports, runs the pure eligibility checks, and persists the accepted
//! record. The storage uniqueness constraint is the last line of defence: a
//! duplicate-key conflict surfaces as the same outcome as a failed pre-check.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::ballot::{self, Vote, VoteError};
use super::candidate::CandidateId;
use super::error::Error;
use super::ports::{
    CandidatePersistenceError, CandidateRepository, ChangeEvent, ChangeNotifier, ChangeOp,
    ChangeTable, SessionPersistenceError, VotePersistenceError, VoteRepository,
    VotingSessionRepository,
};
use super::user::UserId;

/// Orchestrates eligibility checks and vote persistence.
#[derive(Clone)]
pub struct VoteSubmissionService {
    sessions: Arc<dyn VotingSessionRepository>,
    votes: Arc<dyn VoteRepository>,
    candidates: Arc<dyn CandidateRepository>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl VoteSubmissionService {
    /// Wire the service to its ports.
    pub fn new(
        sessions: Arc<dyn VotingSessionRepository>,
        votes: Arc<dyn VoteRepository>,
        candidates: Arc<dyn CandidateRepository>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            sessions,
            votes,
            candidates,
            notifier,
        }
    }

    /// Run every submission precondition without persisting anything.
    ///
    /// Fails with the first unmet precondition, in the same order a real
    /// submission would.
    pub async fn validate(
        &self,
        user_id: UserId,
        candidate_id: CandidateId,
    ) -> Result<(), Error> {
        self.check_preconditions(user_id, candidate_id).await?;
        Ok(())
    }

    /// Accept and persist a vote for the caller.
    pub async fn submit(
        &self,
        user_id: UserId,
        candidate_id: CandidateId,
    ) -> Result<Vote, Error> {
        let record = self.check_preconditions(user_id, candidate_id).await?;
        let vote = self.votes.insert(&record).await.map_err(|err| match err {
            VotePersistenceError::DuplicateVote => {
                // Lost a race with a concurrent submission by the same user.
                debug!(user_id = %user_id, "duplicate vote rejected by storage");
                Error::already_voted()
            }
            other => storage_error("persist vote", &other),
        })?;
        info!(user_id = %user_id, candidate_id = %candidate_id, "vote recorded");
        self.notifier.publish(ChangeEvent {
            table: ChangeTable::Votes,
            op: ChangeOp::Insert,
        });
        Ok(vote)
    }

    /// The caller's existing vote, if any.
    pub async fn find_vote(&self, user_id: UserId) -> Result<Option<Vote>, Error> {
        self.votes
            .find_for_user(&user_id)
            .await
            .map_err(|err| storage_error("load vote", &err))
    }

    async fn check_preconditions(
        &self,
        user_id: UserId,
        candidate_id: CandidateId,
    ) -> Result<ballot::VoteRecord, Error> {
        let session = self
            .sessions
            .fetch()
            .await
            .map_err(|err| session_error("load voting session", &err))?;
        // Order matters: the window check must run before the candidate
        // lookup so a closed window is never reported as a bad candidate.
        if !session.is_open {
            return Err(VoteError::VotingClosed.into());
        }
        let existing = self
            .votes
            .find_for_user(&user_id)
            .await
            .map_err(|err| storage_error("load vote", &err))?;
        if existing.is_some() {
            return Err(VoteError::AlreadyVoted.into());
        }
        let candidate_exists = self
            .candidates
            .exists(&candidate_id)
            .await
            .map_err(|err| candidate_error("check candidate", &err))?;
        ballot::submit_vote(
            &session,
            existing.as_ref(),
            user_id,
            candidate_id,
            candidate_exists,
            Utc::now(),
        )
        .map_err(Error::from)
    }
}

fn session_error(context: &str, err: &SessionPersistenceError) -> Error {
    Error::internal(format!("{context}: {err}"))
}

fn storage_error(context: &str, err: &VotePersistenceError) -> Error {
    Error::internal(format!("{context}: {err}"))
}

fn candidate_error(context: &str, err: &CandidatePersistenceError) -> Error {
    Error::internal(format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::Candidate;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{
        FixtureCandidateRepository, FixtureVoteRepository, FixtureVotingSessionRepository,
        NoOpChangeNotifier,
    };
    use rstest::{fixture, rstest};

    fn candidate(order_index: i32) -> Candidate {
        Candidate {
            id: CandidateId::random(),
            name: format!("Candidate {order_index}"),
            party_name: "Party".to_owned(),
            is_independent: false,
            description: String::new(),
            order_index,
        }
    }

    fn service(
        sessions: FixtureVotingSessionRepository,
        votes: FixtureVoteRepository,
        roster: Vec<Candidate>,
    ) -> VoteSubmissionService {
        VoteSubmissionService::new(
            Arc::new(sessions),
            Arc::new(votes),
            Arc::new(FixtureCandidateRepository::with_candidates(roster)),
            Arc::new(NoOpChangeNotifier),
        )
    }

    #[fixture]
    fn voter() -> UserId {
        UserId::random()
    }

    #[rstest]
    fn submit_persists_and_returns_vote(voter: UserId) {
        let chosen = candidate(1);
        let chosen_id = chosen.id;
        let svc = service(
            FixtureVotingSessionRepository::open(),
            FixtureVoteRepository::default(),
            vec![chosen],
        );

        actix_rt::System::new().block_on(async move {
            let vote = svc.submit(voter, chosen_id).await.expect("vote accepted");
            assert_eq!(vote.user_id, voter);
            assert_eq!(vote.candidate_id, chosen_id);
            let found = svc.find_vote(voter).await.expect("lookup succeeds");
            assert_eq!(found.map(|v| v.id), Some(vote.id));
        });
    }

    #[rstest]
    fn closed_window_rejects_before_candidate_check(voter: UserId) {
        let svc = service(
            FixtureVotingSessionRepository::default(),
            FixtureVoteRepository::default(),
            Vec::new(),
        );

        actix_rt::System::new().block_on(async move {
            let err = svc
                .submit(voter, CandidateId::random())
                .await
                .expect_err("closed window rejects");
            assert_eq!(err.code, ErrorCode::VotingClosed);
        });
    }

    #[rstest]
    fn second_submission_is_already_voted(voter: UserId) {
        let chosen = candidate(1);
        let other = candidate(2);
        let (chosen_id, other_id) = (chosen.id, other.id);
        let svc = service(
            FixtureVotingSessionRepository::open(),
            FixtureVoteRepository::default(),
            vec![chosen, other],
        );

        actix_rt::System::new().block_on(async move {
            svc.submit(voter, chosen_id).await.expect("first accepted");
            let err = svc
                .submit(voter, other_id)
                .await
                .expect_err("second rejected");
            assert_eq!(err.code, ErrorCode::AlreadyVoted);
        });
    }

    /// Vote store whose pre-check sees no vote but whose insert hits the
    /// uniqueness constraint, as when two submissions race.
    struct RacingVoteRepository;

    #[async_trait::async_trait]
    impl crate::domain::ports::VoteRepository for RacingVoteRepository {
        async fn find_for_user(
            &self,
            _user_id: &UserId,
        ) -> Result<Option<Vote>, VotePersistenceError> {
            Ok(None)
        }

        async fn insert(
            &self,
            _record: &ballot::VoteRecord,
        ) -> Result<Vote, VotePersistenceError> {
            Err(VotePersistenceError::DuplicateVote)
        }

        async fn list(&self) -> Result<Vec<Vote>, VotePersistenceError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<u64, VotePersistenceError> {
            Ok(0)
        }
    }

    #[rstest]
    fn lost_insert_race_reports_already_voted(voter: UserId) {
        let chosen = candidate(1);
        let chosen_id = chosen.id;
        let svc = VoteSubmissionService::new(
            Arc::new(FixtureVotingSessionRepository::open()),
            Arc::new(RacingVoteRepository),
            Arc::new(FixtureCandidateRepository::with_candidates(vec![chosen])),
            Arc::new(NoOpChangeNotifier),
        );

        actix_rt::System::new().block_on(async move {
            let err = svc
                .submit(voter, chosen_id)
                .await
                .expect_err("storage conflict rejected");
            assert_eq!(err.code, ErrorCode::AlreadyVoted);
        });
    }

    #[rstest]
    fn unknown_candidate_is_rejected(voter: UserId) {
        let svc = service(
            FixtureVotingSessionRepository::open(),
            FixtureVoteRepository::default(),
            vec![candidate(1)],
        );

        actix_rt::System::new().block_on(async move {
            let err = svc
                .submit(voter, CandidateId::random())
                .await
                .expect_err("unknown candidate rejected");
            assert_eq!(err.code, ErrorCode::InvalidCandidate);
        });
    }

    #[rstest]
    fn validate_checks_without_persisting(voter: UserId) {
        let chosen = candidate(1);
        let chosen_id = chosen.id;
        let svc = service(
            FixtureVotingSessionRepository::open(),
            FixtureVoteRepository::default(),
            vec![chosen],
        );

        actix_rt::System::new().block_on(async move {
            svc.validate(voter, chosen_id).await.expect("valid");
            assert!(svc.find_vote(voter).await.expect("lookup").is_none());
        });
    }
}
