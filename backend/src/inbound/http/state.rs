//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use crate::domain::{AuthService, ResultsReporter, VoteSubmissionService, VotingStatusService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Login-callback orchestration.
    pub auth: AuthService,
    /// Voting-window reads and transitions.
    pub voting_status: VotingStatusService,
    /// Vote eligibility and persistence.
    pub submission: VoteSubmissionService,
    /// Results and admin statistics projections.
    pub reporting: ResultsReporter,
}

impl HttpState {
    /// Bundle the services handlers depend on.
    pub fn new(
        auth: AuthService,
        voting_status: VotingStatusService,
        submission: VoteSubmissionService,
        reporting: ResultsReporter,
    ) -> Self {
        Self {
            auth,
            voting_status,
            submission,
            reporting,
        }
    }
}
