//! Core domain for the voting engine.
//!
//! The hexagon's centre: pure state machines and projections (session
//! transitions, eligibility, tallying) plus the services orchestrating them
//! over ports. Nothing in here knows about HTTP, diesel, or WebSockets.

pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod error;
pub mod ports;
pub mod reporting;
pub mod status;
pub mod submission;
pub mod tally;
pub mod user;
pub mod voting_session;

pub use auth::AuthService;
pub use ballot::{Vote, VoteError, VoteRecord, can_vote, submit_vote};
pub use candidate::{Candidate, CandidateId};
pub use error::{Error, ErrorCode};
pub use ports::{
    AuthenticatedIdentity, CandidateRepository, ChangeEvent, ChangeNotifier, ChangeOp,
    ChangeTable, IdentityProvider, UserRepository, VoteRepository, VotingSessionRepository,
};
pub use reporting::{AdminStats, ResultsReporter};
pub use status::VotingStatusService;
pub use submission::VoteSubmissionService;
pub use tally::{CandidateResult, TallyReport, participation_rate, tally};
pub use user::{Role, User, UserId};
pub use voting_session::VotingSession;
