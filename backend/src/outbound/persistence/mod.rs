//! PostgreSQL persistence adapters built on Diesel and `diesel-async`.

pub mod diesel_candidate_repository;
pub mod diesel_user_repository;
pub mod diesel_vote_repository;
pub mod diesel_voting_session_repository;
pub(crate) mod models;
pub mod pool;
pub mod schema;

pub use diesel_candidate_repository::DieselCandidateRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use diesel_vote_repository::DieselVoteRepository;
pub use diesel_voting_session_repository::DieselVotingSessionRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
