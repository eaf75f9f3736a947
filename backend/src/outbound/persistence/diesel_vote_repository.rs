//! PostgreSQL-backed `VoteRepository` implementation using Diesel ORM.
//!
//! The UNIQUE constraint on `votes.user_id` is the authoritative guard
//! against double voting: two racing submissions can both pass the service's
//! pre-check, but only one insert commits. The loser's `UniqueViolation`
//! surfaces as [`VotePersistenceError::DuplicateVote`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{VotePersistenceError, VoteRepository};
use crate::domain::{CandidateId, UserId, Vote, VoteRecord};

use super::models::{NewVoteRow, VoteRow};
use super::pool::{DbPool, PoolError};
use super::schema::votes;

/// Diesel-backed implementation of the `VoteRepository` port.
#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> VotePersistenceError {
    match error {
        PoolError::Unavailable { message } | PoolError::Setup { message } => {
            VotePersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> VotePersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            VotePersistenceError::DuplicateVote
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            VotePersistenceError::connection("database connection error")
        }
        _ => VotePersistenceError::query("database error"),
    }
}

fn row_to_vote(row: VoteRow) -> Vote {
    Vote {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        candidate_id: CandidateId::from_uuid(row.candidate_id),
        created_at: row.created_at,
    }
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn find_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vote>, VotePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<VoteRow> = votes::table
            .filter(votes::user_id.eq(user_id.as_uuid()))
            .select(VoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_vote))
    }

    async fn insert(&self, record: &VoteRecord) -> Result<Vote, VotePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewVoteRow {
            id: Uuid::new_v4(),
            user_id: *record.user_id.as_uuid(),
            candidate_id: *record.candidate_id.as_uuid(),
            created_at: record.created_at,
        };

        let row: VoteRow = diesel::insert_into(votes::table)
            .values(&new_row)
            .returning(VoteRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row_to_vote(row))
    }

    async fn list(&self) -> Result<Vec<Vote>, VotePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<VoteRow> = votes::table
            .select(VoteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_vote).collect())
    }

    async fn count(&self) -> Result<u64, VotePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = votes::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        u64::try_from(count)
            .map_err(|_| VotePersistenceError::query("negative row count from database"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::unavailable("connection refused"));

        assert!(matches!(repo_err, VotePersistenceError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_vote() {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        );

        assert_eq!(
            map_diesel_error(diesel_err),
            VotePersistenceError::DuplicateVote
        );
    }

    #[rstest]
    fn other_errors_map_to_query_error() {
        let repo_err = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(repo_err, VotePersistenceError::Query { .. }));
    }
}
