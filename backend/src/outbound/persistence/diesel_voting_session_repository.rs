//! PostgreSQL-backed `VotingSessionRepository` implementation using Diesel ORM.
//!
//! The `voting_status` table holds exactly one row, keyed by a constant-true
//! `singleton` column, so both operations address `find(true)`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::VotingSession;
use crate::domain::ports::{SessionPersistenceError, VotingSessionRepository};

use super::models::{VotingStatusRow, VotingStatusUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::voting_status;

/// Diesel-backed implementation of the `VotingSessionRepository` port.
#[derive(Clone)]
pub struct DieselVotingSessionRepository {
    pool: DbPool,
}

impl DieselVotingSessionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SessionPersistenceError {
    match error {
        PoolError::Unavailable { message } | PoolError::Setup { message } => {
            SessionPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> SessionPersistenceError {
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
        DieselError::NotFound => SessionPersistenceError::Missing,
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            SessionPersistenceError::connection("database connection error")
        }
        _ => SessionPersistenceError::query("database error"),
    }
}

const fn row_to_session(row: VotingStatusRow) -> VotingSession {
    VotingSession {
        is_open: row.is_open,
        start_time: row.start_time,
        end_time: row.end_time,
    }
}

#[async_trait]
impl VotingSessionRepository for DieselVotingSessionRepository {
    async fn fetch(&self) -> Result<VotingSession, SessionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: VotingStatusRow = voting_status::table
            .find(true)
            .select(VotingStatusRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row_to_session(row))
    }

    async fn update(
        &self,
        session: VotingSession,
    ) -> Result<VotingSession, SessionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = VotingStatusUpdate {
            is_open: session.is_open,
            start_time: session.start_time,
            end_time: session.end_time,
        };

        let row: VotingStatusRow = diesel::update(voting_status::table.find(true))
            .set(&changes)
            .returning(VotingStatusRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row_to_session(row))
    }
}
