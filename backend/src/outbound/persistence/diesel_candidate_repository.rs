//! PostgreSQL-backed `CandidateRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{CandidatePersistenceError, CandidateRepository};
use crate::domain::{Candidate, CandidateId};

use super::models::CandidateRow;
use super::pool::{DbPool, PoolError};
use super::schema::candidates;

/// Diesel-backed implementation of the `CandidateRepository` port.
#[derive(Clone)]
pub struct DieselCandidateRepository {
    pool: DbPool,
}

impl DieselCandidateRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CandidatePersistenceError {
    match error {
        PoolError::Unavailable { message } | PoolError::Setup { message } => {
            CandidatePersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CandidatePersistenceError {
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
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CandidatePersistenceError::connection("database connection error")
        }
        _ => CandidatePersistenceError::query("database error"),
    }
}

fn row_to_candidate(row: CandidateRow) -> Candidate {
    Candidate {
        id: CandidateId::from_uuid(row.id),
        name: row.name,
        party_name: row.party_name,
        is_independent: row.is_independent,
        description: row.description,
        order_index: row.order_index,
    }
}

#[async_trait]
impl CandidateRepository for DieselCandidateRepository {
    async fn list(&self) -> Result<Vec<Candidate>, CandidatePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CandidateRow> = candidates::table
            .order(candidates::order_index.asc())
            .select(CandidateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_candidate).collect())
    }

    async fn exists(&self, id: &CandidateId) -> Result<bool, CandidatePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(
            candidates::table.filter(candidates::id.eq(id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}
