//! Connection pooling for the PostgreSQL adapters.
//!
//! All four repositories share one bb8-managed pool of `diesel-async`
//! connections. Pool failures surface as [`PoolError`] values the
//! repositories fold into their own persistence-error enums; the pool never
//! returns raw bb8 errors across the adapter boundary.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Failures raised while building the pool or acquiring a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became available before the acquire deadline.
    #[error("no database connection available: {message}")]
    Unavailable {
        /// bb8 diagnostic.
        message: String,
    },

    /// The pool itself could not be constructed.
    #[error("connection pool setup failed: {message}")]
    Setup {
        /// bb8 diagnostic.
        message: String,
    },
}

impl PoolError {
    /// Acquire-side failure.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Construction-side failure.
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }
}

/// Sizing and deadline knobs for the connection pool.
///
/// Defaults suit a small single-instance deployment: at most ten open
/// connections, two kept warm, and a thirty-second acquire deadline.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_connections: u32,
    idle_floor: Option<u32>,
    acquire_timeout: Duration,
}

impl PoolConfig {
    /// Configuration for the given database with the default knobs.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            idle_floor: Some(2),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Cap the number of open connections.
    #[must_use]
    pub fn max_connections(mut self, limit: u32) -> Self {
        self.max_connections = limit;
        self
    }

    /// Keep at least this many idle connections warm, or `None` to let the
    /// pool drain completely when quiet.
    #[must_use]
    pub fn idle_floor(mut self, floor: Option<u32>) -> Self {
        self.idle_floor = floor;
        self
    }

    /// Deadline for checking a connection out of the pool.
    #[must_use]
    pub fn acquire_timeout(mut self, deadline: Duration) -> Self {
        self.acquire_timeout = deadline;
        self
    }
}

/// Shared handle to the bb8 pool of async PostgreSQL connections.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open a pool against the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Setup`] when the pool cannot be constructed.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(config.idle_floor)
            .connection_timeout(config.acquire_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::setup(err.to_string()))?;

        Ok(Self { inner })
    }

    /// Check a connection out of the pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Unavailable`] when no connection can be acquired
    /// within the deadline.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::unavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_suit_a_small_deployment() {
        let config = PoolConfig::new("postgres://db/votes");

        assert_eq!(config.database_url, "postgres://db/votes");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.idle_floor, Some(2));
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[rstest]
    fn knobs_override_the_defaults() {
        let config = PoolConfig::new("postgres://db/votes")
            .max_connections(4)
            .idle_floor(None)
            .acquire_timeout(Duration::from_secs(5));

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.idle_floor, None);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[rstest]
    #[case(PoolError::unavailable("deadline elapsed"), "deadline elapsed")]
    #[case(PoolError::setup("bad url"), "bad url")]
    fn errors_carry_the_diagnostic(#[case] error: PoolError, #[case] needle: &str) {
        assert!(error.to_string().contains(needle));
    }
}
