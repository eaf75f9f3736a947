//! Voting-window read and transition service.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::error::Error;
use super::ports::{
    ChangeEvent, ChangeNotifier, ChangeOp, ChangeTable, SessionPersistenceError,
    VotingSessionRepository,
};
use super::voting_session::VotingSession;

/// Reads and transitions the singleton voting window.
#[derive(Clone)]
pub struct VotingStatusService {
    sessions: Arc<dyn VotingSessionRepository>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl VotingStatusService {
    /// Wire the service to its ports.
    pub fn new(
        sessions: Arc<dyn VotingSessionRepository>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self { sessions, notifier }
    }

    /// Current window state; readable by any authenticated user.
    pub async fn fetch(&self) -> Result<VotingSession, Error> {
        self.sessions.fetch().await.map_err(map_session_error)
    }

    /// Transition the window to the requested state, stamping the boundary
    /// timestamp. Authorisation is the inbound adapter's concern.
    pub async fn set_open(&self, requested_is_open: bool) -> Result<VotingSession, Error> {
        let current = self.sessions.fetch().await.map_err(map_session_error)?;
        let next = current.apply_transition(requested_is_open, Utc::now());
        let stored = self.sessions.update(next).await.map_err(map_session_error)?;
        info!(is_open = stored.is_open, "voting window transitioned");
        self.notifier.publish(ChangeEvent {
            table: ChangeTable::VotingStatus,
            op: ChangeOp::Update,
        });
        Ok(stored)
    }
}

fn map_session_error(err: SessionPersistenceError) -> Error {
    match err {
        SessionPersistenceError::Missing => Error::not_found("Voting status not found"),
        other => Error::internal(format!("voting session store: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureVotingSessionRepository, NoOpChangeNotifier};
    use rstest::rstest;

    fn service(repo: FixtureVotingSessionRepository) -> VotingStatusService {
        VotingStatusService::new(Arc::new(repo), Arc::new(NoOpChangeNotifier))
    }

    #[rstest]
    fn opening_stamps_start_time() {
        let svc = service(FixtureVotingSessionRepository::default());
        actix_rt::System::new().block_on(async move {
            let opened = svc.set_open(true).await.expect("transition");
            assert!(opened.is_open);
            assert!(opened.start_time.is_some());
            assert!(opened.end_time.is_none());
            assert_eq!(svc.fetch().await.expect("fetch"), opened);
        });
    }

    #[rstest]
    fn closing_stamps_end_time() {
        let svc = service(FixtureVotingSessionRepository::open());
        actix_rt::System::new().block_on(async move {
            let closed = svc.set_open(false).await.expect("transition");
            assert!(!closed.is_open);
            assert!(closed.start_time.is_none());
            assert!(closed.end_time.is_some());
        });
    }
}
