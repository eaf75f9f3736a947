//! Voting-session state machine.
//!
//! A single record governs whether votes are accepted. The machine has two
//! states, `Open` and `Closed`; only the latest window's timestamps are
//! retained. Opening stamps `start_time` and clears `end_time`; closing stamps
//! `end_time` and clears `start_time`. Authorisation and persistence are the
//! caller's concern — the transition itself is a pure function.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The singleton voting-window record.
///
/// Wire fields stay snake_case to match the storage row the original clients
/// consume directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VotingSession {
    /// True while votes are being accepted.
    pub is_open: bool,
    /// When the current window opened; absent while closed.
    pub start_time: Option<DateTime<Utc>>,
    /// When the last window closed; absent while open.
    pub end_time: Option<DateTime<Utc>>,
}

impl VotingSession {
    /// A closed session with no recorded window.
    pub const fn closed() -> Self {
        Self {
            is_open: false,
            start_time: None,
            end_time: None,
        }
    }

    /// Compute the state after an admin requests the window open or closed.
    ///
    /// Requesting the current state is effect-idempotent in the sense that the
    /// resulting state differs only in the freshness of its timestamp.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::VotingSession;
    /// use chrono::Utc;
    ///
    /// let now = Utc::now();
    /// let open = VotingSession::closed().apply_transition(true, now);
    /// assert!(open.is_open);
    /// assert_eq!(open.start_time, Some(now));
    /// assert_eq!(open.end_time, None);
    /// ```
    #[must_use]
    pub const fn apply_transition(self, requested_is_open: bool, now: DateTime<Utc>) -> Self {
        if requested_is_open {
            Self {
                is_open: true,
                start_time: Some(now),
                end_time: None,
            }
        } else {
            Self {
                is_open: false,
                start_time: None,
                end_time: Some(now),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    #[rstest]
    fn opening_stamps_start_and_clears_end(now: DateTime<Utc>) {
        let closed = VotingSession {
            is_open: false,
            start_time: None,
            end_time: Some(now),
        };
        let open = closed.apply_transition(true, now);
        assert!(open.is_open);
        assert_eq!(open.start_time, Some(now));
        assert_eq!(open.end_time, None);
    }

    #[rstest]
    fn closing_stamps_end_and_clears_start(now: DateTime<Utc>) {
        let open = VotingSession {
            is_open: true,
            start_time: Some(now),
            end_time: None,
        };
        let closed = open.apply_transition(false, now);
        assert!(!closed.is_open);
        assert_eq!(closed.start_time, None);
        assert_eq!(closed.end_time, Some(now));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn requesting_current_state_is_a_no_op_in_effect(#[case] requested: bool, now: DateTime<Utc>) {
        let state = VotingSession::closed().apply_transition(requested, now);
        let again = state.apply_transition(requested, now);
        assert_eq!(state, again);
    }
}
