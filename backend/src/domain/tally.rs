//! Tally engine: derive per-candidate counts and percentages from a vote set.
//!
//! A pure, idempotent projection: re-running over the same votes always yields
//! the same ordered results. Percentages are informational only and never feed
//! back into any decision, so floating point is acceptable here.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::ballot::Vote;
use super::candidate::{Candidate, CandidateId};

/// One candidate's share of the vote.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CandidateResult {
    /// The candidate, with its storage fields flattened into the payload.
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Number of votes cast for this candidate.
    #[serde(rename = "voteCount")]
    pub vote_count: u64,
    /// Share of the total, 0–100; 0 for everyone when no votes exist.
    pub percentage: f64,
}

/// The full projection returned to results consumers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TallyReport {
    /// Per-candidate results ordered by descending vote count; ties keep the
    /// candidates' display order.
    pub candidates: Vec<CandidateResult>,
    /// Sum of all per-candidate counts.
    #[serde(rename = "totalVotes")]
    pub total_votes: u64,
}

/// Count votes per candidate and derive percentages.
///
/// Votes referencing an unknown candidate are ignored; they cannot occur when
/// the storage foreign key holds but a stale read must not skew the result.
///
/// # Examples
/// ```
/// use backend::domain::tally;
///
/// let report = tally(&[], &[]);
/// assert!(report.candidates.is_empty());
/// assert_eq!(report.total_votes, 0);
/// ```
#[must_use]
pub fn tally(candidates: &[Candidate], votes: &[Vote]) -> TallyReport {
    let mut counts: HashMap<CandidateId, u64> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        counts.insert(candidate.id, 0);
    }
    for vote in votes {
        if let Some(count) = counts.get_mut(&vote.candidate_id) {
            *count += 1;
        }
    }

    let total_votes: u64 = counts.values().sum();

    let mut results: Vec<CandidateResult> = candidates
        .iter()
        .map(|candidate| {
            let vote_count = counts.get(&candidate.id).copied().unwrap_or(0);
            CandidateResult {
                candidate: candidate.clone(),
                vote_count,
                percentage: percentage_of(vote_count, total_votes),
            }
        })
        .collect();

    // Stable sort: ties keep the candidates' incoming display order.
    results.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));

    TallyReport {
        candidates: results,
        total_votes,
    }
}

/// Share of `count` in `total` as a 0–100 percentage; 0 when `total` is 0.
#[expect(
    clippy::cast_precision_loss,
    reason = "vote counts are far below 2^52; percentages are informational"
)]
fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    }
}

/// Rounded percentage of eligible users who have voted; 0 when none are
/// eligible. Admins are excluded from the denominator by the caller.
///
/// # Examples
/// ```
/// use backend::domain::participation_rate;
///
/// assert_eq!(participation_rate(5, 10), 50);
/// assert_eq!(participation_rate(0, 0), 0);
/// ```
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "inputs are row counts; the rounded ratio always fits in u32"
)]
#[must_use]
pub fn participation_rate(total_votes: u64, total_eligible_users: u64) -> u32 {
    if total_eligible_users == 0 {
        0
    } else {
        ((total_votes as f64 / total_eligible_users as f64) * 100.0).round() as u32
    }
}
