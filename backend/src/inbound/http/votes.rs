//! Vote API handlers.
//!
//! ```text
//! GET  /api/votes/results   Live per-candidate results
//! POST /api/votes/validate  Dry-run the submission preconditions
//! POST /api/votes           Cast the caller's single vote
//! ```
//!
//! Precondition failures (`voting_closed`, `already_voted`,
//! `invalid_candidate`) all surface as `400 Bad Request`; clients branch on
//! the error `code`.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{CandidateId, Error, TallyReport, Vote};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Vote submission request body.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// Identifier of the chosen candidate.
    #[schema(value_type = String)]
    pub candidate_id: CandidateId,
}

/// Validation response body.
#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
pub struct ValidationResponse {
    /// Always `true`; failures are reported as errors.
    pub valid: bool,
}

/// Live per-candidate results.
///
/// Visible to everyone regardless of the window state; an election with no
/// votes returns every candidate with a zero count.
#[utoipa::path(
    get,
    path = "/api/votes/results",
    responses(
        (status = 200, description = "Current tally", body = TallyReport)
    ),
    tags = ["votes"],
    operation_id = "getResults"
)]
#[get("/votes/results")]
pub async fn results(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let report = state.reporting.results().await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Dry-run the submission preconditions without recording anything.
///
/// # Errors
///
/// - `400 Bad Request`: Window closed, caller already voted, or unknown
///   candidate; the `code` field distinguishes them.
/// - `401 Unauthorized`: No valid session.
#[utoipa::path(
    post,
    path = "/api/votes/validate",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Submission would be accepted", body = ValidationResponse),
        (status = 400, description = "A precondition failed", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["votes"],
    operation_id = "validateVote"
)]
#[post("/votes/validate")]
pub async fn validate(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VoteRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state.submission.validate(user_id, payload.candidate_id).await?;
    Ok(HttpResponse::Ok().json(ValidationResponse { valid: true }))
}

/// Cast the caller's single vote.
///
/// # Errors
///
/// - `400 Bad Request`: Window closed, caller already voted, or unknown
///   candidate. A concurrent duplicate caught by the storage constraint
///   reports `already_voted` exactly like the pre-check.
/// - `401 Unauthorized`: No valid session.
#[utoipa::path(
    post,
    path = "/api/votes",
    request_body = VoteRequest,
    responses(
        (status = 201, description = "Vote recorded", body = Vote),
        (status = 400, description = "A precondition failed", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["votes"],
    operation_id = "castVote"
)]
#[post("/votes")]
pub async fn cast(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VoteRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let vote = state.submission.submit(user_id, payload.candidate_id).await?;
    Ok(HttpResponse::Created().json(vote))
}
