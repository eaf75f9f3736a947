//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer (voting status,
//!   votes, admin statistics, auth, health)
//! - **Schemas**: The domain and request/response types those endpoints
//!   exchange
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification is served by Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    AdminStats, Candidate, CandidateResult, Error, ErrorCode, TallyReport, Vote, VotingSession,
};
use crate::inbound::http::votes::{ValidationResponse, VoteRequest};
use crate::inbound::http::voting_status::VotingStatusUpdate;
use crate::inbound::ws::messages::ChangeNotification;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by GET /auth/callback.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Voting backend API",
        description = "HTTP interface for session-authenticated voting, live results, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::voting_status::get_voting_status,
        crate::inbound::http::voting_status::update_voting_status,
        crate::inbound::http::votes::results,
        crate::inbound::http::votes::validate,
        crate::inbound::http::votes::cast,
        crate::inbound::http::admin::stats,
        crate::inbound::http::auth::callback,
        crate::inbound::http::auth::logout,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        VotingSession,
        VotingStatusUpdate,
        Candidate,
        Vote,
        VoteRequest,
        ValidationResponse,
        TallyReport,
        CandidateResult,
        AdminStats,
        ChangeNotification,
    )),
    tags(
        (name = "voting-status", description = "Voting window state and transitions"),
        (name = "votes", description = "Vote submission, validation, and results"),
        (name = "admin", description = "Administrative turnout statistics"),
        (name = "auth", description = "Login callback and logout"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
