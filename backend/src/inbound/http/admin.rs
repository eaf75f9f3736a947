//! Admin API handlers.
//!
//! ```text
//! GET /api/admin/stats  Turnout snapshot for the admin dashboard
//! ```

use actix_web::{HttpResponse, get, web};

use crate::domain::{AdminStats, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::voting_status::require_admin;

/// Turnout snapshot for the admin dashboard.
///
/// `totalUsers` counts only eligible voters (role `user`); admins do not
/// dilute the participation rate.
///
/// # Errors
///
/// - `401 Unauthorized`: No valid session.
/// - `403 Forbidden`: Caller is not an admin.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Turnout snapshot", body = AdminStats),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "getAdminStats"
)]
#[get("/admin/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    require_admin(&state, &session).await?;
    let stats = state.reporting.admin_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
