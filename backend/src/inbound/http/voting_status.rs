//! Voting-status API handlers.
//!
//! ```text
//! GET   /api/voting-status  Read the current voting window
//! PATCH /api/voting-status  Open or close the window (admin only)
//! ```

use actix_web::{HttpResponse, get, patch, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, VotingSession};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Window transition request body.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VotingStatusUpdate {
    /// Requested window state.
    pub is_open: bool,
}

/// Resolve the caller to a stored user and require the admin role.
pub(crate) async fn require_admin(
    state: &HttpState,
    session: &SessionContext,
) -> Result<(), Error> {
    let user_id = session.require_user_id()?;
    let user = state
        .auth
        .user_by_id(&user_id)
        .await?
        .ok_or_else(|| Error::unauthorized("login required"))?;
    if user.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("admin role required"))
    }
}

/// Read the current voting window.
#[utoipa::path(
    get,
    path = "/api/voting-status",
    responses(
        (status = 200, description = "Current voting window", body = VotingSession),
        (status = 404, description = "Voting status not initialised", body = Error)
    ),
    tags = ["voting-status"],
    operation_id = "getVotingStatus"
)]
#[get("/voting-status")]
pub async fn get_voting_status(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let session = state.voting_status.fetch().await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Open or close the voting window.
///
/// # Errors
///
/// - `401 Unauthorized`: No valid session.
/// - `403 Forbidden`: Caller is not an admin.
#[utoipa::path(
    patch,
    path = "/api/voting-status",
    request_body = VotingStatusUpdate,
    responses(
        (status = 200, description = "Updated voting window", body = VotingSession),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["voting-status"],
    operation_id = "updateVotingStatus"
)]
#[patch("/voting-status")]
pub async fn update_voting_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VotingStatusUpdate>,
) -> ApiResult<HttpResponse> {
    require_admin(&state, &session).await?;
    let updated = state.voting_status.set_open(payload.is_open).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{FixtureBackend, fixture_user, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use serde_json::{Value, json};

    fn test_app(
        backend: &FixtureBackend,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(backend.state()))
            .wrap(test_session_middleware())
            .service(
                web::scope("/api")
                    .service(get_voting_status)
                    .service(update_voting_status),
            )
            .service(web::scope("/auth").service(crate::inbound::http::auth::callback))
    }

    async fn login_and_get_cookie(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
    ) -> actix_web::cookie::Cookie<'static> {
        let req = actix_test::TestRequest::get()
            .uri("/auth/callback?code=fixture-code")
            .to_request();
        let res = actix_test::call_service(app, req).await;
        assert!(res.status().is_redirection());
        res.response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    #[actix_web::test]
    async fn status_read_is_public() {
        let backend = FixtureBackend::new();
        let app = actix_test::init_service(test_app(&backend)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/voting-status")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("is_open").and_then(Value::as_bool), Some(false));
    }

    #[actix_web::test]
    async fn admin_opens_the_window() {
        let backend = FixtureBackend::with_parts(
            Default::default(),
            Vec::new(),
            vec![fixture_user(Role::Admin)],
        );
        let app = actix_test::init_service(test_app(&backend)).await;
        let cookie = login_and_get_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri("/api/voting-status")
                .cookie(cookie)
                .set_json(json!({"isOpen": true}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("is_open").and_then(Value::as_bool), Some(true));
        assert!(body.get("start_time").and_then(Value::as_str).is_some());
        assert!(body.get("end_time").map(Value::is_null).unwrap_or(true));
    }

    #[actix_web::test]
    async fn regular_user_is_forbidden() {
        let backend = FixtureBackend::new();
        let app = actix_test::init_service(test_app(&backend)).await;
        // First login creates the fixture identity with role `user`.
        let cookie = login_and_get_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri("/api/voting-status")
                .cookie(cookie)
                .set_json(json!({"isOpen": true}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn anonymous_update_is_unauthorised() {
        let backend = FixtureBackend::new();
        let app = actix_test::init_service(test_app(&backend)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri("/api/voting-status")
                .set_json(json!({"isOpen": true}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
