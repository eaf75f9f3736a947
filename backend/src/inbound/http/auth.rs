//! Authentication handlers.
//!
//! ```text
//! GET  /auth/callback?code=  Complete the provider login flow
//! POST /auth/logout          Invalidate the session
//! ```
//!
//! Both endpoints answer with `303 See Other` redirects because the browser
//! lands on them directly, not via `fetch`. A failed code exchange redirects
//! to the login page rather than rendering an error body.

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::warn;

use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const LOGIN_PATH: &str = "/login";
const VOTER_HOME: &str = "/vote";
const ADMIN_HOME: &str = "/admin";

/// Provider callback query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorisation code issued by the identity provider.
    pub code: Option<String>,
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Complete the provider login flow.
///
/// Exchanges the authorisation code, materialises the user on first login,
/// persists the session, and routes the browser by role: admins land on the
/// dashboard, everyone else on the ballot.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorisation code from the identity provider")
    ),
    responses(
        (status = 303, description = "Redirect to /vote, /admin, or /login on failure")
    ),
    tags = ["auth"],
    operation_id = "authCallback"
)]
#[get("/callback")]
pub async fn callback(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CallbackQuery>,
) -> ApiResult<HttpResponse> {
    let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) else {
        warn!("auth callback reached without a code");
        return Ok(see_other(LOGIN_PATH));
    };

    let user = match state.auth.callback(code).await {
        Ok(user) => user,
        Err(error) => {
            warn!(error = %error, "login failed, redirecting to login page");
            return Ok(see_other(LOGIN_PATH));
        }
    };

    session.persist_user(user.id())?;
    let destination = if user.is_admin() { ADMIN_HOME } else { VOTER_HOME };
    Ok(see_other(destination))
}

/// Invalidate the caller's session and return to the login page.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to /login")
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    see_other(LOGIN_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{FixtureBackend, fixture_user, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};

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
            .service(web::scope("/auth").service(callback).service(logout))
    }

    fn location(res: &actix_web::dev::ServiceResponse) -> &str {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("redirect location")
    }

    #[actix_web::test]
    async fn voter_login_redirects_to_ballot() {
        let backend = FixtureBackend::new();
        let app = actix_test::init_service(test_app(&backend)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/auth/callback?code=fixture-code")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/vote");
        assert!(
            res.response()
                .cookies()
                .any(|cookie| cookie.name() == "session")
        );
    }

    #[actix_web::test]
    async fn admin_login_redirects_to_dashboard() {
        let backend = FixtureBackend::with_parts(
            Default::default(),
            Vec::new(),
            vec![fixture_user(Role::Admin)],
        );
        let app = actix_test::init_service(test_app(&backend)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/auth/callback?code=fixture-code")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/admin");
    }

    #[actix_web::test]
    async fn rejected_code_redirects_to_login() {
        let backend = FixtureBackend::new();
        let app = actix_test::init_service(test_app(&backend)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/auth/callback?code=bogus")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }

    #[actix_web::test]
    async fn missing_code_redirects_to_login() {
        let backend = FixtureBackend::new();
        let app = actix_test::init_service(test_app(&backend)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/auth/callback")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }

    #[actix_web::test]
    async fn logout_clears_the_session() {
        let backend = FixtureBackend::new();
        let app = actix_test::init_service(test_app(&backend)).await;

        let login = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/auth/callback?code=fixture-code")
                .to_request(),
        )
        .await;
        let cookie = login
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
        let cleared = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("removal cookie");
        assert!(cleared.value().is_empty());
    }
}
