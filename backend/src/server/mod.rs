//! Server construction and middleware wiring.

mod config;

pub use config::{IdentityConfig, ServerConfig};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::domain::ports::{
    CandidateRepository, ChangeNotifier, FixtureCandidateRepository, FixtureIdentityProvider,
    FixtureUserRepository, FixtureVoteRepository, FixtureVotingSessionRepository,
    IdentityProvider, UserRepository, VoteRepository, VotingSessionRepository,
};
use backend::domain::{AuthService, ResultsReporter, VoteSubmissionService, VotingStatusService};
use backend::inbound::http::admin::stats;
use backend::inbound::http::auth::{callback, logout};
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::votes::{cast, results, validate};
use backend::inbound::http::voting_status::{get_voting_status, update_voting_status};
use backend::inbound::ws;
use backend::inbound::ws::state::{ChangeFeed, WsState};
use backend::outbound::identity::HttpIdentityProvider;
use backend::outbound::persistence::{
    DieselCandidateRepository, DieselUserRepository, DieselVoteRepository,
    DieselVotingSessionRepository,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

/// Repository ports selected from the server configuration.
struct Ports {
    sessions: Arc<dyn VotingSessionRepository>,
    votes: Arc<dyn VoteRepository>,
    candidates: Arc<dyn CandidateRepository>,
    users: Arc<dyn UserRepository>,
}

/// Select database-backed repositories when a pool is available, otherwise
/// fall back to the in-memory fixtures used by tests.
fn build_ports(config: &ServerConfig) -> Ports {
    match &config.db_pool {
        Some(pool) => Ports {
            sessions: Arc::new(DieselVotingSessionRepository::new(pool.clone())),
            votes: Arc::new(DieselVoteRepository::new(pool.clone())),
            candidates: Arc::new(DieselCandidateRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
        },
        None => Ports {
            sessions: Arc::new(FixtureVotingSessionRepository::default()),
            votes: Arc::new(FixtureVoteRepository::default()),
            candidates: Arc::new(FixtureCandidateRepository::default()),
            users: Arc::new(FixtureUserRepository::default()),
        },
    }
}

/// Build the identity provider based on configuration.
///
/// Uses the HTTPS adapter when an endpoint is configured, otherwise falls
/// back to the deterministic fixture so development logins still work.
///
/// # Errors
/// Returns [`std::io::Error`] if the HTTP client cannot be constructed.
fn build_identity_provider(config: &ServerConfig) -> std::io::Result<Arc<dyn IdentityProvider>> {
    match &config.identity {
        Some(identity) => {
            let provider =
                HttpIdentityProvider::new(identity.token_endpoint.clone(), identity.api_key.clone())
                    .map_err(|e| {
                        std::io::Error::other(format!("identity provider client failed: {e}"))
                    })?;
            Ok(Arc::new(provider))
        }
        None => Ok(Arc::new(FixtureIdentityProvider)),
    }
}

/// Build the shared HTTP state from configured ports and fixture fallbacks.
fn build_http_state(
    config: &ServerConfig,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn ChangeNotifier>,
) -> web::Data<HttpState> {
    let ports = build_ports(config);

    let auth = AuthService::new(identity, ports.users.clone());
    let voting_status = VotingStatusService::new(ports.sessions.clone(), notifier.clone());
    let submission = VoteSubmissionService::new(
        ports.sessions.clone(),
        ports.votes.clone(),
        ports.candidates.clone(),
        notifier,
    );
    let reporting = ResultsReporter::new(ports.sessions, ports.votes, ports.candidates, ports.users);

    web::Data::new(HttpState::new(auth, voting_status, submission, reporting))
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let api = web::scope("/api")
        .wrap(session_middleware(key.clone(), cookie_secure, same_site))
        .service(get_voting_status)
        .service(update_voting_status)
        .service(results)
        .service(validate)
        .service(cast)
        .service(stats);

    // The auth scope carries the same session middleware so the callback can
    // persist the login and logout can purge it.
    let auth = web::scope("/auth")
        .wrap(session_middleware(key, cookie_secure, same_site))
        .service(callback)
        .service(logout);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(Trace)
        .service(api)
        .service(auth)
        .service(web::scope("/ws").service(ws::changes))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing session, binding, and adapter settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();

    // One broadcast hub serves both sides: mutating services publish into it
    // and WebSocket connections subscribe to it.
    let feed = Arc::new(ChangeFeed::new());
    let notifier: Arc<dyn ChangeNotifier> = feed.clone();

    let identity = build_identity_provider(&config)?;
    let http_state = build_http_state(&config, identity, notifier);
    let ws_state = web::Data::new(WsState::new(feed, config.public_host.clone()));

    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        db_pool: _,
        identity: _,
        public_host: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
