//! Backend entry-point: wires REST endpoints, the WebSocket change feed, and
//! OpenAPI docs.

mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::web;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use backend::inbound::http::health::HealthState;
use backend::inbound::http::session_config::{BuildMode, SessionOptions, session_settings};
use backend::outbound::persistence::{DbPool, PoolConfig};
use server::{IdentityConfig, ServerConfig, create_server};

/// Command-line and environment configuration.
#[derive(Debug, Parser)]
#[command(about = "Electronic voting backend", version)]
struct Cli {
    /// Socket address the HTTP server binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: SocketAddr,

    /// PostgreSQL connection string; omit to serve from in-memory fixtures.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Upper bound on pooled database connections.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    db_max_connections: u32,

    /// Identity provider endpoint that exchanges authorisation codes.
    #[arg(long, env = "IDENTITY_TOKEN_ENDPOINT")]
    identity_token_endpoint: Option<Url>,

    /// API key sent with every identity provider request.
    #[arg(long, env = "IDENTITY_API_KEY", hide_env_values = true)]
    identity_api_key: Option<String>,

    /// Public HTTPS host accepted as a WebSocket Origin.
    #[arg(long, env = "PUBLIC_HOST")]
    public_host: Option<String>,

    /// Whether session cookies are marked `Secure`.
    #[arg(long, env = "SESSION_COOKIE_SECURE")]
    session_cookie_secure: Option<bool>,

    /// SameSite policy for session cookies, one of `Strict|Lax|None`.
    #[arg(long, env = "SESSION_SAME_SITE")]
    session_same_site: Option<String>,

    /// Allow a generated in-memory session key when the key file is missing.
    #[arg(long, env = "SESSION_ALLOW_EPHEMERAL_KEY")]
    session_allow_ephemeral_key: Option<bool>,

    /// Path to the session signing key material.
    #[arg(long, env = "SESSION_KEY_FILE")]
    session_key_file: Option<PathBuf>,
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            cookie_secure: self.session_cookie_secure,
            same_site: self.session_same_site.clone(),
            allow_ephemeral_key: self.session_allow_ephemeral_key,
            key_file: self.session_key_file.clone(),
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();

    let settings = session_settings(&cli.session_options(), BuildMode::from_debug_assertions())
        .map_err(|e| std::io::Error::other(format!("session configuration invalid: {e}")))?;

    let mut config = ServerConfig::new(
        settings.key,
        settings.cookie_secure,
        settings.same_site,
        cli.bind_addr,
    );

    if let Some(url) = cli.database_url.as_deref() {
        let pool = DbPool::new(PoolConfig::new(url).max_connections(cli.db_max_connections))
            .await
            .map_err(|e| std::io::Error::other(format!("database pool failed: {e}")))?;
        config = config.with_db_pool(pool);
    } else {
        warn!("no database configured; serving from in-memory fixtures");
    }

    match (cli.identity_token_endpoint, cli.identity_api_key) {
        (Some(token_endpoint), Some(api_key)) => {
            config = config.with_identity(IdentityConfig {
                token_endpoint,
                api_key,
            });
        }
        (None, None) => {
            warn!("no identity provider configured; only the fixture login code is accepted");
        }
        _ => {
            return Err(std::io::Error::other(
                "identity token endpoint and api key must be set together",
            ));
        }
    }

    if let Some(host) = cli.public_host {
        config = config.with_public_host(host);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
