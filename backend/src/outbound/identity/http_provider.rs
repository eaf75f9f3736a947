//! Reqwest-backed identity provider adapter.
//!
//! This adapter owns transport details only: the code-exchange request, HTTP
//! error mapping, and JSON decoding into the domain identity.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{AuthenticatedIdentity, IdentityError, IdentityProvider};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider adapter that exchanges authorisation codes over HTTPS.
pub struct HttpIdentityProvider {
    client: Client,
    token_endpoint: Url,
    api_key: String,
}

impl HttpIdentityProvider {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(token_endpoint: Url, api_key: String) -> Result<Self, reqwest::Error> {
        Self::with_timeout(token_endpoint, api_key, DEFAULT_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        token_endpoint: Url,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token_endpoint,
            api_key,
        })
    }
}

/// Session payload returned by the provider's token endpoint.
#[derive(Debug, Deserialize)]
struct SessionDto {
    user: UserDto,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: Uuid,
    email: String,
    #[serde(default)]
    user_metadata: MetadataDto,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataDto {
    full_name: Option<String>,
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<AuthenticatedIdentity, IdentityError> {
        let response = self
            .client
            .post(self.token_endpoint.clone())
            .header("apikey", self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_identity(body.as_ref())
    }
}

fn parse_identity(body: &[u8]) -> Result<AuthenticatedIdentity, IdentityError> {
    let decoded: SessionDto = serde_json::from_slice(body).map_err(|error| {
        IdentityError::decode(format!("invalid provider session payload: {error}"))
    })?;

    Ok(AuthenticatedIdentity {
        id: UserId::from_uuid(decoded.user.id),
        email: decoded.user.email,
        full_name: decoded.user.user_metadata.full_name,
    })
}

fn map_transport_error(error: reqwest::Error) -> IdentityError {
    IdentityError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    if status.is_client_error() {
        IdentityError::rejected(message)
    } else {
        IdentityError::transport(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
