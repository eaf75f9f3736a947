//! WebSocket inbound adapter pushing change notifications to clients.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list)
//! - spawn the per-connection forwarding loop
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

mod session;

pub mod messages;
pub mod state;

/// Handle WebSocket upgrade for the `/ws/changes` endpoint.
#[get("/changes")]
pub async fn changes(
    state: web::Data<state::WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(origin_header, state.public_host.as_deref())?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;
    let receiver = state.feed.subscribe();
    actix_web::rt::spawn(session::run(session, msg_stream, receiver));
    Ok(response)
}

fn validate_origin(
    origin_header: &HeaderValue,
    public_host: Option<&str>,
) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin, public_host) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

const LOCALHOST: &str = "localhost";

/// Returns true when a parsed Origin is localhost over HTTP with an explicit
/// non-zero port, or the configured public host (or one of its subdomains)
/// over HTTPS.
fn is_allowed_origin(origin: &Url, public_host: Option<&str>) -> bool {
    let Some(host) = origin.host_str() else {
        return false;
    };

    match origin.scheme() {
        "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        "https" => public_host.is_some_and(|public| {
            host == public
                || host
                    .strip_suffix(public)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header::HeaderValue};
    use rstest::rstest;

    const PUBLIC_HOST: &str = "vote.example.org";

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).expect("valid header value")
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://vote.example.org")]
    #[case("https://staging.vote.example.org")]
    fn accepts_configured_origins(#[case] origin: &str) {
        let header = header(origin);
        assert!(validate_origin(&header, Some(PUBLIC_HOST)).is_ok());
    }

    #[rstest]
    #[case("http://localhost")]
    #[case("https://example.com")]
    #[case("wss://vote.example.org")]
    fn rejects_disallowed_origins(#[case] origin: &str) {
        let header = header(origin);
        let error =
            validate_origin(&header, Some(PUBLIC_HOST)).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn rejects_non_utf8_origin_header() {
        let header = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        let error =
            validate_origin(&header, Some(PUBLIC_HOST)).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn rejects_unparsable_origin_header() {
        let header = HeaderValue::from_static("not a url");
        let error =
            validate_origin(&header, Some(PUBLIC_HOST)).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[rstest]
    #[case("http://localhost:4000", true)]
    #[case("http://localhost:0", false)]
    #[case("http://localhost", false)]
    #[case("https://vote.example.org", true)]
    #[case("https://staging.vote.example.org", true)]
    #[case("https://vote.example.org.evil.com", false)]
    #[case("https://evilvote.example.org", false)]
    #[case("wss://vote.example.org", false)]
    fn evaluates_allow_list(#[case] origin: &str, #[case] expected: bool) {
        let parsed = Url::parse(origin).expect("url should parse");
        assert_eq!(is_allowed_origin(&parsed, Some(PUBLIC_HOST)), expected);
    }

    #[rstest]
    fn https_is_rejected_without_a_public_host() {
        let parsed = Url::parse("https://vote.example.org").expect("url should parse");
        assert!(!is_allowed_origin(&parsed, None));
    }
}
