//! Request correlation.
//!
//! Every request is tagged with a fresh UUID held in tokio task-local storage
//! for the duration of the handler call. `Error::new` reads it when building
//! error payloads and the middleware echoes it in the `trace-id` response
//! header, so a client-reported header value can be matched to server logs.
//!
//! Task locals do not cross `spawn` boundaries; wrap spawned work in
//! [`TraceId::scope`] to keep the identifier attached.

use std::future::Future;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::task_local;
use tracing::error;
use uuid::Uuid;

/// Response header carrying the request's trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static ACTIVE_TRACE: TraceId;
}

/// Identifier correlating one request across logs, error payloads, and the
/// response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(pub(crate) Uuid);

impl TraceId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The identifier of the request currently being served, when inside one.
    ///
    /// # Examples
    /// ```
    /// use backend::middleware::trace::TraceId;
    ///
    /// // Outside a request there is no active identifier.
    /// assert!(TraceId::current().is_none());
    /// ```
    pub fn current() -> Option<Self> {
        ACTIVE_TRACE.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` installed as the active identifier.
    ///
    /// # Examples
    /// ```
    /// use backend::middleware::trace::TraceId;
    ///
    /// # actix_web::rt::System::new().block_on(async {
    /// let id: TraceId = "11111111-2222-3333-4444-555555555555"
    ///     .parse()
    ///     .expect("uuid literal");
    /// let seen = TraceId::scope(id, async { TraceId::current() }).await;
    /// assert_eq!(seen, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        ACTIVE_TRACE.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Middleware tagging every request with a [`TraceId`].
///
/// Wrap the whole app in it so handlers and error constructors can read
/// [`TraceId::current`].
#[derive(Clone, Copy, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = TraceService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceService { inner: service }))
    }
}

/// The wrapped service behind [`Trace`]; not constructed directly.
pub struct TraceService<S> {
    inner: S,
}

impl<S, B> Service<ServiceRequest> for TraceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::generate();
        let fut = self.inner.call(req);
        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = fut.await?;
            tag_response(res.response_mut().headers_mut(), trace_id);
            Ok(res)
        }))
    }
}

fn tag_response(headers: &mut HeaderMap, trace_id: TraceId) {
    match HeaderValue::from_str(&trace_id.to_string()) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
        Err(err) => {
            // UUIDs are always header-safe; this only fires on a logic bug.
            error!(error = %err, %trace_id, "trace identifier not encodable as a header");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    fn header_value(res: &actix_web::dev::ServiceResponse) -> String {
        res.headers()
            .get(TRACE_ID_HEADER)
            .expect("response tagged with trace id")
            .to_str()
            .expect("header is ascii")
            .to_owned()
    }

    #[rstest]
    fn no_identifier_outside_a_request() {
        assert!(TraceId::current().is_none());
    }

    #[rstest]
    #[case("00000000-0000-0000-0000-000000000000")]
    #[case("11111111-2222-3333-4444-555555555555")]
    fn parses_and_prints_the_same_uuid(#[case] raw: &str) {
        let id: TraceId = raw.parse().expect("uuid literal");
        assert_eq!(id.to_string(), raw);
    }

    #[rstest]
    fn malformed_identifier_does_not_parse() {
        assert!("not-a-uuid".parse::<TraceId>().is_err());
    }

    #[actix_web::test]
    async fn scope_installs_the_identifier() {
        let outer = TraceId::generate();
        let seen = TraceId::scope(outer, async { TraceId::current() }).await;
        assert_eq!(seen, Some(outer));
        assert!(TraceId::current().is_none(), "scope must not leak");
    }

    #[actix_web::test]
    async fn responses_carry_a_parseable_identifier() {
        let app = actix_test::init_service(App::new().wrap(Trace).route(
            "/ping",
            web::get().to(|| async { HttpResponse::NoContent().finish() }),
        ))
        .await;

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        header_value(&res)
            .parse::<TraceId>()
            .expect("header holds a uuid");
    }

    #[actix_web::test]
    async fn handler_sees_the_identifier_from_the_header() {
        let app = actix_test::init_service(App::new().wrap(Trace).route(
            "/echo",
            web::get().to(|| async {
                let id = TraceId::current().expect("inside a request");
                HttpResponse::Ok().body(id.to_string())
            }),
        ))
        .await;

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/echo").to_request()).await;
        let header = header_value(&res);
        let body = actix_test::read_body(res).await;
        assert_eq!(body, header.as_str());
    }

    #[actix_web::test]
    async fn error_payload_matches_the_header() {
        let app = actix_test::init_service(App::new().wrap(Trace).route(
            "/fail",
            web::get()
                .to(|| async { Result::<HttpResponse, Error>::Err(Error::internal("boom")) }),
        ))
        .await;

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/fail").to_request()).await;
        let header = header_value(&res);
        let payload: Error = actix_test::read_body_json(res).await;
        assert_eq!(payload.trace_id.as_deref(), Some(header.as_str()));
    }
}
