//! Request-scoped trace identifiers.
//!
//! [`Trace`] stamps every request with a fresh [`TraceId`] held in Tokio
//! task-local storage and echoes it back in the [`TRACE_ID_HEADER`]
//! response header. Domain errors constructed while a request is in flight
//! pick the identifier up automatically, so a client-reported header value
//! matches both the log lines and the error body for that request.
//!
//! Task-locals do not cross `tokio::spawn` boundaries: re-enter the scope
//! with [`TraceId::scope`] when handing work to another task or a blocking
//! thread.

use std::future::Future;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::task_local;
use uuid::Uuid;

use crate::domain::TRACE_ID_HEADER;

task_local! {
    static ACTIVE_TRACE: TraceId;
}

/// Identifier correlating the logs, response header, and error body of one
/// request (UUID v4).
///
/// # Examples
/// ```
/// use neoreddit::middleware::trace::TraceId;
///
/// async fn handler() {
///     if let Some(id) = TraceId::current() {
///         tracing::info!(trace_id = %id, "handling request");
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The identifier of the request currently in scope, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        ACTIVE_TRACE.try_with(|id| *id).ok()
    }

    /// Run `fut` with this identifier in scope.
    ///
    /// # Examples
    /// ```
    /// use neoreddit::middleware::trace::TraceId;
    /// use uuid::Uuid;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let trace_id = TraceId::from_uuid(Uuid::nil());
    /// let observed = trace_id.scope(async { TraceId::current() }).await;
    /// assert_eq!(observed, Some(trace_id));
    /// # });
    /// ```
    pub async fn scope<Fut>(self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        ACTIVE_TRACE.scope(self, fut).await
    }

    fn header_value(self) -> Option<HeaderValue> {
        // A hyphenated UUID is plain ASCII, so this only fails if the
        // rendering ever changes shape.
        HeaderValue::from_str(&self.to_string()).ok()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Middleware scoping a fresh [`TraceId`] over each request and echoing it
/// in the response headers.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use neoreddit::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceService { inner: service }))
    }
}

/// Service wrapper produced by [`Trace`]; not used directly.
pub struct TraceService<S> {
    inner: S,
}

impl<S, B> Service<ServiceRequest> for TraceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::generate();
        let fut = self.inner.call(req);
        Box::pin(trace_id.scope(async move {
            let mut res = fut.await?;
            if let Some(value) = trace_id.header_value() {
                res.headers_mut()
                    .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
            }
            Ok(res)
        }))
    }
}
