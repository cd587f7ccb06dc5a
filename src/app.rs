//! Canonical request/response types and the application dispatch contract.
//!
//! These are the framework-neutral shapes the adapter translates to and from
//! backend-native objects. An application plugs in by implementing [`App`]
//! (or by wrapping an async closure with [`app_fn`]) and never sees the
//! backend's own request type.
//!
//! # Examples
//!
//! ```rust,ignore
//! use gantry::app::{app_fn, CanonicalResponse};
//! use http::StatusCode;
//!
//! let app = app_fn(|request| async move {
//!     let body = format!("{} {}", request.method(), request.path());
//!     Ok(CanonicalResponse::builder()
//!         .status(StatusCode::OK)
//!         .text(&body))
//! });
//! ```

use std::{
    error::Error as StdError, future::Future, net::SocketAddr, pin::Pin, sync::Arc,
};

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http::{HeaderMap, Method, StatusCode};
use http_body_util::{combinators::BoxBody, BodyExt, Limited, StreamBody};
use hyper::body::Frame;

use crate::errors::{DispatchError, TranslateError};

/// Error type carried by adapter body streams.
pub type BodyError = Box<dyn StdError + Send + Sync>;

/// The byte-stream body shape shared by canonical requests and responses.
pub type AdapterBody = BoxBody<Bytes, BodyError>;

/// The framework-neutral representation of one inbound HTTP request.
///
/// Created per request by the translator, handed to [`App::dispatch`] by
/// value, and discarded once the response is written. Header ordering and
/// duplicate header values are preserved exactly as the backend parsed them.
pub struct CanonicalRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: RequestBody,
    pub(crate) remote_addr: SocketAddr,
}

impl CanonicalRequest {
    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string, if any.
    ///
    /// Percent-encoding is left exactly as the backend delivered it.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the decoded query string as key/value pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match &self.query {
            Some(query) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns the request headers.
    ///
    /// Repeated header names keep all their values, in arrival order.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the peer address of the connection this request arrived on.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Consumes the request, yielding its body.
    pub fn into_body(self) -> RequestBody {
        self.body
    }
}

/// The body of a [`CanonicalRequest`].
///
/// The body is a byte stream owned by the request-handling call chain. It can
/// be collected into memory (bounded by the configured limit) or consumed
/// incrementally via [`RequestBody::into_inner`].
pub struct RequestBody {
    inner: AdapterBody,
    limit: Option<usize>,
}

impl RequestBody {
    pub(crate) fn new(inner: AdapterBody, limit: Option<usize>) -> Self {
        Self { inner, limit }
    }

    /// Collects the whole body into memory.
    ///
    /// # Errors
    ///
    /// Fails with [`TranslateError::BodyTooLarge`] once more than the
    /// configured limit has been read, or [`TranslateError::Body`] if the
    /// underlying stream fails mid-read.
    pub async fn bytes(self) -> Result<Bytes, TranslateError> {
        let collected = match self.limit {
            Some(limit) => {
                // Boxing the collect future erases `Limited`'s generic body
                // machinery; without it rustc rejects callers that need this
                // future to be `Send + 'static` ("implementation of `From` is
                // not general enough").
                let collect: Pin<
                    Box<
                        dyn Future<
                                Output = Result<
                                    http_body_util::Collected<Bytes>,
                                    BodyError,
                                >,
                            > + Send,
                    >,
                > = Box::pin(Limited::new(self.inner, limit).collect());
                collect.await.map_err(|err| {
                    if err
                        .downcast_ref::<http_body_util::LengthLimitError>()
                        .is_some()
                    {
                        TranslateError::BodyTooLarge(limit)
                    } else {
                        TranslateError::Body(err.to_string())
                    }
                })?
            }
            None => self
                .inner
                .collect()
                .await
                .map_err(|err| TranslateError::Body(err.to_string()))?,
        };
        Ok(collected.to_bytes())
    }

    /// Returns the raw body stream for incremental consumption.
    ///
    /// The configured buffering limit does not apply to incremental reads;
    /// the application owns its own backpressure in that case.
    pub fn into_inner(self) -> AdapterBody {
        self.inner
    }
}

/// Builder for creating canonical responses.
///
/// # Examples
///
/// ```rust,ignore
/// use gantry::app::CanonicalResponse;
/// use http::StatusCode;
///
/// let response = CanonicalResponse::builder()
///     .status(StatusCode::CREATED)
///     .header("content-type", "application/json".parse().unwrap())
///     .text(r#"{"status": "success"}"#);
/// ```
pub struct CanonicalResponseBuilder {
    status: StatusCode,
    headers: Option<HeaderMap>,
}

impl CanonicalResponseBuilder {
    /// Sets the HTTP status code for the response.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a header to the response.
    ///
    /// Appending the same name twice emits the value twice, in order.
    pub fn header<K>(mut self, key: K, value: http::header::HeaderValue) -> Self
    where
        K: http::header::IntoHeaderName,
    {
        if self.headers.is_none() {
            self.headers = Some(HeaderMap::new());
        }
        self.headers
            .as_mut()
            .unwrap()
            .append(key, value);
        self
    }

    /// Sets the headers for the response.
    ///
    /// This replaces all existing headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Creates the final response with no body.
    pub fn empty(self) -> CanonicalResponse {
        self.body(ResponseBody::Empty)
    }

    /// Sets the body from a text string and creates the final response.
    pub fn text(self, text: &str) -> CanonicalResponse {
        self.body(ResponseBody::Full(Bytes::copy_from_slice(text.as_bytes())))
    }

    /// Sets the body from bytes and creates the final response.
    pub fn bytes(self, bytes: impl Into<Bytes>) -> CanonicalResponse {
        self.body(ResponseBody::Full(bytes.into()))
    }

    /// Sets a streaming body producer and creates the final response.
    ///
    /// Chunks are written to the client incrementally, without buffering the
    /// whole body. A mid-stream error breaks the connection; it is reported
    /// as a transport write failure, never as silent truncation.
    pub fn stream<S>(self, stream: S) -> CanonicalResponse
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static,
    {
        let content = stream
            .map_ok(Frame::data)
            .map_err(|err| Box::new(err) as BodyError);
        let body = StreamBody::new(content);
        self.body(ResponseBody::Stream(BodyExt::boxed(body)))
    }

    fn body(self, body: ResponseBody) -> CanonicalResponse {
        CanonicalResponse {
            status: self.status,
            headers: self.headers.unwrap_or_default(),
            body,
        }
    }
}

/// The body of a [`CanonicalResponse`].
pub enum ResponseBody {
    /// No body bytes
    Empty,
    /// A fully buffered body
    Full(Bytes),
    /// A streaming producer consumed incrementally
    Stream(AdapterBody),
}

/// The framework-neutral representation of one outbound HTTP response.
///
/// Created by the framework dispatch call; consumed and discarded by the
/// translator once written to the backend.
pub struct CanonicalResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: ResponseBody,
}

impl CanonicalResponse {
    /// Creates a new builder with status 200 and no headers.
    pub fn builder() -> CanonicalResponseBuilder {
        CanonicalResponseBuilder { status: StatusCode::OK, headers: None }
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Future type returned by [`App::dispatch`].
pub type DispatchFuture =
    Pin<Box<dyn Future<Output = Result<CanonicalResponse, DispatchError>> + Send>>;

/// The single-method capability an application framework exposes to the
/// adapter.
///
/// The adapter calls `dispatch` once per translated request, possibly
/// concurrently from whatever execution contexts the backend uses, so
/// implementations must not rely on mutable state shared between calls.
/// Dispatch may block its task on I/O for as long as the controller logic
/// needs; the backend's accept loop is never held up by it.
pub trait App: Send + Sync + 'static {
    /// Handles one canonical request, producing a canonical response.
    fn dispatch(&self, request: CanonicalRequest) -> DispatchFuture;
}

impl<A: App> App for Arc<A> {
    fn dispatch(&self, request: CanonicalRequest) -> DispatchFuture {
        self.as_ref().dispatch(request)
    }
}

/// An [`App`] wrapping a plain async closure.
///
/// Created with [`app_fn`].
pub struct FnApp<F> {
    f: F,
}

/// Creates an [`App`] from an async function.
///
/// # Examples
///
/// ```rust,ignore
/// use gantry::app::{app_fn, CanonicalResponse};
///
/// let app = app_fn(|_request| async move {
///     Ok(CanonicalResponse::builder().text("Hello, World!"))
/// });
/// ```
pub fn app_fn<F, Fut>(f: F) -> FnApp<F>
where
    F: Fn(CanonicalRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CanonicalResponse, DispatchError>> + Send + 'static,
{
    FnApp { f }
}

impl<F, Fut> App for FnApp<F>
where
    F: Fn(CanonicalRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CanonicalResponse, DispatchError>> + Send + 'static,
{
    fn dispatch(&self, request: CanonicalRequest) -> DispatchFuture {
        Box::pin((self.f)(request))
    }
}
