//! Translation between backend-native and canonical request/response shapes.
//!
//! `to_canonical` and `from_canonical` are the only places native `http`
//! types and canonical types meet. Both are pure transformations: they read
//! from or write to the objects they are given and share no mutable state, so
//! the handler adapter can call them concurrently from any backend execution
//! context.

use std::net::SocketAddr;
use std::time::SystemTime;

use bytes::Bytes;
use http::{header, HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Empty, Full};

use crate::{
    app::{AdapterBody, CanonicalRequest, CanonicalResponse, RequestBody, ResponseBody},
    errors::TranslateError,
    utils::date::format_date,
};

/// Parses a backend-native request into the canonical shape.
///
/// Header ordering and duplicate header values are carried over untouched,
/// and percent-encoding already resolved by the backend is left as-is. The
/// body is not read here; it is wrapped with the configured buffering limit
/// and handed to the application as a stream.
///
/// # Errors
///
/// Fails when the request line carries no path (authority-form requests such
/// as `CONNECT host:port`) or the method is empty.
pub fn to_canonical(
    request: Request<AdapterBody>,
    remote_addr: SocketAddr,
    max_body_bytes: Option<usize>,
) -> Result<CanonicalRequest, TranslateError> {
    let (parts, body) = request.into_parts();

    if parts.method.as_str().is_empty() {
        return Err(TranslateError::EmptyMethod);
    }

    let path = parts.uri.path();
    if path.is_empty() {
        return Err(TranslateError::MissingPath);
    }

    Ok(CanonicalRequest {
        method: parts.method,
        path: path.to_owned(),
        query: parts.uri.query().map(str::to_owned),
        headers: parts.headers,
        body: RequestBody::new(body, max_body_bytes),
        remote_addr,
    })
}

/// Writes a canonical response into the backend's native response shape.
///
/// The status line and headers are emitted before any body byte; streaming
/// bodies are forwarded chunk by chunk without buffering. A `Date` header is
/// added when the application did not set one.
pub fn from_canonical(response: CanonicalResponse) -> Response<AdapterBody> {
    let CanonicalResponse { status, headers, body } = response;

    let body = match body {
        ResponseBody::Empty => Empty::<Bytes>::new()
            .map_err(|never| match never {})
            .boxed(),
        ResponseBody::Full(bytes) => Full::new(bytes)
            .map_err(|never| match never {})
            .boxed(),
        ResponseBody::Stream(inner) => inner,
    };

    let mut native = Response::new(body);
    *native.status_mut() = status;
    *native.headers_mut() = headers;

    if !native.headers().contains_key(header::DATE) {
        if let Ok(value) = HeaderValue::from_str(&format_date(SystemTime::now())) {
            native.headers_mut().insert(header::DATE, value);
        }
    }

    native
}

/// Builds a canned error response with a generic plain-text body.
pub(crate) fn error_response(status: StatusCode, body: &str) -> Response<AdapterBody> {
    from_canonical(
        CanonicalResponse::builder()
            .status(status)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .text(body),
    )
}
