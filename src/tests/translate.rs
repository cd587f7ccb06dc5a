use std::net::SocketAddr;

use bytes::Bytes;
use futures_util::stream;
use http::{header::HeaderValue, Method, Request, StatusCode};
use http_body_util::{BodyExt, Empty, Full};

use crate::{
    app::{AdapterBody, CanonicalRequest, CanonicalResponse},
    errors::TranslateError,
    translate::{from_canonical, to_canonical},
};

fn remote() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn empty_body() -> AdapterBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

fn full_body(data: &'static [u8]) -> AdapterBody {
    Full::new(Bytes::from_static(data))
        .map_err(|never| match never {})
        .boxed()
}

fn canonical(result: Result<CanonicalRequest, TranslateError>) -> CanonicalRequest {
    match result {
        Ok(request) => request,
        Err(err) => panic!("expected canonical request, got {err}"),
    }
}

#[test]
fn test_duplicate_headers_preserved_in_order() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/tags?a=1")
        .header("x-tag", "one")
        .header("x-tag", "two")
        .header("x-tag", "three")
        .body(empty_body())
        .unwrap();

    let request = canonical(to_canonical(request, remote(), None));

    let values: Vec<_> = request
        .headers()
        .get_all("x-tag")
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert_eq!(values, ["one", "two", "three"]);
    assert_eq!(request.method(), Method::GET);
    assert_eq!(request.path(), "/tags");
    assert_eq!(request.query(), Some("a=1"));
    assert_eq!(request.remote_addr(), remote());
}

#[test]
fn test_missing_path_is_malformed() {
    let request = Request::builder()
        .method(Method::CONNECT)
        .uri("example.com:443")
        .body(empty_body())
        .unwrap();

    match to_canonical(request, remote(), None) {
        Ok(_) => panic!("expected a malformed request error"),
        Err(err) => assert_eq!(err, TranslateError::MissingPath),
    }
}

#[test]
fn test_query_pairs_decoded() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/search?q=hello%20world&lang=en&q=again")
        .body(empty_body())
        .unwrap();

    let request = canonical(to_canonical(request, remote(), None));

    assert_eq!(
        request.query_pairs(),
        [
            ("q".to_string(), "hello world".to_string()),
            ("lang".to_string(), "en".to_string()),
            ("q".to_string(), "again".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .body(full_body(b"0123456789"))
        .unwrap();

    let request = canonical(to_canonical(request, remote(), Some(4)));

    let err = request.into_body().bytes().await.unwrap_err();
    assert_eq!(err, TranslateError::BodyTooLarge(4));
}

#[tokio::test]
async fn test_body_within_limit_collected() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .body(full_body(b"0123456789"))
        .unwrap();

    let request = canonical(to_canonical(request, remote(), Some(16)));

    let body = request.into_body().bytes().await.unwrap();
    assert_eq!(body, Bytes::from_static(b"0123456789"));
}

#[tokio::test]
async fn test_from_canonical_writes_status_headers_and_body() {
    let response = CanonicalResponse::builder()
        .status(StatusCode::CREATED)
        .header("x-one", HeaderValue::from_static("1"))
        .header("x-one", HeaderValue::from_static("2"))
        .text("created");

    let native = from_canonical(response);

    assert_eq!(native.status(), StatusCode::CREATED);
    let values: Vec<_> = native
        .headers()
        .get_all("x-one")
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert_eq!(values, ["1", "2"]);
    assert!(native.headers().contains_key(http::header::DATE));

    let body = native.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body, Bytes::from_static(b"created"));
}

#[tokio::test]
async fn test_streaming_body_forwarded_chunk_by_chunk() {
    let chunks = stream::iter(vec![
        Ok(Bytes::from_static(b"alpha ")),
        Ok(Bytes::from_static(b"beta")),
    ]);

    let response = CanonicalResponse::builder().stream(chunks);
    let native = from_canonical(response);

    let body = native.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body, Bytes::from_static(b"alpha beta"));
}

#[test]
fn test_date_header_not_overwritten() {
    let response = CanonicalResponse::builder()
        .header(http::header::DATE, HeaderValue::from_static("Mon, 01 Jan 2024 00:00:00 +0000"))
        .empty();

    let native = from_canonical(response);

    assert_eq!(
        native.headers().get(http::header::DATE).unwrap(),
        "Mon, 01 Jan 2024 00:00:00 +0000"
    );
}
