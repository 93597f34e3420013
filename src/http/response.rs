//! HTTP response building module
//!
//! Provides the response body type and builders for the responses the router
//! and its helper routes produce.

use futures_util::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE,
    LOCATION,
};
use hyper::{Response, StatusCode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Body type of every response the router produces
pub type RouterBody = BoxBody<Bytes, std::io::Error>;

/// Body holding a fixed buffer
pub fn full(data: impl Into<Bytes>) -> RouterBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Zero-length body
pub fn empty() -> RouterBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Body streaming an open file chunk by chunk
///
/// The file handle is owned by the body and closed when the body is dropped.
pub fn file_body(file: File) -> RouterBody {
    StreamBody::new(ReaderStream::new(file).map_ok(Frame::data)).boxed()
}

/// Generate the HTML error page used for every error status
pub fn error_page(code: u16, message: &str) -> String {
    format!("<html><head><title>Error {code}</title></head><body>{message}</body></html>")
}

/// Neutralize markup in text placed inside an element
///
/// Only `<` and `>` are replaced, so a URL with `&` or quotes stays
/// byte-identical in the page. Not for attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build an HTML error response with the given status and page body
pub fn build_error_response(status: StatusCode, message: &str) -> Response<RouterBody> {
    let page = error_page(status.as_u16(), message);
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/html")
        .body(full(page))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Build 404 Not Found response for an unmatched request URL
pub fn build_404_response(url: &str) -> Response<RouterBody> {
    build_error_response(
        StatusCode::NOT_FOUND,
        &format!(
            "<h1>Error 404</h1> No such endpoint:<h3><b style='background: grey; color: white;'>{}</b></h3>",
            escape_html(url)
        ),
    )
}

/// Build 400 Bad Request response for an undecodable request URL
pub fn build_400_response(url: &str) -> Response<RouterBody> {
    build_error_response(
        StatusCode::BAD_REQUEST,
        &format!(
            "<h1>Error 400</h1> Malformed request URL:<h3>{}</h3>",
            escape_html(url)
        ),
    )
}

/// Build 403 Forbidden response
pub fn build_403_response(path: &str) -> Response<RouterBody> {
    build_error_response(
        StatusCode::FORBIDDEN,
        &format!("<h1>Forbidden</h1><p>{}</p>", escape_html(path)),
    )
}

/// Build 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<RouterBody> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, target)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            fallback(StatusCode::FOUND)
        })
}

/// Build CORS preflight response
pub fn build_preflight_response(allow_origin: &str, allow_methods: &str) -> Response<RouterBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin)
        .header(ACCESS_CONTROL_ALLOW_METHODS, allow_methods)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            fallback(StatusCode::OK)
        })
}

/// Build 200 response with a JSON body
pub fn build_json_response(json: String) -> Response<RouterBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, json.len())
        .body(full(json))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            fallback(StatusCode::OK)
        })
}

/// Build 200 response with a plain text body
pub fn build_text_response(text: String) -> Response<RouterBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_LENGTH, text.len())
        .body(full(text))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            fallback(StatusCode::OK)
        })
}

/// Build 200 response streaming a file
pub fn build_file_response(
    file: File,
    content_type: &str,
    content_length: u64,
) -> Response<RouterBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(file_body(file))
        .unwrap_or_else(|e| {
            log_build_error("file", &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

fn fallback(status: StatusCode) -> Response<RouterBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
