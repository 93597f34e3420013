//! CORS preflight route

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http;
use crate::router::{Route, RouteMethod};

/// Build an `OPTIONS` route answering every preflight with fixed allow headers
///
/// Only preflights are covered: responses to other methods carry no CORS
/// headers unless their own handler adds them.
pub fn cors(allow_origin: &str, allow_methods: &str) -> Result<Route> {
    let allow: Arc<(String, String)> =
        Arc::new((allow_origin.to_string(), allow_methods.to_string()));
    Route::new(".*", RouteMethod::Options, move |_req| {
        let allow = Arc::clone(&allow);
        async move { Ok::<_, Error>(http::build_preflight_response(&allow.0, &allow.1)) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteTable;
    use http_body_util::BodyExt;
    use hyper::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN};
    use hyper::{Method, StatusCode};

    #[tokio::test]
    async fn test_preflight_any_path() {
        let mut table = RouteTable::new();
        table.register(cors("*", "GET, POST, PUT, DELETE").unwrap());

        for url in ["/", "/api/123", "/some/deep/path?x=y"] {
            let response = table.dispatch(&Method::OPTIONS, url).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(
                response.headers()[ACCESS_CONTROL_ALLOW_METHODS],
                "GET, POST, PUT, DELETE"
            );
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn test_other_methods_not_matched() {
        let mut table = RouteTable::new();
        table.register(cors("https://example.com", "GET").unwrap());

        let response = table.dispatch(&Method::GET, "/").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
