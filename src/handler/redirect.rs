//! Redirect route

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http;
use crate::router::{Route, RouteMethod};

/// Build a route answering 302 with a fixed `location`
///
/// The target is static; captured groups are not substituted into it.
pub fn redirect(pattern: &str, target: &str, method: RouteMethod) -> Result<Route> {
    let target: Arc<str> = Arc::from(target);
    Route::new(pattern, method, move |_req| {
        let target = Arc::clone(&target);
        async move { Ok::<_, Error>(http::build_redirect_response(&target)) }
    })
}
