//! Route table served by the `subway` binary

pub mod date_api;

use hyper::Response;

use crate::config::Config;
use crate::error::Result;
use crate::handler;
use crate::http::{build_text_response, RouterBody};
use crate::router::{RouteMethod, RouteRequest, RouteTable};

pub use date_api::date_api;

pub const INDEX_PATTERN: &str = r"/index/([a-z\d]*)/address/([a-zA-Z0-9/, -]*)";

/// Digits, or a date string (`-` included so ISO dates get through)
pub const API_PATTERN: &str = r"/api/(\d*|[a-zA-Z0-9,:\- ]*)";

const INDEX_TRAILER: &str = "\nHello world from Subway!";

/// Build the application routes
///
/// Order matters: the CORS preflight catch-all is first so every `OPTIONS`
/// request is answered by it, the static route is last.
pub fn build_routes(config: &Config) -> Result<RouteTable> {
    let mut routes = RouteTable::new();
    routes
        .register(handler::cors(
            &config.cors.allow_origin,
            &config.cors.allow_methods,
        )?)
        .register(handler::redirect(
            "/",
            &config.redirect.target,
            RouteMethod::Get,
        )?)
        .any(INDEX_PATTERN, index)?
        .get(API_PATTERN, date_api)?
        .register(handler::serve_from(
            &config.static_files.base_path,
            &config.static_files.root,
        )?);
    Ok(routes)
}

/// Echo the captured segments separated by `\t|\t`
async fn index(req: RouteRequest) -> Result<Response<RouterBody>> {
    let mut body = req
        .groups()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("\t|\t");
    body.push_str(INDEX_TRAILER);
    Ok(build_text_response(body))
}
