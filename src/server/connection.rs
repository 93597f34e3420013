// Connection handling module
// Serves accepted TCP connections through the route table

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};

use super::idle::IdleTimeout;

use crate::config::Config;
use crate::error::Result;
use crate::http::RouterBody;
use crate::logger;
use crate::router::RouteTable;

/// Per-connection settings, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub access_log: bool,
    pub keep_alive: bool,
    /// Time allowed for a request head to arrive
    pub header_read_timeout: Duration,
    /// Quiet period after which an idle connection is closed
    pub idle_timeout: Duration,
    /// Time a response write may wait on a peer that is not reading
    pub write_timeout: Duration,
}

impl ConnectionSettings {
    /// Zero seconds disables the matching timeout
    pub fn from_config(config: &Config) -> Self {
        let perf = &config.performance;
        Self {
            access_log: config.logging.access_log,
            keep_alive: perf.keep_alive_timeout > 0,
            header_read_timeout: Duration::from_secs(perf.read_timeout),
            idle_timeout: Duration::from_secs(perf.keep_alive_timeout),
            write_timeout: Duration::from_secs(perf.write_timeout),
        }
    }
}

/// Accept a connection and serve it on its own task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `routes` - Shared, read-only route table
/// * `settings` - Connection settings
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    routes: &Arc<RouteTable>,
    settings: &Arc<ConnectionSettings>,
) {
    logger::log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
    handle_connection(stream, Arc::clone(routes), Arc::clone(settings));
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in the idle and write-stall deadlines
/// 2. Configures HTTP/1.1 keep-alive and the header read timeout
/// 3. Serves the connection with the route table
///
/// No deadline covers the connection as a whole: a response keeps streaming
/// for as long as the peer keeps reading.
fn handle_connection(
    stream: tokio::net::TcpStream,
    routes: Arc<RouteTable>,
    settings: Arc<ConnectionSettings>,
) {
    tokio::spawn(async move {
        let stream = IdleTimeout::new(stream, settings.idle_timeout, settings.write_timeout);
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);
        builder.timer(TokioTimer::new());
        builder.header_read_timeout(
            (!settings.header_read_timeout.is_zero()).then_some(settings.header_read_timeout),
        );

        let access_log = settings.access_log;
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let routes = Arc::clone(&routes);
                async move { handle_request(req, &routes, access_log).await }
            }),
        );

        if let Err(err) = conn.await {
            if is_timeout(&err) {
                logger::log_warning(&format!("Connection closed: {err}"));
            } else {
                logger::log_connection_error(&err);
            }
        }
    });
}

/// Header read timeout, or an idle or write deadline from `IdleTimeout`
fn is_timeout(err: &hyper::Error) -> bool {
    err.is_timeout()
        || std::error::Error::source(err)
            .and_then(|source| source.downcast_ref::<io::Error>())
            .is_some_and(|e| e.kind() == io::ErrorKind::TimedOut)
}

/// Entry point for every HTTP request
///
/// Handler errors are logged and handed back to hyper, which drops the
/// connection.
pub async fn handle_request(
    req: Request<Incoming>,
    routes: &RouteTable,
    access_log: bool,
) -> Result<Response<RouterBody>> {
    if access_log {
        logger::log_request(req.method(), req.uri(), req.version());
    }

    let method = req.method().clone();
    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());
    drop(req);

    let result = routes.dispatch(&method, &target).await;
    match result {
        Ok(ref response) => {
            logger::log_debug(&format!("{method} {target} -> {}", response.status()));
        }
        Err(ref e) => {
            logger::log_error(&format!("Handler failed for {method} {target}: {e}"));
        }
    }
    result
}
