// Server module entry point
// Owns the listener and the route table, accepts and serves connections

pub mod connection;
pub mod idle;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use connection::ConnectionSettings;
pub use listener::create_listener;
pub use signal::shutdown_signal;

use crate::config::Config;
use crate::error::Result;
use crate::logger;
use crate::router::RouteTable;

/// HTTP server bound to one listener and one route table
pub struct Server {
    listener: TcpListener,
    routes: Arc<RouteTable>,
    settings: Arc<ConnectionSettings>,
}

impl Server {
    /// Bind `server.host:server.port` and take ownership of the route table
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &Config, routes: RouteTable) -> Result<Self> {
        let listener = create_listener(config.socket_addr()?)?;
        let server = Self {
            listener,
            routes: Arc::new(routes),
            settings: Arc::new(ConnectionSettings::from_config(config)),
        };
        logger::log_server_start(&server.local_addr()?, config);
        Ok(server)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Serve until the process exits
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves
    ///
    /// Stops accepting once `shutdown` fires; connections already accepted
    /// finish on their own tasks.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            connection::accept_connection(
                                stream,
                                peer_addr,
                                &self.routes,
                                &self.settings,
                            );
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                () = &mut shutdown => {
                    logger::log_shutdown();
                    return Ok(());
                }
            }
        }
    }
}
