//! Subway: a small regex router on top of hyper
//!
//! Requests are matched against an ordered table of `(pattern, method,
//! handler)` routes; the first route whose anchored pattern matches the
//! percent-decoded path and whose method filter accepts the request handles
//! it. Unmatched requests get a 404 page.
//!
//! ```no_run
//! use subway::{handler, RouteMethod, RouteTable};
//!
//! # fn main() -> subway::Result<()> {
//! let mut routes = RouteTable::new();
//! routes
//!     .register(handler::cors("*", "GET, POST")?)
//!     .register(handler::redirect("/", "/public/index.html", RouteMethod::Get)?)
//!     .register(handler::serve("/public")?);
//! assert_eq!(routes.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod router;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use router::{Route, RouteMethod, RouteRequest, RouteTable};
pub use server::Server;
