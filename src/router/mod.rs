//! Routing module
//!
//! Ordered, regex-based request routing:
//! - `Route`: path pattern + method filter + handler
//! - `RouteTable`: registration-ordered routes and the dispatcher
//! - Strict percent-decoding of request paths before matching

mod decode;
mod route;
mod table;

pub use decode::decode_path;
pub use route::{Handler, HandlerFuture, Route, RouteMethod, RouteRequest};
pub use table::RouteTable;
