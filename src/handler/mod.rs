//! Prebuilt routes
//!
//! Ready-made `Route`s for common needs: CORS preflight replies, fixed
//! redirects and static file serving from a directory.

pub mod cors;
pub mod redirect;
pub mod static_files;

pub use cors::cors;
pub use redirect::redirect;
pub use static_files::{serve, serve_from};
