//! HTTP protocol layer module
//!
//! Response body type, MIME lookup and response builders shared by the
//! dispatcher and the helper routes.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_400_response, build_403_response, build_404_response, build_error_response,
    build_file_response, build_json_response, build_preflight_response, build_redirect_response,
    build_text_response, error_page, escape_html, RouterBody,
};
