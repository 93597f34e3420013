//! Route definition
//!
//! A route binds a path pattern and a method filter to a handler.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use hyper::{Method, Response};
use regex::Regex;

use crate::error::Result;
use crate::http::RouterBody;

/// Future returned by a route handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<RouterBody>>> + Send>>;

/// Type-erased route handler
pub type Handler = Arc<dyn Fn(RouteRequest) -> HandlerFuture + Send + Sync>;

/// Method filter of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    /// Matches every request method
    Any,
}

impl RouteMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Any => "*",
        }
    }

    /// Case-sensitive comparison against the request method token
    pub fn matches(self, method: &Method) -> bool {
        self == Self::Any || self.as_str() == method.as_str()
    }
}

impl FromStr for RouteMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "*" => Ok(Self::Any),
            other => Err(format!("unsupported route method '{other}'")),
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request view handed to the winning handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    method: Method,
    path: String,
    query: Option<String>,
    captures: Vec<Option<String>>,
}

impl RouteRequest {
    pub const fn new(
        method: Method,
        path: String,
        query: Option<String>,
        captures: Vec<Option<String>>,
    ) -> Self {
        Self {
            method,
            path,
            query,
            captures,
        }
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Percent-decoded request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Capture group `index`; 0 is the whole match
    ///
    /// `None` both for out-of-range indices and for optional groups that did
    /// not participate in the match.
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(Option::as_deref)
    }

    pub fn captures(&self) -> &[Option<String>] {
        &self.captures
    }

    /// Parenthesized groups, skipping the whole match
    pub fn groups(&self) -> impl Iterator<Item = Option<&str>> {
        self.captures.iter().skip(1).map(Option::as_deref)
    }
}

/// A compiled (pattern, method, handler) binding
#[derive(Clone)]
pub struct Route {
    source: String,
    regex: Regex,
    method: RouteMethod,
    handler: Handler,
}

impl Route {
    /// Compile `pattern` and bind it to `handler`
    ///
    /// The pattern must match the whole decoded path; it is anchored here so
    /// callers may write it with or without `^`/`$`.
    pub fn new<F, Fut>(pattern: &str, method: RouteMethod, handler: F) -> Result<Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |req| Box::pin(handler(req)) as HandlerFuture);
        Self::with_handler(pattern, method, handler)
    }

    /// Same as [`Route::new`] for an already type-erased handler
    pub fn with_handler(pattern: &str, method: RouteMethod, handler: Handler) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            method,
            handler,
        })
    }

    /// Pattern as registered
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub const fn method(&self) -> RouteMethod {
        self.method
    }

    /// Match `path` and `method`, returning the capture groups on success
    pub fn matches(&self, method: &Method, path: &str) -> Option<Vec<Option<String>>> {
        if !self.method.matches(method) {
            return None;
        }
        let caps = self.regex.captures(path)?;
        Some(
            caps.iter()
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    pub fn call(&self, req: RouteRequest) -> HandlerFuture {
        (self.handler)(req)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.source)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
