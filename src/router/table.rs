//! Route table and dispatcher
//!
//! Routes are scanned in registration order and the first one whose pattern
//! and method filter both accept the request wins.

use std::future::Future;

use hyper::{Method, Response};

use super::decode::decode_path;
use super::route::{Route, RouteMethod, RouteRequest};
use crate::error::Result;
use crate::http::{self, RouterBody};

/// Ordered collection of routes
///
/// Append-only: routes are never removed or reordered once registered.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub const fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a route; earlier routes take precedence
    pub fn register(&mut self, route: Route) -> &mut Self {
        self.routes.push(route);
        self
    }

    pub fn get<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        self.add(pattern, RouteMethod::Get, handler)
    }

    pub fn post<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        self.add(pattern, RouteMethod::Post, handler)
    }

    pub fn put<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        self.add(pattern, RouteMethod::Put, handler)
    }

    pub fn delete<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        self.add(pattern, RouteMethod::Delete, handler)
    }

    pub fn options<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        self.add(pattern, RouteMethod::Options, handler)
    }

    /// Register a route accepting every method
    pub fn any<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        self.add(pattern, RouteMethod::Any, handler)
    }

    fn add<F, Fut>(&mut self, pattern: &str, method: RouteMethod, handler: F) -> Result<&mut Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<RouterBody>>> + Send + 'static,
    {
        Ok(self.register(Route::new(pattern, method, handler)?))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route accepting `method` and the decoded `path`
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, Vec<Option<String>>)> {
        self.routes
            .iter()
            .find_map(|route| route.matches(method, path).map(|caps| (route, caps)))
    }

    /// Dispatch a request target (`path[?query]`) to the winning handler
    ///
    /// Unmatched requests get a 404 page naming the URL; undecodable paths a
    /// 400. Handler errors are returned as-is.
    pub async fn dispatch(&self, method: &Method, raw_url: &str) -> Result<Response<RouterBody>> {
        let (raw_path, query) = match raw_url.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (raw_url, None),
        };

        let Ok(path) = decode_path(raw_path) else {
            return Ok(http::build_400_response(raw_url));
        };

        let Some((route, captures)) = self.find(method, &path) else {
            return Ok(http::build_404_response(raw_url));
        };

        route
            .call(RouteRequest::new(method.clone(), path, query, captures))
            .await
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
