use std::collections::HashMap;

use tracing::error;

use crate::error::RouterError;
use crate::handler::{Handler, HandlerTrait};
use crate::request::{Method, Request};
use crate::response::Response;

/// One segment of a path pattern. A named segment (`:id`) matches any single
/// non-empty path segment and captures it; it never traverses `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    fn parse(pattern: &str) -> Result<Pattern, RouterError> {
        if !pattern.starts_with('/') {
            return Err(RouterError::InvalidPattern {
                pattern: pattern.to_owned(),
            });
        }

        let segments = pattern
            .split('/')
            .skip(1)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(segment.to_owned()),
            })
            .collect();

        Ok(Pattern {
            raw: pattern.to_owned(),
            segments,
        })
    }

    /// Matches `path` segment-for-segment. Returns the captured named
    /// segments on a hit, `None` on a miss.
    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut parts = path.split('/').skip(1);
        let mut params = HashMap::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if part != literal {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.to_owned());
                }
            }
        }

        // path must not have segments beyond the pattern
        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

struct Route {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

/// The open phase of the route table. Registrations happen here, during
/// single-threaded startup; [`seal`](RouterBuilder::seal) turns the builder
/// into an immutable [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    routes: Vec<Route>,
}

impl std::fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl RouterBuilder {
    pub fn new() -> RouterBuilder {
        RouterBuilder { routes: Vec::new() }
    }

    /// Appends a route. The `(method, pattern)` pair is the route's identity
    /// and must be unique; a duplicate is rejected and the table keeps the
    /// first registration.
    pub fn register(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Fn(Request) -> anyhow::Result<Response> + Send + Sync + 'static,
    ) -> Result<RouterBuilder, RouterError> {
        let pattern = Pattern::parse(pattern)?;
        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.pattern.raw == pattern.raw)
        {
            return Err(RouterError::DuplicateRoute {
                method,
                pattern: pattern.raw,
            });
        }

        self.routes.push(Route {
            method,
            pattern,
            handler: Box::new(handler),
        });
        Ok(self)
    }

    pub fn seal(self) -> Router {
        Router {
            routes: self.routes,
        }
    }
}

/// The sealed route table. Read-only, so concurrent `dispatch` calls need no
/// locking; the seal must happen-before any concurrent use (the server's
/// startup/serve order provides that).
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Maps a request to a handler and produces its response. Total: every
    /// outcome, including a failing handler, becomes a well-formed response.
    ///
    /// Routes are scanned in registration order; the first route whose method
    /// and pattern both match wins. A path that matches some pattern but no
    /// route with the request's method yields a 405 with an `Allow` header;
    /// no pattern match at all yields an empty 404.
    pub fn dispatch(&self, mut request: Request) -> Response {
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.matches(&request.path) else {
                continue;
            };
            if route.method != request.method {
                if !allowed.contains(&route.method) {
                    allowed.push(route.method);
                }
                continue;
            }

            let method = request.method;
            let path = request.path.clone();
            request.set_params(params);

            let response = match route.handler.handle(request) {
                Ok(response) => response,
                Err(e) => {
                    // Error boundary: handler failures never propagate out
                    // of dispatch and never leak their text to the client.
                    error!("Handler for {method} {path} failed: {e:?}");
                    Response::internal_error()
                }
            };
            return sanitize(response);
        }

        if allowed.is_empty() {
            Response::not_found()
        } else {
            Response::method_not_allowed(&allow_header(&allowed))
        }
    }
}

/// A status outside [100,599] is replaced: 200 when a body is present,
/// 404 when there is none.
fn sanitize(response: Response) -> Response {
    if (100..=599).contains(&response.status) {
        return response;
    }
    let status = if response.body.is_empty() { 404 } else { 200 };
    Response { status, ..response }
}

fn allow_header(allowed: &[Method]) -> String {
    allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
