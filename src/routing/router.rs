use crate::middleware::MiddlewareChain;
use crate::routing::{
    decode_segments, Handler, HandlerResult, PathParams, PathPattern, RequestContext,
    RouterError, StaticMount,
};
use actix_web::http::header::{ALLOW, LOCATION};
use actix_web::http::{Method, StatusCode};
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse};
use std::path::PathBuf;
use std::sync::Arc;

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Arc<dyn Handler>,
}

struct Mount {
    files: StaticMount,
    handler: Arc<dyn Handler>,
}

enum Lookup<'a> {
    Found(&'a Route, PathParams),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Method + pattern route table with static file mounts.
///
/// Routes are registered at startup, before the router is shared between
/// workers; afterwards it is only read, so no locking is involved in dispatch.
/// Every handler and static mount is wrapped with the router's middleware
/// chain on registration.
pub struct Router {
    chain: MiddlewareChain,
    routes: Vec<Route>,
    mounts: Vec<Mount>,
}

impl Router {
    pub fn new(chain: MiddlewareChain) -> Self {
        Self {
            chain,
            routes: Vec::new(),
            mounts: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<&mut Self, RouterError> {
        let pattern = PathPattern::parse(pattern)?;
        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.pattern.same_shape(&pattern))
        {
            return Err(RouterError::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            });
        }

        self.routes.push(Route {
            method,
            pattern,
            handler: self.chain.then(handler),
        });
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterError> {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterError> {
        self.register(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterError> {
        self.register(Method::PUT, pattern, handler)
    }

    pub fn delete(
        &mut self,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::DELETE, pattern, handler)
    }

    /// Serves `directory` under `prefix`; matching paths never reach the route table.
    pub fn serve_files(
        &mut self,
        prefix: &str,
        directory: impl Into<PathBuf>,
    ) -> Result<&mut Self, RouterError> {
        if !prefix.starts_with('/')
            || prefix.len() < 2
            || prefix.ends_with('/')
            || prefix.contains(&[':', '*'][..])
        {
            return Err(RouterError::InvalidPrefix(prefix.to_string()));
        }
        if self.mounts.iter().any(|mount| mount.files.prefix() == prefix) {
            return Err(RouterError::DuplicateMount(prefix.to_string()));
        }

        let files = StaticMount::new(prefix, directory.into());
        let handler = self.chain.then(files.clone());
        self.mounts.push(Mount { files, handler });
        Ok(self)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes
            .iter()
            .map(|route| (&route.method, route.pattern.as_str()))
    }

    pub async fn dispatch(&self, request: HttpRequest, body: Bytes) -> HttpResponse {
        let path = request.path().to_string();

        if let Some(mount) = self
            .mounts
            .iter()
            .find(|mount| mount.files.relative(&path).is_some())
        {
            let route = mount.files.route();
            let ctx = RequestContext::new(request, body, route, PathParams::default());
            return render(mount.handler.call(ctx).await);
        }

        let Some(segments) = decode_segments(&path) else {
            return HttpResponse::BadRequest().finish();
        };

        match self.lookup(request.method(), &segments) {
            Lookup::Found(route, params) => {
                let ctx = RequestContext::new(request, body, route.pattern.as_str(), params);
                render(route.handler.call(ctx).await)
            }
            Lookup::MethodNotAllowed(allowed) => {
                let allowed = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                HttpResponse::MethodNotAllowed()
                    .insert_header((ALLOW, allowed))
                    .finish()
            }
            Lookup::NotFound => self
                .redirect_trailing_slash(&request, &path)
                .unwrap_or_else(|| HttpResponse::NotFound().finish()),
        }
    }

    fn lookup(&self, method: &Method, segments: &[String]) -> Lookup<'_> {
        let mut best: Option<(&Route, PathParams)> = None;
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.matches_segments(segments) else {
                continue;
            };
            if route.method != *method {
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
                continue;
            }
            let more_specific = match &best {
                Some((current, _)) => route.pattern.specificity_cmp(&current.pattern).is_gt(),
                None => true,
            };
            if more_specific {
                best = Some((route, params));
            }
        }

        match best {
            Some((route, params)) => Lookup::Found(route, params),
            None if !allowed.is_empty() => Lookup::MethodNotAllowed(allowed),
            None => Lookup::NotFound,
        }
    }

    // `/getUsers/` redirects to `/getUsers` and the other way around
    fn redirect_trailing_slash(&self, request: &HttpRequest, path: &str) -> Option<HttpResponse> {
        let candidate = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
            Some(_) => return None,
            None => format!("{}/", path),
        };

        let segments = decode_segments(&candidate)?;
        if !matches!(
            self.lookup(request.method(), &segments),
            Lookup::Found(..)
        ) {
            return None;
        }

        let status = if request.method() == Method::GET || request.method() == Method::HEAD {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::PERMANENT_REDIRECT
        };
        let location = match request.query_string() {
            "" => candidate,
            query => format!("{}?{}", candidate, query),
        };

        Some(
            HttpResponse::build(status)
                .insert_header((LOCATION, location))
                .finish(),
        )
    }
}

fn render(result: HandlerResult) -> HttpResponse {
    match result {
        Ok(response) => response,
        Err(error) => error.error_response(),
    }
}
