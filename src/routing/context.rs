use crate::routing::PathParams;
use actix_web::dev::Extensions;
use actix_web::http::Method;
use actix_web::web::{Bytes, Data};
use actix_web::HttpRequest;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::rc::Rc;

// Values owned by one request; dropped or cleared when its response is done
#[derive(Default)]
struct RequestScope {
    params: PathParams,
    values: Extensions,
}

/// Everything a handler knows about the request it is serving.
///
/// The context is created by the router after a successful match and handed
/// down the middleware chain by value. Clones share the same request-scoped
/// storage, which the clear-context middleware wipes once the handler returns,
/// so a clone kept alive past the response (e.g. moved into a spawned task)
/// can never observe another request's parameters.
#[derive(Clone)]
pub struct RequestContext {
    request: HttpRequest,
    body: Bytes,
    route: Rc<str>,
    scope: Rc<RefCell<RequestScope>>,
}

impl RequestContext {
    pub fn new(request: HttpRequest, body: Bytes, route: &str, params: PathParams) -> Self {
        Self {
            request,
            body,
            route: Rc::from(route),
            scope: Rc::new(RefCell::new(RequestScope {
                params,
                values: Extensions::new(),
            })),
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// The pattern of the route that matched, e.g. `/letters/:letterNo`.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.scope.borrow().params.get(name).map(str::to_string)
    }

    pub fn params(&self) -> PathParams {
        self.scope.borrow().params.clone()
    }

    /// Stores a value for the rest of this request only.
    pub fn insert<T: 'static>(&self, value: T) -> Option<T> {
        self.scope.borrow_mut().values.insert(value)
    }

    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.scope.borrow().values.get::<T>().cloned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        actix_web::web::Query::<Vec<(String, String)>>::from_query(self.request.query_string())
            .ok()
            .and_then(|query| {
                query
                    .into_inner()
                    .into_iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value)
            })
    }

    /// Shared application state registered with `App::app_data`.
    pub fn data<T: ?Sized + 'static>(&self) -> Result<Data<T>, anyhow::Error> {
        self.request.app_data::<Data<T>>().cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "Application data `{}` is not configured",
                std::any::type_name::<T>()
            )
        })
    }

    pub(crate) fn clear(&self) {
        // A borrow can only be outstanding here if a panic unwound through it,
        // in which case the scope is dropped along with the last clone anyway
        if let Ok(mut scope) = self.scope.try_borrow_mut() {
            scope.params.clear();
            scope.values.clear();
        }
    }
}
