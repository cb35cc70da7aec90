//! Version-scoped request router.
//!
//! Routes live in radix trees, one per HTTP method. A router holds one set of
//! trees for routes outside any version (health probes) and one per declared
//! [`ApiVersion`] scope.
//!
//! Dispatch order for a request:
//!
//! 1. Unscoped routes, if one matches path and method.
//! 2. Host constraint, if configured.
//! 3. Version scopes **in declaration order**; the first whose
//!    [`VersionMatcher`] predicate holds is selected, and only its routes are
//!    searched. No scope → `404`.
//! 4. Negotiate representation and locale. An unsupported `Accept` is `406`
//!    unless the request hit an unscoped route, which picks its own content
//!    type.
//!
//! `HEAD` falls back to the `GET` route of the same path and answers without
//! a body.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::context::Context;
use crate::error::ApiError;
use crate::handler::{BoxedHandler, Handler};
use crate::i18n::Translations;
use crate::method::Method;
use crate::negotiate::{Negotiation, Negotiator, NotAcceptable, Representation};
use crate::request::Request;
use crate::resource::{ResourceHandler, Schema};
use crate::response::Response;
use crate::version::{ApiVersion, VersionMatcher};

// ── Route trees ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Routes {
    trees: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    /// The path exists under another method.
    WrongMethod,
    Missing,
}

impl Routes {
    fn insert(&mut self, method: Method, path: &str, handler: impl Handler) {
        self.trees
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
    }

    fn lookup(&self, method: Method, path: &str) -> Lookup {
        let at = move |method: Method| self.trees.get(&method).and_then(|tree| tree.at(path).ok());
        let found = match at(method) {
            None if method == Method::Head => at(Method::Get),
            found => found,
        };
        if let Some(matched) = found {
            let params = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(Arc::clone(matched.value), params);
        }
        let elsewhere = self
            .trees
            .iter()
            .any(|(m, tree)| *m != method && tree.at(path).is_ok());
        if elsewhere { Lookup::WrongMethod } else { Lookup::Missing }
    }
}

// ── Scope ─────────────────────────────────────────────────────────────────────

/// Routes that answer only when their [`ApiVersion`] matches the request.
pub struct Scope {
    version: ApiVersion,
    routes: Routes,
}

impl Scope {
    fn new(version: ApiVersion) -> Self {
        Self { version, routes: Routes::default() }
    }

    pub fn version(&self) -> &ApiVersion { &self.version }

    /// Register a handler for a method + path pair. Path parameters use
    /// `{name}` syntax.
    ///
    /// # Panics
    ///
    /// Panics if the path is not a valid route or conflicts with one already
    /// registered in this scope.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes.insert(method, path, handler);
        self
    }

    /// Registers the list/show/create/update/delete routes of a resource.
    pub fn resource<S: Schema>(self, handler: ResourceHandler<S>) -> Self {
        handler.mount(self)
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router. Build it once at startup and hand it to
/// [`Server::serve`](crate::Server::serve), or call [`Router::handle`]
/// directly.
///
/// ```rust
/// use std::sync::Arc;
/// use brains::{ApiVersion, Method, MemoryStore, ResourceHandler, Router, health};
/// use brains::domain::Human;
///
/// let humans = Arc::new(MemoryStore::new());
/// let app = Router::new("zombies")
///     .on(Method::Get, "/healthz", health::liveness)
///     .version(ApiVersion::new("v1"), |scope| {
///         scope.resource(ResourceHandler::<Human>::new(humans.clone()))
///     })
///     .version(ApiVersion::new("v2").as_default(), |scope| {
///         scope.resource(ResourceHandler::<Human>::new(humans.clone()))
///     });
/// ```
pub struct Router {
    routes: Routes,
    scopes: Vec<Scope>,
    matcher: VersionMatcher,
    negotiator: Negotiator,
    translations: Arc<Translations>,
    host: Option<String>,
}

struct Resolved<'a> {
    handler: BoxedHandler,
    params: HashMap<String, String>,
    version: Option<&'a str>,
}

impl Router {
    /// `namespace` is the vendor segment clients put in `Accept`:
    /// `application/vnd.<namespace>.<version>+json`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            routes: Routes::default(),
            scopes: Vec::new(),
            matcher: VersionMatcher::new(namespace),
            negotiator: Negotiator::new("en"),
            translations: Arc::new(Translations::default()),
            host: None,
        }
    }

    /// Register a route outside every version scope. These answer regardless
    /// of `Accept` and of the host constraint.
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting route.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes.insert(method, path, handler);
        self
    }

    /// Declare a version scope and fill it with routes.
    ///
    /// Order matters: scopes are tried in the order they are declared and the
    /// first match wins. A default version matches every request, so any
    /// version declared after it is unreachable. Declare the default last.
    ///
    /// # Panics
    ///
    /// Panics if a second default version is declared or an identifier is
    /// reused.
    pub fn version(mut self, version: ApiVersion, build: impl FnOnce(Scope) -> Scope) -> Self {
        if version.is_default() {
            if let Some(existing) = self.scopes.iter().find(|s| s.version.is_default()) {
                panic!(
                    "api version `{}` is marked default but `{}` already is",
                    version.identifier(),
                    existing.version.identifier(),
                );
            }
        }
        if self.scopes.iter().any(|s| s.version.identifier() == version.identifier()) {
            panic!("api version `{}` declared twice", version.identifier());
        }
        self.scopes.push(build(Scope::new(version)));
        self
    }

    /// Only answer versioned routes for this `Host` (case-insensitive, port
    /// ignored). Other hosts get `404`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn negotiator(mut self, negotiator: Negotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    pub fn translations(mut self, translations: Translations) -> Self {
        self.translations = Arc::new(translations);
        self
    }

    /// Declared versions in dispatch order.
    pub fn versions(&self) -> impl Iterator<Item = &ApiVersion> {
        self.scopes.iter().map(Scope::version)
    }

    /// The first scope whose version matches `req`.
    pub fn select(&self, req: &Request) -> Option<&ApiVersion> {
        self.select_scope(req).map(Scope::version)
    }

    fn select_scope(&self, req: &Request) -> Option<&Scope> {
        self.scopes
            .iter()
            .find(|scope| self.matcher.matches(&scope.version, req))
    }

    fn accepts_host(&self, req: &Request) -> bool {
        self.host.as_deref().is_none_or(|expected| {
            req.header("host")
                .map(strip_port)
                .is_some_and(|host| host.eq_ignore_ascii_case(expected))
        })
    }

    /// Routes one request and produces one response. Every failure becomes a
    /// response; nothing here returns an error.
    pub async fn handle(&self, req: Request) -> Response {
        let head = req.method() == Method::Head;
        let res = self.dispatch(req).await;
        if head { res.without_body() } else { res }
    }

    async fn dispatch(&self, mut req: Request) -> Response {
        let resolved = self.resolve(&req);
        let negotiation = match self.negotiator.negotiate(&req) {
            Ok(negotiation) => negotiation,
            // Unscoped routes pick their own content type.
            Err(NotAcceptable) if matches!(resolved, Ok(Resolved { version: None, .. })) => {
                Negotiation {
                    representation: Representation::Json,
                    locale: self.negotiator.locale(&req),
                }
            }
            // Nothing the client accepts can carry a structured body.
            Err(NotAcceptable) => {
                let locale = self.negotiator.locale(&req);
                let text = self.translations.lookup(&locale, "not_acceptable").to_owned();
                return Response::builder()
                    .status(ApiError::NotAcceptable.status())
                    .header("content-language", &locale)
                    .text(text);
            }
        };
        let cx = Context::new(negotiation, Arc::clone(&self.translations));

        let (handler, cx) = match resolved {
            Ok(Resolved { handler, params, version }) => {
                debug!(version = ?version, "route matched");
                req.params = params;
                let cx = match version {
                    Some(id) => cx.with_version(id),
                    None => cx,
                };
                (handler, cx)
            }
            Err(e) => {
                debug!(error = %e, "request not routed");
                let res = e.into_response(&cx);
                return res.with_default_header("content-language", cx.locale());
            }
        };

        let locale = cx.locale().to_owned();
        handler
            .call(req, cx)
            .await
            .with_default_header("content-language", &locale)
    }

    fn resolve(&self, req: &Request) -> Result<Resolved<'_>, ApiError> {
        let path_known = match self.routes.lookup(req.method(), req.path()) {
            Lookup::Found(handler, params) => {
                return Ok(Resolved { handler, params, version: None });
            }
            Lookup::WrongMethod => true,
            Lookup::Missing => false,
        };
        let unrouted = |otherwise: ApiError| {
            if path_known { ApiError::MethodNotAllowed } else { otherwise }
        };

        if !self.accepts_host(req) {
            return Err(unrouted(ApiError::NotFound));
        }
        let scope = self
            .select_scope(req)
            .ok_or_else(|| unrouted(ApiError::NoVersionMatch))?;

        match scope.routes.lookup(req.method(), req.path()) {
            Lookup::Found(handler, params) => Ok(Resolved {
                handler,
                params,
                version: Some(scope.version.identifier()),
            }),
            Lookup::WrongMethod => Err(ApiError::MethodNotAllowed),
            Lookup::Missing => Err(unrouted(ApiError::NotFound)),
        }
    }
}

pub(crate) fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
