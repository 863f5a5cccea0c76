//! # Application
//!
//! An [`App`] owns the URL map, the capabilities views consume, and one view
//! per endpoint. [`App::dispatch`] takes an `http::Request` all the way to an
//! `http::Response`:
//!
//! 1. match the path against the URL map (404 if nothing matches)
//! 2. build the [`RequestContext`] (the actor comes from request extensions)
//! 3. run the endpoint's view
//! 4. turn redirects into `302 Found` and errors into status responses

use crate::{
    handler::ViewHandler,
    view::{View, ViewOutcome},
};
use futures::future::BoxFuture;
use http::{HeaderValue, Request, StatusCode, header};
use std::{collections::HashMap, sync::Arc};
use tracing::{Instrument, debug, info_span, warn};
use vestibule_core::{
    Actor, ConfigError, EntityLookup, Params, RequestContext, RequestError, Response,
    TemplateEngine,
};
use vestibule_std::{UrlMap, parse_params};

/// Object-safe view, so views with different handlers share one map.
trait DynView<L, T>: Send + Sync {
    fn call_dyn<'a>(
        &'a self,
        ctx: &'a RequestContext,
        lookup: &'a L,
        templates: &'a T,
    ) -> BoxFuture<'a, Result<ViewOutcome, RequestError>>;
}

impl<H, L, T> DynView<L, T> for View<H>
where
    H: ViewHandler,
    L: EntityLookup,
    T: TemplateEngine,
{
    fn call_dyn<'a>(
        &'a self,
        ctx: &'a RequestContext,
        lookup: &'a L,
        templates: &'a T,
    ) -> BoxFuture<'a, Result<ViewOutcome, RequestError>> {
        Box::pin(self.call(ctx, lookup, templates))
    }
}

/// A routed set of views over shared capabilities.
pub struct App<L, T> {
    urls: UrlMap,
    lookup: L,
    templates: T,
    views: HashMap<String, Arc<dyn DynView<L, T>>>,
}

impl<L, T> std::fmt::Debug for App<L, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut endpoints: Vec<_> = self.views.keys().collect();
        endpoints.sort();
        f.debug_struct("App")
            .field("urls", &self.urls)
            .field("endpoints", &endpoints)
            .finish()
    }
}

impl<L, T> App<L, T>
where
    L: EntityLookup + 'static,
    T: TemplateEngine + 'static,
{
    /// Start declaring an app.
    pub fn builder(urls: UrlMap, lookup: L, templates: T) -> AppBuilder<L, T> {
        AppBuilder {
            urls,
            lookup,
            templates,
            views: Vec::new(),
        }
    }

    /// The URL map.
    pub fn urls(&self) -> &UrlMap {
        &self.urls
    }

    /// The entity lookup backend.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// The template engine.
    pub fn templates(&self) -> &T {
        &self.templates
    }

    /// Build the request context for `request`, or `None` if no route
    /// matches.
    pub fn context_for(&self, request: &Request<String>) -> Option<RequestContext> {
        let path = strip_script_root(request.uri().path(), self.urls.script_root());
        let (endpoint, view_args) = self.urls.resolve(path)?;

        let args = request.uri().query().map(parse_params).unwrap_or_default();
        let form = if is_form(request) {
            parse_params(request.body())
        } else {
            Params::new()
        };
        let mut ctx = RequestContext::new(endpoint)
            .with_view_args(view_args)
            .with_args(args)
            .with_form(form)
            .with_method(request.method().clone())
            .with_uri(request.uri().clone())
            .with_headers(request.headers().clone())
            .with_script_root(self.urls.script_root());
        if let Some(actor) = request.extensions().get::<Actor>() {
            ctx = ctx.with_actor(actor.clone());
        }
        Some(ctx)
    }

    /// Run the endpoint's view for an already-built context.
    pub async fn handle(&self, ctx: &RequestContext) -> Result<Response, RequestError> {
        let view = self
            .views
            .get(ctx.endpoint())
            .ok_or(RequestError::NotFound)?;
        match view.call_dyn(ctx, &self.lookup, &self.templates).await? {
            ViewOutcome::Output(output) => Ok(output.into_response()),
            ViewOutcome::Redirect(redirect) => Ok(redirect.into_response(&self.urls)?),
        }
    }

    /// Serve one request.
    pub async fn dispatch(&self, request: Request<String>) -> Response {
        let Some(ctx) = self.context_for(&request) else {
            debug!(method = %request.method(), path = request.uri().path(), "no route");
            return error_response(StatusCode::NOT_FOUND);
        };

        let span = info_span!(
            "request",
            method = %ctx.method(),
            path = ctx.uri().path(),
            endpoint = ctx.endpoint()
        );
        async {
            match self.handle(&ctx).await {
                Ok(response) => {
                    debug!(status = %response.status(), "responded");
                    response
                }
                Err(err) => {
                    let status = err.status();
                    if status.is_server_error() {
                        warn!(error = %err, %status, "request failed");
                    } else {
                        debug!(error = %err, %status, "request rejected");
                    }
                    error_response(status)
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn strip_script_root<'a>(path: &'a str, script_root: &str) -> &'a str {
    if script_root.is_empty() {
        return path;
    }
    match path.strip_prefix(script_root) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn is_form(request: &Request<String>) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn error_response(status: StatusCode) -> Response {
    let mut response = Response::new(String::new());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

/// Declares an [`App`].
pub struct AppBuilder<L, T> {
    urls: UrlMap,
    lookup: L,
    templates: T,
    views: Vec<(String, Arc<dyn DynView<L, T>>)>,
}

impl<L, T> AppBuilder<L, T>
where
    L: EntityLookup + 'static,
    T: TemplateEngine + 'static,
{
    /// Serve `endpoint` with `view`.
    pub fn view<H: ViewHandler>(mut self, endpoint: impl Into<String>, view: View<H>) -> Self {
        let view: Arc<dyn DynView<L, T>> = Arc::new(view);
        self.views.push((endpoint.into(), view));
        self
    }

    /// Validate and freeze the app. Every view's endpoint must be routed, and
    /// at most once.
    pub fn build(self) -> Result<App<L, T>, ConfigError> {
        let mut views = HashMap::with_capacity(self.views.len());
        for (endpoint, view) in self.views {
            if !self.urls.contains(&endpoint) {
                return Err(ConfigError::UnknownEndpoint(endpoint));
            }
            if views.contains_key(&endpoint) {
                return Err(ConfigError::DuplicateEndpoint(endpoint));
            }
            views.insert(endpoint, view);
        }
        Ok(App {
            urls: self.urls,
            lookup: self.lookup,
            templates: self.templates,
            views,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_script_root() {
        assert_eq!(strip_script_root("/a/b", ""), "/a/b");
        assert_eq!(strip_script_root("/app/a", "/app"), "/a");
        assert_eq!(strip_script_root("/app", "/app"), "/");
        assert_eq!(strip_script_root("/application", "/app"), "/application");
    }
}
