//! # Request Context
//!
//! An explicit value carrying everything the pipeline needs to know about the
//! current request: who is asking, which endpoint matched and with which view
//! arguments, the query and form parameters, the method, the headers, and
//! whether rendering is enabled.
//!
//! The context is built once per request and passed by reference into the
//! resolution chain and the renderer.

use crate::entity::Actor;
use http::{HeaderMap, Method, Uri, header};
use indexmap::IndexMap;

/// Path parameters captured by the matched route, in route order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewArgs {
    args: IndexMap<String, String>,
}

impl ViewArgs {
    /// Create an empty set of view arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one argument.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }

    /// Set an argument, replacing any previous value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.args.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// A copy of these arguments with `overrides` applied on top.
    pub fn merged(&self, overrides: &ViewArgs) -> ViewArgs {
        let mut out = self.clone();
        for (name, value) in overrides.iter() {
            out.insert(name, value);
        }
        out
    }

    /// Whether an argument is present.
    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    /// Iterate arguments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ViewArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = ViewArgs::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

/// A multi-valued parameter map, such as a query string or a form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: IndexMap<String, Vec<String>>,
}

impl Params {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `name`, keeping earlier ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// Builder-style [`append`](Self::append).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// The first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values for `name`, in the order they were supplied.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `name` was supplied at all.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Params::new();
        for (k, v) in iter {
            out.append(k, v);
        }
        out
    }
}

/// Everything the pipeline may consult about the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    actor: Option<Actor>,
    endpoint: String,
    view_args: ViewArgs,
    args: Params,
    form: Params,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    script_root: String,
    render: bool,
}

impl RequestContext {
    /// A GET request to `endpoint` with no arguments, headers or actor.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            actor: None,
            endpoint: endpoint.into(),
            view_args: ViewArgs::new(),
            args: Params::new(),
            form: Params::new(),
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            script_root: String::new(),
            render: true,
        }
    }

    /// Set the authenticated actor.
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Set the route's path parameters.
    pub fn with_view_args(mut self, view_args: ViewArgs) -> Self {
        self.view_args = view_args;
        self
    }

    /// Set the query-string parameters.
    pub fn with_args(mut self, args: Params) -> Self {
        self.args = args;
        self
    }

    /// Set the form-body parameters.
    pub fn with_form(mut self, form: Params) -> Self {
        self.form = form;
        self
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URI.
    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Set the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set a single `Accept` header value.
    pub fn with_accept(mut self, accept: &str) -> Self {
        if let Ok(value) = accept.parse() {
            self.headers.insert(header::ACCEPT, value);
        }
        self
    }

    /// Set the path prefix the application is mounted under.
    pub fn with_script_root(mut self, script_root: impl Into<String>) -> Self {
        self.script_root = script_root.into();
        self
    }

    /// Enable or disable rendering. With rendering off, views return the
    /// handler's reply unrendered.
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// The authenticated actor, if any.
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// The matched endpoint's name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The route's path parameters.
    pub fn view_args(&self) -> &ViewArgs {
        &self.view_args
    }

    /// Query-string parameters.
    pub fn args(&self) -> &Params {
        &self.args
    }

    /// Form-body parameters.
    pub fn form(&self) -> &Params {
        &self.form
    }

    /// First value for `name` from the query string, then the form.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.args.get(name).or_else(|| self.form.get(name))
    }

    /// All values for `name` from the query string followed by the form.
    pub fn value_list(&self, name: &str) -> Vec<&str> {
        self.args
            .get_all(name)
            .iter()
            .chain(self.form.get_all(name))
            .map(String::as_str)
            .collect()
    }

    /// Whether `name` was supplied in the query string or the form.
    pub fn has_value(&self, name: &str) -> bool {
        self.args.contains(name) || self.form.contains(name)
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Whether the method is read-only, which enables canonical-URL redirects.
    pub fn is_read_only(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    /// The request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The raw query string, if any.
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query().filter(|q| !q.is_empty())
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Accept` header, if present and valid UTF-8.
    pub fn accept(&self) -> Option<&str> {
        self.header_str(header::ACCEPT)
    }

    /// The `Referer` header, if present and valid UTF-8.
    pub fn referrer(&self) -> Option<&str> {
        self.header_str(header::REFERER)
    }

    /// Whether the request was made by `XMLHttpRequest`.
    pub fn is_xhr(&self) -> bool {
        self.header_str("x-requested-with")
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }

    /// The host the request was addressed to, from the URI or `Host` header.
    pub fn host(&self) -> Option<&str> {
        self.uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| self.header_str(header::HOST))
    }

    /// The path prefix the application is mounted under.
    pub fn script_root(&self) -> &str {
        &self.script_root
    }

    /// Whether rendering is enabled for this request.
    pub fn render_enabled(&self) -> bool {
        self.render
    }

    fn header_str(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_args_merge_overrides_in_place() {
        let current = ViewArgs::new().with("folder", "docs").with("page", "old");
        let merged = current.merged(&ViewArgs::new().with("page", "new"));
        assert_eq!(
            merged.iter().collect::<Vec<_>>(),
            vec![("folder", "docs"), ("page", "new")]
        );
        assert_eq!(current.get("page"), Some("old"));
    }

    #[test]
    fn test_values_prefer_query_then_form() {
        let ctx = RequestContext::new("search")
            .with_args(Params::new().with("q", "a").with("tag", "x"))
            .with_form(Params::new().with("q", "b").with("tag", "y"));
        assert_eq!(ctx.value("q"), Some("a"));
        assert_eq!(ctx.value_list("tag"), vec!["x", "y"]);
        assert!(!ctx.has_value("missing"));
    }

    #[test]
    fn test_read_only_methods() {
        let ctx = RequestContext::new("index");
        assert!(ctx.is_read_only());
        assert!(ctx.clone().with_method(Method::HEAD).is_read_only());
        assert!(!ctx.with_method(Method::POST).is_read_only());
    }

    #[test]
    fn test_header_accessors() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "example.com".parse().unwrap());
        headers.insert("x-requested-with", "XMLHttpRequest".parse().unwrap());
        let ctx = RequestContext::new("index")
            .with_headers(headers)
            .with_accept("text/html");
        assert_eq!(ctx.accept(), Some("text/html"));
        assert_eq!(ctx.host(), Some("example.com"));
        assert!(ctx.is_xhr());
        assert_eq!(ctx.referrer(), None);
    }
}
