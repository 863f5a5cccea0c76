//! # URL Map
//!
//! Binds URL patterns to endpoint names in both directions: incoming paths
//! are matched with `matchit`, and redirects and links are built back from an
//! endpoint plus view arguments.
//!
//! Patterns use `{name}` for one segment and `{*rest}` for the remainder of
//! the path:
//!
//! ```rust,ignore
//! let urls = UrlMap::builder()
//!     .route("/", "index")
//!     .route("/{folder_name}/{page_name}", "show_page")
//!     .build()?;
//!
//! let (endpoint, args) = urls.resolve("/docs/intro").unwrap();
//! assert_eq!(urls.url_for(endpoint, &args)?, "/docs/intro");
//! ```

use indexmap::IndexMap;
use matchit::{Match, Router as InnerRouter};
use tracing::debug;
use url::form_urlencoded;
use vestibule_core::{ConfigError, Params, RequestContext, ViewArgs};

/// Name of the endpoint [`UrlMap::index_url`] looks for.
pub const INDEX_ENDPOINT: &str = "index";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

#[derive(Debug, Clone)]
struct Route {
    pattern: String,
    segments: Vec<Segment>,
}

impl Route {
    fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRoute {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };
        if !pattern.starts_with('/') {
            return Err(invalid("patterns must start with `/`"));
        }

        let mut segments = Vec::new();
        let mut rest = pattern;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let close = rest[open..]
                .find('}')
                .map(|close| open + close)
                .ok_or_else(|| invalid("unclosed `{`"))?;
            let name = &rest[open + 1..close];
            match name.strip_prefix('*') {
                Some("") => return Err(invalid("empty parameter name")),
                Some(name) => segments.push(Segment::CatchAll(name.to_string())),
                None if name.is_empty() => return Err(invalid("empty parameter name")),
                None => segments.push(Segment::Param(name.to_string())),
            }
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    fn build(&self, endpoint: &str, args: &ViewArgs) -> Result<String, ConfigError> {
        let missing = |argument: &str| ConfigError::MissingViewArg {
            endpoint: endpoint.to_string(),
            argument: argument.to_string(),
        };

        let mut path = String::with_capacity(self.pattern.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(name) => {
                    let value = args.get(name).ok_or_else(|| missing(name))?;
                    path.push_str(&urlencoding::encode(value));
                }
                Segment::CatchAll(name) => {
                    let value = args.get(name).ok_or_else(|| missing(name))?;
                    let encoded: Vec<_> = value.split('/').map(urlencoding::encode).collect();
                    path.push_str(&encoded.join("/"));
                }
            }
        }

        let mut extra = args
            .iter()
            .filter(|(name, _)| !self.params().any(|param| param == *name))
            .peekable();
        if extra.peek().is_some() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(extra)
                .finish();
            path.push('?');
            path.push_str(&query);
        }
        Ok(path)
    }
}

/// An immutable, validated URL map.
#[derive(Clone)]
pub struct UrlMap {
    router: InnerRouter<String>,
    routes: IndexMap<String, Route>,
    script_root: String,
}

impl std::fmt::Debug for UrlMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlMap")
            .field("routes", &self.routes)
            .field("script_root", &self.script_root)
            .finish()
    }
}

impl UrlMap {
    /// Start declaring a URL map.
    pub fn builder() -> UrlMapBuilder {
        UrlMapBuilder::default()
    }

    /// The path prefix every built URL starts with.
    pub fn script_root(&self) -> &str {
        &self.script_root
    }

    /// Whether `endpoint` is registered.
    pub fn contains(&self, endpoint: &str) -> bool {
        self.routes.contains_key(endpoint)
    }

    /// The pattern registered for `endpoint`.
    pub fn pattern(&self, endpoint: &str) -> Option<&str> {
        self.routes.get(endpoint).map(|route| route.pattern.as_str())
    }

    /// Match a request path (with the script root already stripped).
    ///
    /// Captured parameters are percent-decoded; a capture that does not
    /// decode to UTF-8 fails the match.
    pub fn resolve(&self, path: &str) -> Option<(&str, ViewArgs)> {
        let Match { value, params } = self.router.at(path).ok()?;
        let mut args = ViewArgs::new();
        for (name, raw) in params.iter() {
            match urlencoding::decode(raw) {
                Ok(decoded) => args.insert(name, decoded),
                Err(_) => {
                    debug!(path, param = name, "undecodable path parameter");
                    return None;
                }
            }
        }
        Some((value.as_str(), args))
    }

    /// Build the URL of `endpoint`.
    ///
    /// Pattern parameters are substituted; any other arguments become the
    /// query string.
    pub fn url_for(&self, endpoint: &str, args: &ViewArgs) -> Result<String, ConfigError> {
        let route = self
            .routes
            .get(endpoint)
            .ok_or_else(|| ConfigError::UnknownEndpoint(endpoint.to_string()))?;
        let path = route.build(endpoint, args)?;
        Ok(format!("{}{path}", self.script_root))
    }

    /// The URL of the `index` endpoint, else the script root, else `/`.
    pub fn index_url(&self) -> String {
        self.url_for(INDEX_ENDPOINT, &ViewArgs::new())
            .unwrap_or_else(|_| match self.script_root.as_str() {
                "" => "/".to_string(),
                root => root.to_string(),
            })
    }
}

/// The URL of the current request: its endpoint and view arguments plus the
/// raw query string.
pub fn current_url(ctx: &RequestContext, urls: &UrlMap) -> Result<String, ConfigError> {
    let url = urls.url_for(ctx.endpoint(), ctx.view_args())?;
    Ok(match ctx.query_string() {
        Some(query) => format!("{url}?{query}"),
        None => url,
    })
}

/// Decode an `application/x-www-form-urlencoded` string, such as a query
/// string or a form body, keeping repeated names.
pub fn parse_params(encoded: &str) -> Params {
    form_urlencoded::parse(encoded.as_bytes()).collect()
}

/// Declares a [`UrlMap`].
#[derive(Debug, Default)]
pub struct UrlMapBuilder {
    routes: Vec<(String, String)>,
    script_root: String,
}

impl UrlMapBuilder {
    /// Bind `pattern` to `endpoint`.
    pub fn route(mut self, pattern: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.routes.push((pattern.into(), endpoint.into()));
        self
    }

    /// Mount the map under a path prefix such as `/app`.
    pub fn script_root(mut self, script_root: impl Into<String>) -> Self {
        self.script_root = script_root.into().trim_end_matches('/').to_string();
        self
    }

    /// Validate and freeze the map.
    pub fn build(self) -> Result<UrlMap, ConfigError> {
        let mut router = InnerRouter::new();
        let mut routes = IndexMap::with_capacity(self.routes.len());
        for (pattern, endpoint) in self.routes {
            if routes.contains_key(&endpoint) {
                return Err(ConfigError::DuplicateEndpoint(endpoint));
            }
            let route = Route::parse(&pattern)?;
            router
                .insert(pattern.clone(), endpoint.clone())
                .map_err(|e| ConfigError::InvalidRoute {
                    pattern,
                    reason: e.to_string(),
                })?;
            routes.insert(endpoint, route);
        }
        Ok(UrlMap {
            router,
            routes,
            script_root: self.script_root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Uri;

    fn urls() -> UrlMap {
        UrlMap::builder()
            .route("/", "index")
            .route("/{folder_name}/{page_name}", "show_page")
            .route("/files/{*path}", "file")
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_decodes_params() {
        let urls = urls();
        let (endpoint, args) = urls.resolve("/my%20docs/intro").unwrap();
        assert_eq!(endpoint, "show_page");
        assert_eq!(args.get("folder_name"), Some("my docs"));
        assert_eq!(args.get("page_name"), Some("intro"));

        let (endpoint, args) = urls.resolve("/files/a/b.txt").unwrap();
        assert_eq!(endpoint, "file");
        assert_eq!(args.get("path"), Some("a/b.txt"));

        assert!(urls.resolve("/a/b/c").is_none());
    }

    #[test]
    fn test_url_for_encodes_and_adds_query() {
        let urls = urls();
        let args = ViewArgs::new()
            .with("folder_name", "my docs")
            .with("page_name", "intro")
            .with("tab", "history");
        assert_eq!(
            urls.url_for("show_page", &args).unwrap(),
            "/my%20docs/intro?tab=history"
        );
        let file = ViewArgs::new().with("path", "a b/c.txt");
        assert_eq!(urls.url_for("file", &file).unwrap(), "/files/a%20b/c.txt");
    }

    #[test]
    fn test_url_for_errors() {
        let urls = urls();
        assert_eq!(
            urls.url_for("nope", &ViewArgs::new()).unwrap_err(),
            ConfigError::UnknownEndpoint("nope".into())
        );
        assert_eq!(
            urls.url_for("show_page", &ViewArgs::new().with("folder_name", "x"))
                .unwrap_err(),
            ConfigError::MissingViewArg {
                endpoint: "show_page".into(),
                argument: "page_name".into()
            }
        );
    }

    #[test]
    fn test_index_url_fallbacks() {
        assert_eq!(urls().index_url(), "/");

        let mounted = UrlMap::builder()
            .script_root("/app/")
            .route("/{page}", "page")
            .build()
            .unwrap();
        assert_eq!(mounted.index_url(), "/app");
        assert_eq!(
            mounted.url_for("page", &ViewArgs::new().with("page", "x")).unwrap(),
            "/app/x"
        );

        let bare = UrlMap::builder().build().unwrap();
        assert_eq!(bare.index_url(), "/");
    }

    #[test]
    fn test_current_url_keeps_raw_query() {
        let ctx = RequestContext::new("show_page")
            .with_view_args(ViewArgs::new().with("folder_name", "docs").with("page_name", "intro"))
            .with_uri(Uri::from_static("/docs/intro?b=2&a=1"));
        assert_eq!(current_url(&ctx, &urls()).unwrap(), "/docs/intro?b=2&a=1");
    }

    #[test]
    fn test_parse_params_keeps_repeats() {
        let params = parse_params("tag=a&tag=b+c&q=%C3%A9");
        assert_eq!(params.get_all("tag"), ["a".to_string(), "b c".to_string()]);
        assert_eq!(params.get("q"), Some("é"));
        assert!(parse_params("").is_empty());
    }

    #[test]
    fn test_build_rejects_bad_routes() {
        let dup = UrlMap::builder()
            .route("/a", "x")
            .route("/b", "x")
            .build()
            .unwrap_err();
        assert_eq!(dup, ConfigError::DuplicateEndpoint("x".into()));

        for bad in ["nope", "/{open", "/{}"] {
            let err = UrlMap::builder().route(bad, "x").build().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRoute { .. }), "{bad}");
        }

        let conflict = UrlMap::builder()
            .route("/{a}", "x")
            .route("/{b}", "y")
            .build()
            .unwrap_err();
        assert!(matches!(conflict, ConfigError::InvalidRoute { .. }));
    }
}
