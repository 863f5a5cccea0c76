//! Renderer tables: mimetype to renderer, built once per view.

use super::jsonp;
use indexmap::IndexMap;
use std::{fmt, sync::Arc};
use vestibule_core::{BoxError, ConfigError, RequestContext, Response};

/// The mimetype key used when no specific mimetype matches.
pub const WILDCARD: &str = "*/*";

/// Mimetypes served by the JSON/JSONP renderer unless disabled.
pub const JSON_MIMETYPES: [&str; 3] = ["application/json", "text/json", "text/x-json"];

/// What a callable renderer produces.
#[derive(Debug)]
pub enum RendererOutput {
    /// A finished response; the reply's status and headers are applied on top.
    Response(Response),
    /// A body, wrapped in a response with the selected mimetype.
    Body(String),
}

/// A callable renderer.
pub type RenderFn = Arc<
    dyn Fn(&RequestContext, &serde_json::Value) -> Result<RendererOutput, BoxError> + Send + Sync,
>;

/// How one mimetype is rendered.
#[derive(Clone)]
pub enum Renderer {
    /// A template name handed to the `TemplateEngine`.
    Template(String),
    /// A function turning the reply value into a body or response.
    Callable(RenderFn),
}

impl Renderer {
    /// A template renderer.
    pub fn template(name: impl Into<String>) -> Self {
        Renderer::Template(name.into())
    }

    /// A callable renderer.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&RequestContext, &serde_json::Value) -> Result<RendererOutput, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Renderer::Callable(Arc::new(f))
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Template(name) => f.debug_tuple("Template").field(name).finish(),
            Renderer::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// An immutable mimetype → renderer mapping.
#[derive(Debug, Clone, Default)]
pub struct RendererTable {
    entries: IndexMap<String, Renderer>,
}

impl RendererTable {
    /// Start declaring a table. JSON defaults are on.
    pub fn builder() -> RendererTableBuilder {
        RendererTableBuilder::default()
    }

    /// A table rendering everything through one template, plus JSON defaults.
    pub fn with_template(name: impl Into<String>) -> Self {
        let mut entries = json_defaults();
        entries.insert(WILDCARD.to_string(), Renderer::template(name));
        Self { entries }
    }

    /// The renderer for an exact mimetype key.
    pub fn get(&self, mimetype: &str) -> Option<&Renderer> {
        self.entries.get(mimetype)
    }

    /// The stored key and renderer for an exact mimetype.
    pub fn get_key_value(&self, mimetype: &str) -> Option<(&str, &Renderer)> {
        self.entries
            .get_key_value(mimetype)
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Whether `mimetype` has a renderer.
    pub fn contains(&self, mimetype: &str) -> bool {
        self.entries.contains_key(mimetype)
    }

    /// Registered mimetypes.
    pub fn mimetypes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered mimetypes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_defaults() -> IndexMap<String, Renderer> {
    JSON_MIMETYPES
        .iter()
        .map(|mimetype| (mimetype.to_string(), jsonp::renderer()))
        .collect()
}

/// Declares a [`RendererTable`].
pub struct RendererTableBuilder {
    entries: Vec<(String, Renderer)>,
    json: bool,
}

impl Default for RendererTableBuilder {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            json: true,
        }
    }
}

impl RendererTableBuilder {
    /// Render `mimetype` through a template.
    pub fn template(self, mimetype: impl Into<String>, name: impl Into<String>) -> Self {
        self.renderer(mimetype, Renderer::template(name))
    }

    /// Render everything else through a template.
    pub fn default_template(self, name: impl Into<String>) -> Self {
        self.template(WILDCARD, name)
    }

    /// Render `mimetype` through a function.
    pub fn callable<F>(self, mimetype: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RequestContext, &serde_json::Value) -> Result<RendererOutput, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.renderer(mimetype, Renderer::callable(f))
    }

    /// Register any renderer.
    pub fn renderer(mut self, mimetype: impl Into<String>, renderer: Renderer) -> Self {
        self.entries.push((mimetype.into(), renderer));
        self
    }

    /// Toggle the default JSON/JSONP entries.
    pub fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    /// Validate and freeze the table. User entries override JSON defaults.
    pub fn build(self) -> Result<RendererTable, ConfigError> {
        let mut entries = if self.json {
            json_defaults()
        } else {
            IndexMap::new()
        };
        let mut declared: Vec<&str> = Vec::with_capacity(self.entries.len());
        for (mimetype, _) in &self.entries {
            if !is_valid_mimetype(mimetype) {
                return Err(ConfigError::InvalidMimetype(mimetype.clone()));
            }
            if declared.contains(&mimetype.as_str()) {
                return Err(ConfigError::DuplicateRenderer(mimetype.clone()));
            }
            declared.push(mimetype);
        }
        for (mimetype, renderer) in self.entries {
            entries.insert(mimetype, renderer);
        }
        Ok(RendererTable { entries })
    }
}

/// `type/subtype` made of visible ASCII with no parameters, or the wildcard.
fn is_valid_mimetype(mimetype: &str) -> bool {
    if mimetype == WILDCARD {
        return true;
    }
    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_graphic() && !matches!(c, ',' | ';' | '/'))
    };
    match mimetype.split_once('/') {
        Some((kind, subtype)) => valid_part(kind) && valid_part(subtype),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults_and_override() {
        let table = RendererTable::builder()
            .default_template("page.html")
            .template("application/json", "page.json")
            .build()
            .unwrap();
        assert_eq!(table.len(), 4);
        assert!(matches!(table.get("application/json"), Some(Renderer::Template(t)) if t == "page.json"));
        assert!(matches!(table.get("text/json"), Some(Renderer::Callable(_))));
        assert!(matches!(table.get(WILDCARD), Some(Renderer::Template(t)) if t == "page.html"));
    }

    #[test]
    fn test_rejects_keys_that_are_not_header_safe() {
        for bad in ["text/ht\u{7f}ml", "text/ht\tml", "text\u{0}/html", "text/htmł"] {
            let err = RendererTable::builder().template(bad, "x").build().unwrap_err();
            assert_eq!(err, ConfigError::InvalidMimetype(bad.to_string()));
        }
    }

    #[test]
    fn test_json_disabled() {
        let table = RendererTable::builder()
            .template("text/html", "page.html")
            .json(false)
            .build()
            .unwrap();
        assert_eq!(table.mimetypes().collect::<Vec<_>>(), vec!["text/html"]);
    }

    #[test]
    fn test_rejects_malformed_and_duplicate_keys() {
        for bad in ["html", "text/", "/html", "text/html; q=1", "text /html"] {
            let err = RendererTable::builder().template(bad, "x").build().unwrap_err();
            assert_eq!(err, ConfigError::InvalidMimetype(bad.to_string()));
        }
        let err = RendererTable::builder()
            .template("text/html", "a")
            .template("text/html", "b")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRenderer("text/html".into()));
    }

    #[test]
    fn test_with_template() {
        let table = RendererTable::with_template("index.html");
        assert!(table.contains(WILDCARD));
        assert!(table.contains("text/x-json"));
    }
}
