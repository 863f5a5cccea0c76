//! Request argument extraction.
//!
//! Handlers declare which query/form parameters they accept, optionally with
//! a filter that converts the raw string. A name ending in `[]` reads every
//! value of the parameter and filters each one.
//!
//! ```rust,ignore
//! let declared = RequestArgs::new()
//!     .arg("q")
//!     .arg_with("page", filters::int)
//!     .arg_with("tag[]", filters::int);
//!
//! let args = declared.extract(Some(&ctx), Args::new())?;
//! let query = args.require("q")?;
//! ```

use indexmap::IndexMap;
use std::{fmt, sync::Arc};
use vestibule_core::{ClientDataError, RequestContext};

/// Converts one raw parameter value.
pub type Filter = Arc<dyn Fn(&str) -> Result<serde_json::Value, String> + Send + Sync>;

/// Common filters.
pub mod filters {
    /// A signed integer.
    pub fn int(raw: &str) -> Result<serde_json::Value, String> {
        raw.trim()
            .parse::<i64>()
            .map(Into::into)
            .map_err(|e| e.to_string())
    }

    /// A finite floating-point number.
    pub fn float(raw: &str) -> Result<serde_json::Value, String> {
        let value = raw.trim().parse::<f64>().map_err(|e| e.to_string())?;
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .ok_or_else(|| format!("`{raw}` is not a finite number"))
    }

    /// `true`/`false`, `1`/`0`, `yes`/`no` or `on`/`off`.
    pub fn boolean(raw: &str) -> Result<serde_json::Value, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true.into()),
            "false" | "0" | "no" | "off" => Ok(false.into()),
            _ => Err(format!("`{raw}` is not a boolean")),
        }
    }
}

#[derive(Clone)]
struct ArgSpec {
    name: String,
    list: bool,
    filter: Option<Filter>,
}

impl fmt::Debug for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgSpec")
            .field("name", &self.name)
            .field("list", &self.list)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// Declared request parameters.
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
    specs: Vec<ArgSpec>,
}

impl RequestArgs {
    /// No parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `name` (or every value of `name` when written `name[]`) as-is.
    pub fn arg(self, name: &str) -> Self {
        self.push(name, None)
    }

    /// Accept `name` converted through `filter`.
    pub fn arg_with<F>(self, name: &str, filter: F) -> Self
    where
        F: Fn(&str) -> Result<serde_json::Value, String> + Send + Sync + 'static,
    {
        self.push(name, Some(Arc::new(filter)))
    }

    fn push(mut self, name: &str, filter: Option<Filter>) -> Self {
        let (name, list) = match name.strip_suffix("[]") {
            Some(base) => (base, true),
            None => (name, false),
        };
        self.specs.push(ArgSpec {
            name: name.to_string(),
            list,
            filter,
        });
        self
    }

    /// Fill every declared name not already in `provided` from the request.
    ///
    /// Names absent from the request are left absent. Outside a request only
    /// `provided` is returned.
    pub fn extract(&self, ctx: Option<&RequestContext>, mut provided: Args) -> Result<Args, ClientDataError> {
        let Some(ctx) = ctx else {
            return Ok(provided);
        };
        for spec in &self.specs {
            if provided.contains(&spec.name) || !ctx.has_value(&spec.name) {
                continue;
            }
            let value = if spec.list {
                let values = ctx
                    .value_list(&spec.name)
                    .into_iter()
                    .map(|raw| spec.apply(raw))
                    .collect::<Result<Vec<_>, _>>()?;
                serde_json::Value::Array(values)
            } else {
                match ctx.value(&spec.name) {
                    Some(raw) => spec.apply(raw)?,
                    None => continue,
                }
            };
            provided.insert(spec.name.clone(), value);
        }
        Ok(provided)
    }
}

impl ArgSpec {
    fn apply(&self, raw: &str) -> Result<serde_json::Value, ClientDataError> {
        match &self.filter {
            Some(filter) => filter(raw).map_err(|reason| ClientDataError::InvalidValue {
                name: self.name.clone(),
                reason,
            }),
            None => Ok(raw.into()),
        }
    }
}

/// Extracted argument values by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: IndexMap<String, serde_json::Value>,
}

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// The argument, if present.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.values.get(name)
    }

    /// The argument, or `ClientDataError::Missing`.
    pub fn require(&self, name: &str) -> Result<&serde_json::Value, ClientDataError> {
        self.get(name)
            .ok_or_else(|| ClientDataError::Missing(name.to_string()))
    }

    /// Whether the argument is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Arguments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
