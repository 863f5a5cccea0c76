//! Chain step declarations.

use super::bindings::Bindings;
use indexmap::IndexMap;
use std::{fmt, sync::Arc};
use vestibule_core::{EntityKind, Value, ViewArgs};

/// Computes a predicate value from prior bindings and view arguments.
pub type ComputeFn = Arc<dyn Fn(&Bindings, &ViewArgs) -> Value + Send + Sync>;

/// Where a predicate value comes from.
#[derive(Clone)]
pub enum ValueSource {
    /// A bare name: a prior binding if one exists, else a view argument.
    Param(String),
    /// A dotted path into a prior binding, `binding.attr.attr`.
    Path {
        /// The binding the path starts from.
        binding: String,
        /// Attributes traversed in order.
        attrs: Vec<String>,
    },
    /// A value computed from prior bindings and view arguments.
    Computed(ComputeFn),
}

impl ValueSource {
    /// Parse `name` or `binding.attr...`.
    pub fn parse(source: &str) -> Self {
        match source.split_once('.') {
            Some((binding, rest)) => ValueSource::Path {
                binding: binding.to_string(),
                attrs: rest.split('.').map(str::to_string).collect(),
            },
            None => ValueSource::Param(source.to_string()),
        }
    }

    /// A computed source.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Bindings, &ViewArgs) -> Value + Send + Sync + 'static,
    {
        ValueSource::Computed(Arc::new(f))
    }
}

impl From<&str> for ValueSource {
    fn from(source: &str) -> Self {
        ValueSource::parse(source)
    }
}

impl From<String> for ValueSource {
    fn from(source: String) -> Self {
        ValueSource::parse(&source)
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Param(name) => f.debug_tuple("Param").field(name).finish(),
            ValueSource::Path { binding, attrs } => write!(f, "Path({binding}.{})", attrs.join(".")),
            ValueSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One entity-resolution unit of a chain.
///
/// # Example
///
/// ```rust,ignore
/// let page = ChainStep::new(PAGE, "page")
///     .attr("name", "page_name")
///     .attr("parent", "folder");
/// ```
#[derive(Debug, Clone)]
pub struct ChainStep {
    pub(crate) candidates: Vec<EntityKind>,
    pub(crate) attributes: IndexMap<String, ValueSource>,
    pub(crate) binding: String,
}

impl ChainStep {
    /// A step resolving one kind into `binding`.
    pub fn new(kind: EntityKind, binding: impl Into<String>) -> Self {
        Self::any_of([kind], binding)
    }

    /// A step trying each kind in order until one matches.
    pub fn any_of(kinds: impl IntoIterator<Item = EntityKind>, binding: impl Into<String>) -> Self {
        Self {
            candidates: kinds.into_iter().collect(),
            attributes: IndexMap::new(),
            binding: binding.into(),
        }
    }

    /// Constrain `attribute` to the value named by `source`.
    pub fn attr(mut self, attribute: impl Into<String>, source: impl Into<ValueSource>) -> Self {
        self.attributes.insert(attribute.into(), source.into());
        self
    }

    /// Constrain `attribute` to a computed value.
    pub fn attr_with<F>(mut self, attribute: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Bindings, &ViewArgs) -> Value + Send + Sync + 'static,
    {
        self.attributes
            .insert(attribute.into(), ValueSource::computed(f));
        self
    }

    /// Also try `kind` if the earlier candidates find nothing.
    pub fn or_kind(mut self, kind: EntityKind) -> Self {
        self.candidates.push(kind);
        self
    }

    /// The binding name.
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Candidate kinds in lookup order.
    pub fn candidates(&self) -> &[EntityKind] {
        &self.candidates
    }
}
