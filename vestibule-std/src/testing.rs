//! Testing utilities for Vestibule.
//!
//! In-memory doubles for the capabilities the pipeline consumes, so chains,
//! renderers and whole apps can be exercised without a database or a
//! template engine.
//!
//! - [`Record`]: a configurable entity
//! - [`MemoryStore`]: an [`EntityLookup`] over records that logs every query
//! - [`RecordingTemplates`]: a deterministic [`TemplateEngine`]
//! - [`CallCounter`]: counts handler invocations

use indexmap::IndexMap;
use std::{
    any::Any,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
};
use vestibule_core::{
    Actor, BoxError, CapabilitySet, Entity, EntityKind, EntityLookup, EntityRef, Predicates,
    RedirectMarker, TemplateContext, TemplateEngine, Value, ViewArgs,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Record
// ============================================================================

type PermissionFn = Arc<dyn Fn(Option<&Actor>, Option<&CapabilitySet>) -> CapabilitySet + Send + Sync>;

#[derive(Clone, Default)]
enum Permissions {
    #[default]
    Inherit,
    Grant(CapabilitySet),
    KeepOnly(CapabilitySet),
    Custom(PermissionFn),
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permissions::Inherit => f.write_str("Inherit"),
            Permissions::Grant(set) => f.debug_tuple("Grant").field(set).finish(),
            Permissions::KeepOnly(set) => f.debug_tuple("KeepOnly").field(set).finish(),
            Permissions::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A configurable entity.
///
/// `attribute("id")` falls back to the record's key.
///
/// # Example
///
/// ```rust,ignore
/// let folder = Record::new(FOLDER, 1).attr("name", "docs").grants(["view"]);
/// let moved = Record::new(MOVED, 2)
///     .attr("name", "old")
///     .redirects_to([("page_name", "new")]);
/// ```
#[derive(Debug, Clone)]
pub struct Record {
    kind: EntityKind,
    key: serde_json::Value,
    attributes: IndexMap<String, Value>,
    slug: Option<String>,
    permissions: Permissions,
    redirect: Option<ViewArgs>,
}

impl Record {
    /// A record of `kind` identified by `key`.
    pub fn new(kind: EntityKind, key: impl Into<serde_json::Value>) -> Self {
        Self {
            kind,
            key: key.into(),
            attributes: IndexMap::new(),
            slug: None,
            permissions: Permissions::Inherit,
            redirect: None,
        }
    }

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the canonical slug.
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Add `permissions` to whatever is inherited.
    pub fn grants<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = Permissions::Grant(permissions.into_iter().collect());
        self
    }

    /// Keep only the inherited permissions that are in `permissions`.
    pub fn keep_only<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = Permissions::KeepOnly(permissions.into_iter().collect());
        self
    }

    /// Compute permissions with a function of the actor and inherited set.
    pub fn permissions_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Actor>, Option<&CapabilitySet>) -> CapabilitySet + Send + Sync + 'static,
    {
        self.permissions = Permissions::Custom(Arc::new(f));
        self
    }

    /// Mark this record as moved; the target replaces the given view arguments.
    pub fn redirects_to<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.redirect = Some(overrides.into_iter().collect());
        self
    }
}

impl Entity for Record {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn key(&self) -> serde_json::Value {
        self.key.clone()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes
            .get(name)
            .cloned()
            .or_else(|| (name == "id").then(|| Value::Scalar(self.key.clone())))
    }

    fn permissions(&self, actor: Option<&Actor>, inherited: Option<&CapabilitySet>) -> CapabilitySet {
        match &self.permissions {
            Permissions::Inherit => inherited.cloned().unwrap_or_default(),
            Permissions::Grant(granted) => {
                let mut set = inherited.cloned().unwrap_or_default();
                set.extend_from(granted);
                set
            }
            Permissions::KeepOnly(kept) => inherited
                .map(|inherited| inherited.iter().filter(|p| kept.contains(p)).collect())
                .unwrap_or_default(),
            Permissions::Custom(f) => f(actor, inherited),
        }
    }

    fn as_redirect_marker(&self) -> Option<&dyn RedirectMarker> {
        self.redirect.as_ref().map(|_| self as &dyn RedirectMarker)
    }

    fn canonical_slug(&self) -> Option<String> {
        self.slug.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl RedirectMarker for Record {
    fn target_view_args(&self, current: &ViewArgs) -> ViewArgs {
        match &self.redirect {
            Some(overrides) => current.merged(overrides),
            None => current.clone(),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Entity(Arc::new(record))
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// One query received by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLookup {
    /// The kind queried.
    pub kind: &'static str,
    /// The predicates supplied.
    pub predicates: Predicates,
}

/// An in-memory [`EntityLookup`].
///
/// An entity matches when its kind name matches and every predicate equals
/// the entity's attribute of that name. Clones share the query log.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entities: Vec<EntityRef>,
    failing: Vec<&'static str>,
    lookups: Arc<Mutex<Vec<RecordedLookup>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity.
    pub fn with(mut self, entity: impl Entity) -> Self {
        self.entities.push(Arc::new(entity));
        self
    }

    /// Make every lookup of `kind` fail.
    pub fn failing_on(mut self, kind: EntityKind) -> Self {
        self.failing.push(kind.name());
        self
    }

    /// Every query received so far, in order.
    pub fn lookups(&self) -> Vec<RecordedLookup> {
        lock(&self.lookups).clone()
    }

    /// Forget the recorded queries.
    pub fn clear(&self) {
        lock(&self.lookups).clear();
    }

    fn find(&self, kind: &EntityKind, predicates: &Predicates) -> Option<EntityRef> {
        self.entities
            .iter()
            .find(|entity| {
                entity.kind().name() == kind.name()
                    && predicates
                        .iter()
                        .all(|(name, value)| entity.attribute(name).as_ref() == Some(value))
            })
            .cloned()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entities", &self.entities.len())
            .field("failing", &self.failing)
            .finish()
    }
}

/// Error returned by a [`MemoryStore`] for kinds marked as failing.
#[derive(Debug, thiserror::Error)]
#[error("lookup of `{0}` failed")]
pub struct StoreError(pub &'static str);

impl EntityLookup for MemoryStore {
    async fn lookup(
        &self,
        kind: &EntityKind,
        predicates: &Predicates,
    ) -> Result<Option<EntityRef>, BoxError> {
        lock(&self.lookups).push(RecordedLookup {
            kind: kind.name(),
            predicates: predicates.clone(),
        });
        if self.failing.contains(&kind.name()) {
            return Err(StoreError(kind.name()).into());
        }
        Ok(self.find(kind, predicates))
    }
}

// ============================================================================
// Recording Templates
// ============================================================================

/// A template engine rendering `"{template}:{compact json}"`.
///
/// Clones share the call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTemplates {
    calls: Arc<Mutex<Vec<(String, TemplateContext)>>>,
}

impl RecordingTemplates {
    /// A new engine with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the templates rendered so far.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|(template, _)| template.clone())
            .collect()
    }

    /// The context of the most recent render.
    pub fn last_context(&self) -> Option<TemplateContext> {
        lock(&self.calls).last().map(|(_, context)| context.clone())
    }
}

impl TemplateEngine for RecordingTemplates {
    async fn render(&self, template: &str, context: &TemplateContext) -> Result<String, BoxError> {
        lock(&self.calls).push((template.to_string(), context.clone()));
        let data = serde_json::to_string(context)?;
        Ok(format!("{template}:{data}"))
    }
}

// ============================================================================
// Call Counter
// ============================================================================

/// Counts how often a handler ran.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CallCounter::new();
/// let handler = {
///     let counter = counter.clone();
///     move |_| {
///         counter.hit();
///         async { Ok(json!({})) }
///     }
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
}

impl CallCounter {
    /// A counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call.
    pub fn hit(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Calls recorded so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}
