//! Resolution results handed to later steps and to the handler.

use indexmap::IndexMap;
use std::{any::Any, sync::Arc};
use vestibule_core::{CapabilitySet, Entity, EntityRef, ViewArgs};

/// Entities resolved so far, keyed by binding name in chain order.
///
/// Later steps see an immutable view; only the orchestrator appends.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: IndexMap<String, EntityRef>,
}

impl Bindings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&mut self, name: String, entity: EntityRef) {
        self.entries.insert(name, entity);
    }

    /// The entity bound to `name`.
    pub fn get(&self, name: &str) -> Option<&EntityRef> {
        self.entries.get(name)
    }

    /// The entity bound to `name`, downcast to its concrete type.
    pub fn get_as<T: Entity>(&self, name: &str) -> Option<&T> {
        self.get(name)
            .and_then(|entity| entity.as_any().downcast_ref::<T>())
    }

    /// The most recently bound entity.
    pub fn last(&self) -> Option<&EntityRef> {
        self.entries.last().map(|(_, entity)| entity)
    }

    /// Binding names and entities in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityRef)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Binding names in chain order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Bindings {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().zip(other.entries.iter()).all(|(a, b)| {
                a.0 == b.0 && a.1.kind() == b.1.kind() && a.1.key() == b.1.key()
            })
    }
}

/// The object a workflow transform builds from the last bound entity.
pub type Workflow = Arc<dyn Any + Send + Sync>;

/// Builds the workflow object handed to the handler instead of the bindings.
pub type WorkflowFn = Arc<dyn Fn(&EntityRef) -> Workflow + Send + Sync>;

/// What the handler receives after the chain succeeds.
#[derive(Clone)]
pub enum HandlerArgs {
    /// Every resolved entity by binding name.
    Bindings(Bindings),
    /// Only the workflow object built from the last bound entity.
    Workflow(Workflow),
}

impl std::fmt::Debug for HandlerArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerArgs::Bindings(b) => f.debug_tuple("Bindings").field(b).finish(),
            HandlerArgs::Workflow(_) => f.write_str("Workflow(..)"),
        }
    }
}

/// A successful resolution, ready to be passed to the handler.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub(crate) args: HandlerArgs,
    pub(crate) capabilities: Option<CapabilitySet>,
    pub(crate) params: Option<ViewArgs>,
}

impl Invocation {
    /// An invocation with no bindings, as produced by an empty chain.
    pub fn empty() -> Self {
        Self {
            args: HandlerArgs::Bindings(Bindings::new()),
            capabilities: None,
            params: None,
        }
    }

    /// The handler arguments.
    pub fn args(&self) -> &HandlerArgs {
        &self.args
    }

    /// The bindings, unless a workflow replaced them.
    pub fn bindings(&self) -> Option<&Bindings> {
        match &self.args {
            HandlerArgs::Bindings(b) => Some(b),
            HandlerArgs::Workflow(_) => None,
        }
    }

    /// Shorthand for a bound entity downcast to `T`.
    pub fn get<T: Entity>(&self, name: &str) -> Option<&T> {
        self.bindings().and_then(|b| b.get_as::<T>(name))
    }

    /// The workflow object downcast to `T`, if the chain built one.
    pub fn workflow<T: Any>(&self) -> Option<&T> {
        match &self.args {
            HandlerArgs::Workflow(w) => w.downcast_ref::<T>(),
            HandlerArgs::Bindings(_) => None,
        }
    }

    /// The final capability set, when the chain required permissions.
    pub fn capabilities(&self) -> Option<&CapabilitySet> {
        self.capabilities.as_ref()
    }

    /// The raw view arguments, when the chain was asked to pass them on.
    pub fn params(&self) -> Option<&ViewArgs> {
        self.params.as_ref()
    }
}
