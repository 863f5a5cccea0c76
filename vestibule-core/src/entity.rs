//! # Entity Capability Surface
//!
//! Entities are the read-only values a resolution chain loads from request
//! data. Each entity type opts into the optional behaviours through explicit
//! trait methods that return `Option`s:
//!
//! - [`Entity::permissions`] - what the actor may do, given inherited grants
//! - [`Entity::as_redirect_marker`] - "this resource has moved"
//! - [`Entity::canonical_slug`] - the authoritative slug of a composite address
//!
//! Composite addressing itself is declared on the [`EntityKind`], since the
//! chain must know how to query by id before any entity exists.

use crate::{capability::CapabilitySet, context::ViewArgs};
use std::{any::Any, fmt, sync::Arc};

/// A shared handle to a resolved entity.
pub type EntityRef = Arc<dyn Entity>;

/// Declares that an entity kind is addressed by an `{id}-{slug}` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositeAddress {
    /// Attribute holding the numeric id the token is parsed into.
    pub id_attr: &'static str,
    /// Attribute name that chain steps map to the token parameter.
    pub token_attr: &'static str,
}

/// Describes one queryable entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKind {
    name: &'static str,
    composite: Option<CompositeAddress>,
}

impl EntityKind {
    /// A kind with plain attribute addressing.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            composite: None,
        }
    }

    /// Declare composite `{id}-{slug}` addressing for this kind.
    pub const fn with_composite(self, id_attr: &'static str, token_attr: &'static str) -> Self {
        Self {
            name: self.name,
            composite: Some(CompositeAddress {
                id_attr,
                token_attr,
            }),
        }
    }

    /// The kind's name, as used by lookup backends.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The composite address declaration, if any.
    pub const fn composite(&self) -> Option<CompositeAddress> {
        self.composite
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The authenticated party making the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    id: String,
}

impl Actor {
    /// Create an actor with the given identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The actor's identity.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// An entity that stands in for a resource that has moved.
pub trait RedirectMarker: Send + Sync {
    /// View arguments of the redirect target, derived from the current ones.
    fn target_view_args(&self, current: &ViewArgs) -> ViewArgs;
}

/// The capability surface every resolvable entity exposes.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `Entity`",
    label = "missing `Entity` implementation",
    note = "Entities must implement `kind`, `key`, `attribute` and `as_any`."
)]
pub trait Entity: fmt::Debug + Send + Sync + 'static {
    /// The kind this entity was loaded as.
    fn kind(&self) -> EntityKind;

    /// The entity's identity within its kind.
    fn key(&self) -> serde_json::Value;

    /// Read an attribute by name. Returning `None` means the attribute does
    /// not exist, which is distinct from an attribute holding `null`.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Permissions the actor holds on this entity.
    ///
    /// `inherited` is the set computed by the previous step of the chain, or
    /// `None` for the first step. The default passes it through unchanged.
    fn permissions(&self, _actor: Option<&Actor>, inherited: Option<&CapabilitySet>) -> CapabilitySet {
        inherited.cloned().unwrap_or_default()
    }

    /// Returns the redirect surface if this entity marks a moved resource.
    fn as_redirect_marker(&self) -> Option<&dyn RedirectMarker> {
        None
    }

    /// The canonical slug for composite-addressed kinds.
    fn canonical_slug(&self) -> Option<String> {
        None
    }

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// A value usable as a lookup predicate or an entity attribute.
#[derive(Debug, Clone)]
pub enum Value {
    /// A plain JSON scalar, list, or object.
    Scalar(serde_json::Value),
    /// Another entity, compared by kind and key.
    Entity(EntityRef),
}

impl Value {
    /// The JSON null value.
    pub const fn null() -> Self {
        Value::Scalar(serde_json::Value::Null)
    }

    /// The scalar payload, if this is not an entity.
    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Scalar(v) => Some(v),
            Value::Entity(_) => None,
        }
    }

    /// The entity payload, if any.
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(e) => Some(e),
            Value::Scalar(_) => None,
        }
    }

    /// Convenience accessor for string scalars.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(serde_json::Value::as_str)
    }

    /// Convenience accessor for integer scalars.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(serde_json::Value::as_i64)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Entity(a), Value::Entity(b)) => {
                a.kind().name() == b.kind().name() && a.key() == b.key()
            }
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Scalar(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<EntityRef> for Value {
    fn from(v: EntityRef) -> Self {
        Value::Entity(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Tag(&'static str, i64);

    const TAG: EntityKind = EntityKind::new("tag");
    const LABEL: EntityKind = EntityKind::new("label");

    impl Entity for Tag {
        fn kind(&self) -> EntityKind {
            if self.0 == "tag" { TAG } else { LABEL }
        }
        fn key(&self) -> serde_json::Value {
            self.1.into()
        }
        fn attribute(&self, name: &str) -> Option<Value> {
            (name == "id").then(|| Value::from(self.1))
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_entity_values_compare_by_kind_and_key() {
        let a: EntityRef = Arc::new(Tag("tag", 1));
        let b: EntityRef = Arc::new(Tag("tag", 1));
        let c: EntityRef = Arc::new(Tag("label", 1));
        assert_eq!(Value::from(a.clone()), Value::from(b));
        assert_ne!(Value::from(a.clone()), Value::from(c));
        assert_ne!(Value::from(a), Value::from(1));
    }

    #[test]
    fn test_default_permissions_inherit() {
        let tag = Tag("tag", 3);
        assert!(tag.permissions(None, None).is_empty());
        let inherited = CapabilitySet::from(["view"]);
        assert_eq!(tag.permissions(None, Some(&inherited)), inherited);
    }

    #[test]
    fn test_composite_kind() {
        const POST: EntityKind = EntityKind::new("post").with_composite("url_id", "url_name");
        let composite = POST.composite().unwrap();
        assert_eq!(composite.id_attr, "url_id");
        assert_eq!(composite.token_attr, "url_name");
        assert!(TAG.composite().is_none());
    }
}
