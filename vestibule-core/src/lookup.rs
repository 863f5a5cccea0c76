//! External capabilities the pipeline consumes: entity lookup and templates.

use crate::{
    entity::{EntityKind, EntityRef, Value},
    error::BoxError,
    response::TemplateContext,
};
use indexmap::IndexMap;
use std::{future::Future, sync::Arc};

/// Attribute = value constraints for one lookup, in declaration order.
pub type Predicates = IndexMap<String, Value>;

/// The entity query backend.
///
/// Given a kind and a set of predicates, return the first matching entity or
/// `None`. Implementations must not mutate state visible to other requests.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot look up entities",
    label = "missing `EntityLookup` implementation"
)]
pub trait EntityLookup: Send + Sync {
    /// Find at most one entity of `kind` satisfying every predicate.
    fn lookup(
        &self,
        kind: &EntityKind,
        predicates: &Predicates,
    ) -> impl Future<Output = Result<Option<EntityRef>, BoxError>> + Send;
}

impl<T: EntityLookup> EntityLookup for Arc<T> {
    fn lookup(
        &self,
        kind: &EntityKind,
        predicates: &Predicates,
    ) -> impl Future<Output = Result<Option<EntityRef>, BoxError>> + Send {
        (**self).lookup(kind, predicates)
    }
}

/// The template execution engine.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot render templates",
    label = "missing `TemplateEngine` implementation"
)]
pub trait TemplateEngine: Send + Sync {
    /// Render `template` with named parameters into a body.
    fn render(
        &self,
        template: &str,
        context: &TemplateContext,
    ) -> impl Future<Output = Result<String, BoxError>> + Send;
}

impl<T: TemplateEngine> TemplateEngine for Arc<T> {
    fn render(
        &self,
        template: &str,
        context: &TemplateContext,
    ) -> impl Future<Output = Result<String, BoxError>> + Send {
        (**self).render(template, context)
    }
}
