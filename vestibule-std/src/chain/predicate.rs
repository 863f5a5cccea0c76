//! Predicate Resolver.
//!
//! Turns a step's attribute map into concrete lookup predicates for one
//! candidate kind. Pure: reads prior bindings and the request context, never
//! performs I/O.

use super::{
    bindings::Bindings,
    canonical::{self, SuppliedToken},
    step::{ChainStep, ValueSource},
};
use vestibule_core::{AttributeError, EntityKind, Predicates, RequestContext, RequestError, Value};

/// Predicates for one lookup, plus the composite token if the kind uses one.
#[derive(Debug)]
pub(crate) struct Built {
    pub(crate) predicates: Predicates,
    pub(crate) token: Option<SuppliedToken>,
}

/// Build the predicates for `step` against candidate `kind`.
///
/// For composite-addressed kinds the token attribute is replaced by an id
/// predicate; a token whose id prefix does not parse is `NotFound`.
pub(crate) fn build_predicates(
    step: &ChainStep,
    kind: &EntityKind,
    bindings: &Bindings,
    ctx: &RequestContext,
) -> Result<Built, RequestError> {
    let mut predicates = Predicates::with_capacity(step.attributes.len());
    let mut token = None;

    for (attribute, source) in &step.attributes {
        let value = resolve_source(source, bindings, ctx)?;

        let composite = kind
            .composite()
            .filter(|address| address.token_attr == attribute.as_str());
        match composite {
            Some(address) => {
                let supplied = value.as_str().ok_or(RequestError::NotFound)?;
                let id = canonical::parse_token_id(supplied).ok_or(RequestError::NotFound)?;
                predicates.insert(address.id_attr.to_string(), Value::from(id));
                token = Some(SuppliedToken {
                    param: match source {
                        ValueSource::Param(name) => Some(name.clone()),
                        _ => None,
                    },
                    token: supplied.to_string(),
                    id,
                });
            }
            None => {
                predicates.insert(attribute.clone(), value);
            }
        }
    }

    Ok(Built { predicates, token })
}

/// Resolve one value source.
pub(crate) fn resolve_source(
    source: &ValueSource,
    bindings: &Bindings,
    ctx: &RequestContext,
) -> Result<Value, RequestError> {
    match source {
        ValueSource::Param(name) => Ok(match bindings.get(name) {
            Some(entity) => Value::Entity(entity.clone()),
            None => ctx
                .view_args()
                .get(name)
                .map(Value::from)
                .unwrap_or_else(Value::null),
        }),
        ValueSource::Path { binding, attrs } => resolve_path(binding, attrs, bindings),
        ValueSource::Computed(f) => Ok(f(bindings, ctx.view_args())),
    }
}

fn resolve_path(binding: &str, attrs: &[String], bindings: &Bindings) -> Result<Value, RequestError> {
    let missing = |attribute: &str| AttributeError {
        path: format!("{binding}.{}", attrs.join(".")),
        attribute: attribute.to_string(),
    };

    let mut current = bindings
        .get(binding)
        .map(|entity| Value::Entity(entity.clone()))
        .ok_or_else(|| missing(binding))?;

    for attr in attrs {
        current = match &current {
            Value::Entity(entity) => entity.attribute(attr),
            Value::Scalar(json) => json.get(attr.as_str()).cloned().map(Value::Scalar),
        }
        .ok_or_else(|| missing(attr))?;
    }
    Ok(current)
}
