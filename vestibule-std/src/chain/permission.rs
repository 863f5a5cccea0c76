//! Permission Composer.
//!
//! The composer never inherits on its own. Each entity's permission function
//! receives the previous step's set and decides what to keep, which is how a
//! later entity revokes something an earlier one granted. Only the
//! supplemental permissions supplied by the chain's declarer are merged in
//! unconditionally.

use std::{fmt, sync::Arc};
use vestibule_core::{Actor, CapabilitySet, Entity};

/// Extra permissions granted from outside the chain's entities.
#[derive(Clone, Default)]
pub enum Supplemental {
    /// Nothing extra.
    #[default]
    None,
    /// A fixed set.
    Static(CapabilitySet),
    /// A provider evaluated at most once per resolution.
    Provider(Arc<dyn Fn() -> CapabilitySet + Send + Sync>),
}

impl Supplemental {
    /// A provider-backed supplement.
    pub fn provider<F>(f: F) -> Self
    where
        F: Fn() -> CapabilitySet + Send + Sync + 'static,
    {
        Supplemental::Provider(Arc::new(f))
    }

    /// Evaluate to a concrete set.
    pub fn resolve(&self) -> CapabilitySet {
        match self {
            Supplemental::None => CapabilitySet::new(),
            Supplemental::Static(set) => set.clone(),
            Supplemental::Provider(f) => f(),
        }
    }
}

impl From<CapabilitySet> for Supplemental {
    fn from(set: CapabilitySet) -> Self {
        Supplemental::Static(set)
    }
}

impl fmt::Debug for Supplemental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Supplemental::None => f.write_str("None"),
            Supplemental::Static(set) => f.debug_tuple("Static").field(set).finish(),
            Supplemental::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// The entity's grant given `previous`, unioned with `supplemental`.
pub fn compose(
    previous: Option<&CapabilitySet>,
    entity: &dyn Entity,
    actor: Option<&Actor>,
    supplemental: &CapabilitySet,
) -> CapabilitySet {
    let mut granted = entity.permissions(actor, previous);
    granted.extend_from(supplemental);
    granted
}

/// Whether `granted` satisfies `required`: any one required token suffices.
/// An empty requirement is always satisfied.
pub fn satisfies(required: &CapabilitySet, granted: &CapabilitySet) -> bool {
    required.is_empty() || required.intersects(granted)
}
