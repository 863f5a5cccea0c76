//! Canonical-URL Guard.
//!
//! Composite-addressed kinds are reached through an `{id}-{slug}` token. Only
//! the id is used for lookup; the slug part is cosmetic and may be stale. On
//! read-only requests a stale slug is corrected by redirecting to the same
//! endpoint with the canonical token substituted.

use vestibule_core::{Entity, RequestContext, ViewArgs};

/// A composite token as supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SuppliedToken {
    /// The view argument the token came from, when it came from one.
    pub(crate) param: Option<String>,
    pub(crate) token: String,
    pub(crate) id: i64,
}

/// Parse the id prefix of a token: the text before the first `-`.
pub fn parse_token_id(token: &str) -> Option<i64> {
    let prefix = token.split_once('-').map_or(token, |(id, _)| id);
    prefix.parse().ok()
}

/// Format the canonical token for an id and slug.
pub fn canonical_token(id: i64, slug: &str) -> String {
    if slug.is_empty() {
        id.to_string()
    } else {
        format!("{id}-{slug}")
    }
}

/// Decide whether the supplied token must be corrected.
///
/// Returns the corrected view arguments when a redirect is needed: the
/// request is read-only, the entity exposes a canonical slug, the token came
/// from a view argument, and the supplied token differs from the canonical
/// one.
pub(crate) fn correction(
    supplied: &SuppliedToken,
    entity: &dyn Entity,
    ctx: &RequestContext,
) -> Option<ViewArgs> {
    if !ctx.is_read_only() {
        return None;
    }
    let param = supplied.param.as_deref()?;
    let slug = entity.canonical_slug()?;
    let canonical = canonical_token(supplied.id, &slug);
    if canonical == supplied.token {
        return None;
    }
    let mut args = ctx.view_args().clone();
    args.insert(param, canonical);
    Some(args)
}
