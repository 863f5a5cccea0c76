//! Mimetype Matcher.
//!
//! Quality values are ignored on purpose: the client's order wins, so
//! `text/html, application/json;q=0.9` and `text/html;q=0.1, application/json`
//! both select `text/html` when both are registered.

use super::table::{Renderer, RendererTable, WILDCARD};
use vestibule_core::RequestContext;

/// A negotiated mimetype and its renderer.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// The table key that matched, possibly the wildcard.
    pub mimetype: &'a str,
    /// The renderer registered under it.
    pub renderer: &'a Renderer,
}

impl Selection<'_> {
    /// Whether the wildcard entry was chosen.
    pub fn is_wildcard(&self) -> bool {
        self.mimetype == WILDCARD
    }
}

/// Pick the table key for an `Accept` header value.
pub fn negotiate<'a>(accept: &str, table: &'a RendererTable) -> Option<&'a str> {
    accept
        .split([',', ';'])
        .map(str::trim)
        .filter(|token| token.contains('/'))
        .find_map(|token| table.get_key_value(token).map(|(key, _)| key))
        .or_else(|| table.get_key_value(WILDCARD).map(|(key, _)| key))
}

/// Select a renderer for the request, or `None` to skip rendering.
///
/// Rendering is skipped outside a request and when the context disables it.
pub fn select<'a>(ctx: Option<&RequestContext>, table: &'a RendererTable) -> Option<Selection<'a>> {
    let ctx = ctx.filter(|ctx| ctx.render_enabled())?;
    let mimetype = negotiate(ctx.accept().unwrap_or_default(), table)?;
    let renderer = table.get(mimetype)?;
    Some(Selection { mimetype, renderer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> RendererTable {
        RendererTable::builder()
            .template("text/html", "page.html")
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_order_wins() {
        let table = table();
        assert_eq!(
            negotiate("text/html, application/json;q=0.9", &table),
            Some("text/html")
        );
        assert_eq!(
            negotiate("application/json;q=0.1, text/html", &table),
            Some("application/json")
        );
    }

    #[test]
    fn test_wildcard_fallback() {
        let table = RendererTable::builder()
            .default_template("page.html")
            .json(false)
            .build()
            .unwrap();
        assert_eq!(negotiate("application/xml", &table), Some(WILDCARD));
        assert_eq!(negotiate("", &table), Some(WILDCARD));
    }

    #[test]
    fn test_no_match_without_wildcard() {
        assert_eq!(negotiate("application/xml", &table()), None);
    }

    #[test]
    fn test_select_bypass() {
        let table = table();
        assert!(select(None, &table).is_none());

        let ctx = RequestContext::new("x").with_accept("text/html");
        assert!(select(Some(&ctx.clone().with_render(false)), &table).is_none());

        let selection = select(Some(&ctx), &table).unwrap();
        assert_eq!(selection.mimetype, "text/html");
        assert!(!selection.is_wildcard());
    }

    proptest! {
        #[test]
        fn prop_selection_is_registered_or_none(accept in "[a-z/*;,= .0-9]{0,40}") {
            let table = table();
            if let Some(mimetype) = negotiate(&accept, &table) {
                prop_assert!(table.contains(mimetype));
            }
        }

        #[test]
        fn prop_first_registered_token_wins(junk in "[a-z]{1,8}/[a-z]{1,8}") {
            let table = table();
            prop_assume!(!table.contains(&junk));
            let accept = format!("{junk};q=0.5, text/html, application/json");
            prop_assert_eq!(negotiate(&accept, &table), Some("text/html"));
        }
    }
}
