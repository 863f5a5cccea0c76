//! JSON and JSONP rendering.
//!
//! The reply value is serialized compactly for `XMLHttpRequest` callers and
//! indented otherwise. A `callback` query argument (or, when it is absent,
//! `jsonp`) that is a safe JavaScript identifier turns the body into
//! `callback(data);`.

use super::table::{Renderer, RendererOutput};
use regex::Regex;
use std::sync::LazyLock;
use vestibule_core::{BoxError, RequestContext, build_response};

static CALLBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z$_][0-9a-z$_]*$").expect("valid callback regex"));

/// The query arguments consulted for a callback name, in order.
pub const CALLBACK_ARGS: [&str; 2] = ["callback", "jsonp"];

/// The JSON/JSONP renderer as a table entry.
pub fn renderer() -> Renderer {
    Renderer::callable(render)
}

/// Render `value` as JSON, or as JSONP when a valid callback is requested.
pub fn render(ctx: &RequestContext, value: &serde_json::Value) -> Result<RendererOutput, BoxError> {
    let data = if ctx.is_xhr() {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };

    let response = match callback(ctx) {
        Some(callback) => build_response(
            format!("{callback}({data});"),
            "application/javascript",
            None,
            None,
        ),
        None => build_response(data, "application/json", None, None),
    };
    Ok(RendererOutput::Response(response))
}

/// The requested callback name, if it is a valid identifier.
pub fn callback(ctx: &RequestContext) -> Option<&str> {
    CALLBACK_ARGS
        .iter()
        .find_map(|name| ctx.args().get(name))
        .filter(|callback| CALLBACK.is_match(callback))
}
