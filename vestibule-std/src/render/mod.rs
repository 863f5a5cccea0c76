//! # Content-Negotiated Rendering
//!
//! A [`RendererTable`] maps mimetypes to renderers. Per request the `Accept`
//! header picks an entry ([`select`]) and the handler's reply is turned into
//! output ([`assemble`]):
//!
//! | Reply | Selection | Output |
//! |-------|-----------|--------|
//! | `Response` | any | passed through |
//! | data | none | `Output::Unrendered` |
//! | data | callable | response with the selected mimetype |
//! | data | template, specific mimetype | response with that mimetype |
//! | data | template, `*/*` | `Output::Native` |
//!
//! # Example
//!
//! ```rust,ignore
//! let table = RendererTable::builder()
//!     .default_template("page.html")
//!     .template("text/xml", "page.xml")
//!     .build()?;
//!
//! let output = render_reply(reply, Some(&ctx), &table, &engine).await?;
//! ```

mod accept;
mod assemble;
pub mod jsonp;
mod table;

pub use accept::{Selection, negotiate, select};
pub use assemble::assemble;
pub use table::{
    JSON_MIMETYPES, RenderFn, Renderer, RendererOutput, RendererTable, RendererTableBuilder,
    WILDCARD,
};

use thiserror::Error;
use vestibule_core::{Output, Reply, RequestContext, RequestError, TemplateEngine};

/// Failures raised while rendering a reply.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template renderers take named parameters.
    #[error("template `{template}` needs a JSON object, got {found}")]
    NotAMapping {
        /// The template that was selected.
        template: String,
        /// What the handler returned instead.
        found: &'static str,
    },
}

/// Select and assemble in one go.
///
/// Without a request context the reply is returned unrendered.
pub async fn render_reply<T>(
    reply: Reply,
    ctx: Option<&RequestContext>,
    table: &RendererTable,
    engine: &T,
) -> Result<Output, RequestError>
where
    T: TemplateEngine,
{
    match ctx {
        Some(ctx) => assemble(reply, select(Some(ctx), table), ctx, engine).await,
        None => Ok(match reply {
            Reply::Response(response) => Output::Response(response),
            data => Output::Unrendered(data),
        }),
    }
}
