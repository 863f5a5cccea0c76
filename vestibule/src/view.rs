//! A view: resolution chain, handler, and renderer table composed.

use crate::handler::ViewHandler;
use tracing::debug;
use vestibule_core::{
    EntityLookup, IntoReply, Output, Reply, RequestContext, RequestError, TemplateEngine,
};
use vestibule_std::{Chain, Redirect, RendererTable, Resolution, render::assemble, render::select};

/// What a view produced for one request.
#[derive(Debug)]
pub enum ViewOutcome {
    /// Rendered (or unrendered) handler output.
    Output(Output),
    /// The chain short-circuited with a redirect; the handler did not run.
    Redirect(Redirect),
}

impl ViewOutcome {
    /// The output, if the handler ran.
    pub fn output(self) -> Option<Output> {
        match self {
            ViewOutcome::Output(output) => Some(output),
            ViewOutcome::Redirect(_) => None,
        }
    }

    /// The redirect, if the chain short-circuited.
    pub fn redirect(self) -> Option<Redirect> {
        match self {
            ViewOutcome::Redirect(redirect) => Some(redirect),
            ViewOutcome::Output(_) => None,
        }
    }
}

/// A chain, a handler, and an optional renderer table.
///
/// # Example
///
/// ```rust,ignore
/// let view = View::new(show_page)
///     .chain(page_chain)
///     .render_with(RendererTable::with_template("page.html"));
/// ```
#[derive(Debug, Clone)]
pub struct View<H> {
    chain: Chain,
    handler: H,
    renderers: Option<RendererTable>,
}

impl<H: ViewHandler> View<H> {
    /// A view with an empty chain and no rendering.
    pub fn new(handler: H) -> Self {
        Self {
            chain: Chain::empty(),
            handler,
            renderers: None,
        }
    }

    /// Resolve entities through `chain` before calling the handler.
    pub fn chain(mut self, chain: Chain) -> Self {
        self.chain = chain;
        self
    }

    /// Render handler replies through `table`.
    pub fn render_with(mut self, table: RendererTable) -> Self {
        self.renderers = Some(table);
        self
    }

    /// Run the view for one request.
    pub async fn call<L, T>(
        &self,
        ctx: &RequestContext,
        lookup: &L,
        templates: &T,
    ) -> Result<ViewOutcome, RequestError>
    where
        L: EntityLookup,
        T: TemplateEngine,
    {
        let invocation = match self.chain.resolve(ctx, lookup).await? {
            Resolution::Proceed(invocation) => invocation,
            Resolution::Redirect(redirect) => return Ok(ViewOutcome::Redirect(redirect)),
        };

        let reply = self.handler.call(invocation, ctx).await?.into_reply();
        let output = match &self.renderers {
            Some(table) => assemble(reply, select(Some(ctx), table), ctx, templates).await?,
            None => {
                debug!(endpoint = ctx.endpoint(), "view has no renderers");
                match reply {
                    Reply::Response(response) => Output::Response(response),
                    data => Output::Unrendered(data),
                }
            }
        };
        Ok(ViewOutcome::Output(output))
    }
}
