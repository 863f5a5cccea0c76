//! View handlers: the code that runs once a chain has resolved.

use std::future::Future;
use vestibule_core::{IntoReply, RequestContext, RequestError};
use vestibule_std::Invocation;

/// The final step of a view.
///
/// Receives the resolved [`Invocation`] and the request, and returns
/// something that can be rendered.
///
/// Any `Fn(Invocation) -> impl Future<Output = Result<R, RequestError>>`
/// is a handler; wrap with [`with_context`] to also receive the request.
///
/// # Example
///
/// ```rust,ignore
/// let handler = |invocation: Invocation| async move {
///     let page = invocation.get::<Page>("page").ok_or(RequestError::NotFound)?;
///     Ok(json!({ "title": page.title }))
/// };
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle a view",
    label = "missing `ViewHandler` implementation",
    note = "Use an `async` closure taking an `Invocation` and returning `Result<impl IntoReply, RequestError>`."
)]
pub trait ViewHandler: Send + Sync + 'static {
    /// What the handler returns on success.
    type Reply: IntoReply + Send;

    /// Run the handler.
    fn call(
        &self,
        invocation: Invocation,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Self::Reply, RequestError>> + Send;
}

impl<F, Fut, R> ViewHandler for F
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RequestError>> + Send,
    R: IntoReply + Send,
{
    type Reply = R;

    fn call(
        &self,
        invocation: Invocation,
        _ctx: &RequestContext,
    ) -> impl Future<Output = Result<Self::Reply, RequestError>> + Send {
        (self)(invocation)
    }
}

/// A handler that also receives a copy of the request context.
#[derive(Debug, Clone)]
pub struct WithContext<F>(F);

/// Wrap `f` so it receives the request context alongside the invocation.
pub fn with_context<F, Fut, R>(f: F) -> WithContext<F>
where
    F: Fn(Invocation, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RequestError>> + Send,
    R: IntoReply + Send,
{
    WithContext(f)
}

impl<F, Fut, R> ViewHandler for WithContext<F>
where
    F: Fn(Invocation, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RequestError>> + Send,
    R: IntoReply + Send,
{
    type Reply = R;

    fn call(
        &self,
        invocation: Invocation,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Self::Reply, RequestError>> + Send {
        (self.0)(invocation, ctx.clone())
    }
}
