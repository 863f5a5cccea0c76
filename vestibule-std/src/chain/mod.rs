//! # Resolution Chain
//!
//! A chain is an ordered list of [`ChainStep`]s built once at route
//! registration and executed per request by [`Chain::resolve`]. Each step
//! loads one entity; later steps may reference earlier bindings by name.
//!
//! # Short-circuits
//!
//! Resolution stops early, without ever reaching the handler, when
//!
//! - no candidate kind of a step yields an entity (`NotFound`),
//! - a resolved entity is a redirect marker (302 to the marker's target),
//! - a composite token carries a stale slug on a read-only request (302 to
//!   the canonical token),
//! - the final capability set misses every required permission (`Forbidden`).
//!
//! # Example
//!
//! ```rust,ignore
//! let chain = Chain::builder()
//!     .step(ChainStep::new(FOLDER, "folder").attr("name", "folder_name"))
//!     .step(
//!         ChainStep::new(PAGE, "page")
//!             .attr("name", "page_name")
//!             .attr("parent", "folder"),
//!     )
//!     .permission("view")
//!     .build()?;
//!
//! match chain.resolve(&ctx, &store).await? {
//!     Resolution::Proceed(invocation) => { /* call the handler */ }
//!     Resolution::Redirect(redirect) => { /* 302 */ }
//! }
//! ```

mod bindings;
pub mod canonical;
pub mod permission;
mod predicate;
mod step;

pub use bindings::{Bindings, HandlerArgs, Invocation, Workflow, WorkflowFn};
pub use permission::Supplemental;
pub use step::{ChainStep, ComputeFn, ValueSource};

use crate::routing::UrlMap;
use canonical::SuppliedToken;
use http::{HeaderValue, StatusCode, header};
use std::{any::Any, collections::HashSet, sync::Arc};
use tracing::{debug, info};
use vestibule_core::{
    CapabilitySet, ConfigError, EntityKind, EntityLookup, EntityRef, RequestContext,
    RequestError, Response, ViewArgs,
};

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Every step resolved; call the handler.
    Proceed(Invocation),
    /// Send the client elsewhere instead of calling the handler.
    Redirect(Redirect),
}

impl Resolution {
    /// The invocation, if the chain proceeded.
    pub fn invocation(self) -> Option<Invocation> {
        match self {
            Resolution::Proceed(invocation) => Some(invocation),
            Resolution::Redirect(_) => None,
        }
    }

    /// The redirect, if the chain short-circuited with one.
    pub fn redirect(self) -> Option<Redirect> {
        match self {
            Resolution::Redirect(redirect) => Some(redirect),
            Resolution::Proceed(_) => None,
        }
    }
}

/// A redirect to an endpoint with adjusted view arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    endpoint: String,
    view_args: ViewArgs,
    status: StatusCode,
}

impl Redirect {
    /// A `302 Found` redirect.
    pub fn found(endpoint: impl Into<String>, view_args: ViewArgs) -> Self {
        Self {
            endpoint: endpoint.into(),
            view_args,
            status: StatusCode::FOUND,
        }
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Target view arguments.
    pub fn view_args(&self) -> &ViewArgs {
        &self.view_args
    }

    /// Redirect status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The `Location` URL for this redirect.
    pub fn location(&self, urls: &UrlMap) -> Result<String, ConfigError> {
        urls.url_for(&self.endpoint, &self.view_args)
    }

    /// Build the redirect response.
    pub fn into_response(self, urls: &UrlMap) -> Result<Response, ConfigError> {
        let location = self.location(urls)?;
        let value = HeaderValue::from_str(&location).map_err(|e| ConfigError::InvalidRoute {
            pattern: location.clone(),
            reason: e.to_string(),
        })?;
        let mut response = Response::new(String::new());
        *response.status_mut() = self.status;
        response.headers_mut().insert(header::LOCATION, value);
        Ok(response)
    }
}

/// An immutable, validated resolution chain.
#[derive(Clone, Default)]
pub struct Chain {
    steps: Vec<ChainStep>,
    required: CapabilitySet,
    supplemental: Supplemental,
    workflow: Option<WorkflowFn>,
    pass_params: bool,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("steps", &self.steps)
            .field("required", &self.required)
            .field("supplemental", &self.supplemental)
            .field("workflow", &self.workflow.is_some())
            .field("pass_params", &self.pass_params)
            .finish()
    }
}

impl Chain {
    /// Start declaring a chain.
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// A chain with no steps; resolves straight to an empty invocation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The declared steps.
    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    /// Permissions any one of which the final capability set must hold.
    pub fn required(&self) -> &CapabilitySet {
        &self.required
    }

    /// Run the chain for one request.
    pub async fn resolve<L>(&self, ctx: &RequestContext, lookup: &L) -> Result<Resolution, RequestError>
    where
        L: EntityLookup,
    {
        let check = !self.required.is_empty();
        let mut bindings = Bindings::new();
        let mut capabilities: Option<CapabilitySet> = None;
        let mut supplemental: Option<CapabilitySet> = None;

        for step in &self.steps {
            let (kind, entity, token) = find(step, &bindings, ctx, lookup).await?;

            if let Some(marker) = entity.as_redirect_marker() {
                let view_args = marker.target_view_args(ctx.view_args());
                info!(binding = %step.binding, kind = %kind, "redirect marker resolved");
                return Ok(Resolution::Redirect(Redirect::found(ctx.endpoint(), view_args)));
            }

            if let Some(view_args) = token
                .as_ref()
                .and_then(|token| canonical::correction(token, entity.as_ref(), ctx))
            {
                info!(binding = %step.binding, kind = %kind, "redirecting to canonical address");
                return Ok(Resolution::Redirect(Redirect::found(ctx.endpoint(), view_args)));
            }

            if check {
                let extra = supplemental.get_or_insert_with(|| self.supplemental.resolve());
                capabilities = Some(permission::compose(
                    capabilities.as_ref(),
                    entity.as_ref(),
                    ctx.actor(),
                    extra,
                ));
            }

            debug!(binding = %step.binding, kind = %kind, key = %entity.key(), "bound entity");
            bindings.bind(step.binding.clone(), entity);
        }

        if check {
            let granted = capabilities.get_or_insert_with(|| {
                supplemental.take().unwrap_or_else(|| self.supplemental.resolve())
            });
            if !permission::satisfies(&self.required, granted) {
                info!(required = %self.required, granted = %granted, "permission denied");
                return Err(RequestError::Forbidden {
                    required: self.required.clone(),
                });
            }
        }

        let workflow = self
            .workflow
            .as_ref()
            .and_then(|build| bindings.last().map(|last| build(last)));
        let args = match workflow {
            Some(workflow) => HandlerArgs::Workflow(workflow),
            None => HandlerArgs::Bindings(bindings),
        };

        Ok(Resolution::Proceed(Invocation {
            args,
            capabilities,
            params: self.pass_params.then(|| ctx.view_args().clone()),
        }))
    }
}

/// Try each candidate kind of `step` in order; the first match wins.
async fn find<L>(
    step: &ChainStep,
    bindings: &Bindings,
    ctx: &RequestContext,
    lookup: &L,
) -> Result<(EntityKind, EntityRef, Option<SuppliedToken>), RequestError>
where
    L: EntityLookup,
{
    for kind in &step.candidates {
        let built = predicate::build_predicates(step, kind, bindings, ctx)?;
        let found = lookup
            .lookup(kind, &built.predicates)
            .await
            .map_err(RequestError::Lookup)?;
        if let Some(entity) = found {
            return Ok((*kind, entity, built.token));
        }
    }
    debug!(binding = %step.binding, "no candidate matched");
    Err(RequestError::NotFound)
}

/// Declares a [`Chain`]; validated by [`build`](ChainBuilder::build).
#[derive(Default)]
pub struct ChainBuilder {
    steps: Vec<ChainStep>,
    required: CapabilitySet,
    supplemental: Supplemental,
    workflow: Option<WorkflowFn>,
    pass_params: bool,
}

impl ChainBuilder {
    /// Append a step.
    pub fn step(mut self, step: ChainStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Require `permission`. Several calls accumulate; holding any one of the
    /// required permissions is enough.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.required.insert(permission);
        self
    }

    /// Require any of `permissions`.
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(permissions);
        self
    }

    /// Permissions granted on top of what the entities compute.
    pub fn supplemental(mut self, supplemental: impl Into<Supplemental>) -> Self {
        self.supplemental = supplemental.into();
        self
    }

    /// Hand the handler only the object `build` makes from the last entity.
    pub fn workflow<F, W>(mut self, build: F) -> Self
    where
        F: Fn(&EntityRef) -> W + Send + Sync + 'static,
        W: Any + Send + Sync,
    {
        self.workflow = Some(Arc::new(move |entity| Arc::new(build(entity)) as Workflow));
        self
    }

    /// Also pass the raw view arguments to the handler.
    pub fn pass_params(mut self) -> Self {
        self.pass_params = true;
        self
    }

    /// Validate and freeze the chain.
    pub fn build(self) -> Result<Chain, ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for step in &self.steps {
            if step.candidates.is_empty() {
                return Err(ConfigError::NoCandidates(step.binding.clone()));
            }
            for source in step.attributes.values() {
                if let ValueSource::Path { binding, .. } = source {
                    if !seen.contains(binding.as_str()) {
                        return Err(ConfigError::UnknownBinding {
                            step: step.binding.clone(),
                            reference: format!("{source:?}"),
                        });
                    }
                }
            }
            if !seen.insert(step.binding.as_str()) {
                return Err(ConfigError::DuplicateBinding(step.binding.clone()));
            }
        }
        if self.workflow.is_some() && self.steps.is_empty() {
            return Err(ConfigError::WorkflowWithoutSteps);
        }

        Ok(Chain {
            steps: self.steps,
            required: self.required,
            supplemental: self.supplemental,
            workflow: self.workflow,
            pass_params: self.pass_params,
        })
    }
}
