//! # vestibule - Declarative Request Pipeline
//!
//! `vestibule` sits between routing and view code. Each view declares
//!
//! - a **resolution chain**: which entities to load from the URL, in order,
//!   with redirects for moved resources and stale slugs, and permission
//!   checks across the loaded entities
//! - a **renderer table**: how the handler's reply is rendered for each
//!   mimetype the client may ask for
//!
//! The handler only ever sees resolved, authorized entities and returns plain
//! data.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vestibule::prelude::*;
//!
//! const FOLDER: EntityKind = EntityKind::new("folder");
//! const PAGE: EntityKind = EntityKind::new("page");
//!
//! let chain = Chain::builder()
//!     .step(ChainStep::new(FOLDER, "folder").attr("name", "folder_name"))
//!     .step(ChainStep::new(PAGE, "page").attr("name", "page_name").attr("parent", "folder"))
//!     .permission("view")
//!     .build()?;
//!
//! let urls = UrlMap::builder()
//!     .route("/{folder_name}/{page_name}", "show_page")
//!     .build()?;
//!
//! let app = App::builder(urls, store, templates)
//!     .view(
//!         "show_page",
//!         View::new(show_page)
//!             .chain(chain)
//!             .render_with(RendererTable::with_template("page.html")),
//!     )
//!     .build()?;
//!
//! let response = app.dispatch(request).await;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod app;
mod handler;
#[cfg(feature = "tower")]
pub mod service;
mod view;

pub use app::{App, AppBuilder};
pub use handler::{ViewHandler, WithContext, with_context};
pub use view::{View, ViewOutcome};

pub use vestibule_core::{
    // Entities
    Actor,
    // Errors
    AttributeError,
    BoxError,
    // Capabilities
    CapabilitySet,
    ClientDataError,
    CompositeAddress,
    ConfigError,
    Entity,
    EntityKind,
    EntityLookup,
    EntityRef,
    // Replies
    IntoReply,
    Output,
    // Context
    Params,
    Predicates,
    RedirectMarker,
    Reply,
    RequestContext,
    RequestError,
    Response,
    TemplateContext,
    TemplateEngine,
    Value,
    ViewArgs,
};

pub use vestibule_std::{
    Args, Bindings, Chain, ChainBuilder, ChainStep, Fallback, HandlerArgs, Invocation, NextUrl,
    Redirect, RenderError, Renderer, RendererOutput, RendererTable, RequestArgs, Resolution,
    Supplemental, UrlMap, UrlMapBuilder, ValueSource, current_url, filters,
};

pub use vestibule_core::{http, serde_json};

/// Content negotiation and renderers.
pub mod render {
    #![allow(clippy::wildcard_imports)]
    pub use vestibule_std::render::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use vestibule_std::testing::*;
}

/// Prelude module - common imports for Vestibule.
///
/// # Usage
///
/// ```rust,ignore
/// use vestibule::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Application
        App,
        // Chains
        Chain,
        ChainStep,
        // Entities
        Entity,
        EntityKind,
        EntityLookup,
        Invocation,
        // Replies
        IntoReply,
        RendererTable,
        RequestContext,
        // Errors
        RequestError,
        TemplateEngine,
        UrlMap,
        Value,
        View,
        ViewArgs,
        ViewHandler,
    };
}
