//! # vestibule-core
//!
//! Core traits and types for the Vestibule request pipeline.
//!
//! This crate has minimal dependencies and is meant to be imported by entity
//! crates and storage backends that do not need the standard pipeline in
//! `vestibule-std`.
//!
//! # Pipeline Layers
//!
//! ## Layer 1: Entities ([`Entity`])
//!
//! Read-only values loaded from request data. Each entity answers a small set
//! of capability queries: its permissions for the current actor, whether it is
//! a redirect marker, and its canonical slug when its kind uses composite
//! `{id}-{slug}` addressing.
//!
//! ## Layer 2: Capabilities ([`EntityLookup`], [`TemplateEngine`])
//!
//! The external services the pipeline consumes. Both are `async` since they
//! are the only operations allowed to block on I/O.
//!
//! ## Layer 3: Context ([`RequestContext`])
//!
//! An explicit per-request value: actor, endpoint, view arguments, parameters,
//! method, headers, and the render flag.
//!
//! ## Layer 4: Replies ([`Reply`], [`Output`])
//!
//! What handlers return and what the rendering stage produces.
//!
//! # Error Types
//!
//! - [`ConfigError`] - Declaration errors raised at registration
//! - [`RequestError`] - Per-request failures with an HTTP status

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod capability;
mod context;
mod entity;
mod error;
mod lookup;
mod response;

// Re-exports
pub use capability::CapabilitySet;
pub use context::{Params, RequestContext, ViewArgs};
pub use entity::{Actor, CompositeAddress, Entity, EntityKind, EntityRef, RedirectMarker, Value};
pub use error::{AttributeError, BoxError, ClientDataError, ConfigError, RequestError};
pub use lookup::{EntityLookup, Predicates, TemplateEngine};
pub use response::{
    DEFAULT_CONTENT_TYPE, IntoReply, Output, Reply, Response, TemplateContext, append_headers,
    build_response, content_type_for,
};

pub use http;
pub use serde_json;
