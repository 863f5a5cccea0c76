//! # vestibule-std
//!
//! Standard implementations for the Vestibule request pipeline.
//!
//! This crate provides:
//! - **Resolution chains**: [`Chain`], [`ChainStep`], [`Resolution`]
//! - **Rendering**: [`RendererTable`], content negotiation, JSON/JSONP
//! - **URL map**: [`UrlMap`], [`current_url`]
//! - **Request helpers**: [`RequestArgs`], [`NextUrl`]
//! - **Testing**: in-memory doubles in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use vestibule_core;

// Modules
pub mod args;
pub mod chain;
pub mod next_url;
pub mod render;
pub mod routing;
pub mod testing;

pub use args::{Args, RequestArgs, filters};
pub use chain::{
    Bindings, Chain, ChainBuilder, ChainStep, HandlerArgs, Invocation, Redirect, Resolution,
    Supplemental, ValueSource,
};
pub use next_url::{Fallback, NextUrl};
pub use render::{RenderError, Renderer, RendererOutput, RendererTable, render_reply};
pub use routing::{UrlMap, UrlMapBuilder, current_url, parse_params};
