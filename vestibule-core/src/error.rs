//! Error types for Vestibule.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`ConfigError`] - Malformed declarations, raised at registration time
//! - [`RequestError`] - Per-request failures that map to an HTTP status
//! - [`ClientDataError`] - Malformed request-derived input (400)
//! - [`AttributeError`] - A dotted reference could not be traversed (500)

use crate::capability::CapabilitySet;
use http::StatusCode;
use thiserror::Error;

/// A boxed error type for errors raised by external capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A malformed chain, renderer table, or route declaration.
///
/// These are programming mistakes. Builders return them so that they surface
/// when the application is assembled, never in the middle of a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two chain steps share a binding name.
    #[error("duplicate binding `{0}` in resolution chain")]
    DuplicateBinding(String),

    /// A dotted reference names a binding that no earlier step produces.
    #[error("step `{step}` references unknown binding `{reference}`")]
    UnknownBinding {
        /// The binding of the step holding the reference.
        step: String,
        /// The dotted reference as declared.
        reference: String,
    },

    /// A chain step was declared without any candidate entity kind.
    #[error("step `{0}` has no candidate entity kinds")]
    NoCandidates(String),

    /// A workflow transform was requested on a chain without steps.
    #[error("workflow requires at least one chain step")]
    WorkflowWithoutSteps,

    /// A renderer table key is not a `type/subtype` mimetype.
    #[error("invalid mimetype `{0}` in renderer table")]
    InvalidMimetype(String),

    /// A mimetype was registered twice in the same renderer table.
    #[error("duplicate renderer for `{0}`")]
    DuplicateRenderer(String),

    /// A route pattern was registered twice or conflicts with another.
    #[error("route `{pattern}` rejected: {reason}")]
    InvalidRoute {
        /// The offending pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// Two routes were registered for the same endpoint.
    #[error("endpoint `{0}` is already registered")]
    DuplicateEndpoint(String),

    /// A URL was requested for an endpoint that was never registered.
    #[error("no route registered for endpoint `{0}`")]
    UnknownEndpoint(String),

    /// A URL could not be built because a path parameter has no value.
    #[error("endpoint `{endpoint}` requires view argument `{argument}`")]
    MissingViewArg {
        /// The endpoint being built.
        endpoint: String,
        /// The missing path parameter.
        argument: String,
    },
}

/// Raised when a dotted reference hits an entity without the named attribute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{path}`: no attribute `{attribute}`")]
pub struct AttributeError {
    /// The full dotted reference being resolved.
    pub path: String,
    /// The attribute that was missing.
    pub attribute: String,
}

/// Malformed request-derived input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientDataError {
    /// A required argument was not supplied.
    #[error("missing required argument `{0}`")]
    Missing(String),

    /// An argument was supplied but could not be converted.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue {
        /// The argument name.
        name: String,
        /// The conversion failure.
        reason: String,
    },
}

/// A per-request failure.
///
/// Every variant short-circuits the pipeline; the wrapped handler only runs
/// when the resolution chain succeeds.
#[derive(Error, Debug)]
pub enum RequestError {
    /// No entity matched, or a composite address did not parse.
    #[error("not found")]
    NotFound,

    /// The final capability set shares nothing with the required permissions.
    #[error("forbidden: requires one of {required}")]
    Forbidden {
        /// The permissions any one of which would have been sufficient.
        required: CapabilitySet,
    },

    /// The request carried malformed data.
    #[error(transparent)]
    BadRequest(#[from] ClientDataError),

    /// A dotted chain reference could not be traversed.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// The entity lookup backend failed.
    #[error("entity lookup failed")]
    Lookup(#[source] BoxError),

    /// A renderer or template failed.
    #[error("rendering failed")]
    Render(#[source] BoxError),

    /// A declaration turned out to be unusable while serving this request.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RequestError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::NotFound => StatusCode::NOT_FOUND,
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RequestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RequestError::Attribute(_)
            | RequestError::Lookup(_)
            | RequestError::Render(_)
            | RequestError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap a renderer failure.
    pub fn render(err: impl Into<BoxError>) -> Self {
        RequestError::Render(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RequestError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            RequestError::Forbidden {
                required: CapabilitySet::from(["edit"])
            }
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RequestError::from(ClientDataError::Missing("p".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::from(AttributeError {
                path: "folder.owner".into(),
                attribute: "owner".into(),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_forbidden_message_lists_requirement() {
        let err = RequestError::Forbidden {
            required: CapabilitySet::from(["delete", "edit"]),
        };
        assert_eq!(err.to_string(), "forbidden: requires one of {delete, edit}");
    }
}
