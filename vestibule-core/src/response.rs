//! Handler replies and rendered output.
//!
//! A handler returns something that implements [`IntoReply`]:
//!
//! - `Response` → passes through rendering untouched
//! - `serde_json::Value` / [`TemplateContext`] → rendered with default status
//! - `(value, StatusCode)` → rendered with an explicit status
//! - `(value, StatusCode, HeaderMap)` → rendered with status and extra headers

use http::{HeaderMap, HeaderValue, StatusCode, header};

/// The HTTP response type produced by the pipeline.
pub type Response = http::Response<String>;

/// Named template parameters.
pub type TemplateContext = serde_json::Map<String, serde_json::Value>;

/// Default content type for bodies whose renderer did not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A handler's normalized return value.
#[derive(Debug)]
pub enum Reply {
    /// A fully formed response; rendering leaves it alone.
    Response(Response),
    /// Data for a renderer, with an optional status and extra headers.
    Data {
        /// The payload passed to the renderer.
        value: serde_json::Value,
        /// Status to apply to the rendered response.
        status: Option<StatusCode>,
        /// Headers to add to the rendered response.
        headers: Option<HeaderMap>,
    },
}

impl Reply {
    /// A data reply with no status or headers.
    pub fn data(value: impl Into<serde_json::Value>) -> Self {
        Reply::Data {
            value: value.into(),
            status: None,
            headers: None,
        }
    }

    /// The data payload, if this is not a response.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Reply::Data { value, .. } => Some(value),
            Reply::Response(_) => None,
        }
    }
}

/// Conversion of handler output into a [`Reply`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a view handler",
    label = "missing `IntoReply` implementation",
    note = "Return a `Response`, a JSON value, or a `(value, StatusCode[, HeaderMap])` tuple."
)]
pub trait IntoReply {
    /// Normalize into a reply.
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply {
        Reply::Response(self)
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Reply {
        Reply::data(self)
    }
}

impl IntoReply for TemplateContext {
    fn into_reply(self) -> Reply {
        Reply::data(self)
    }
}

impl<V: Into<serde_json::Value>> IntoReply for (V, StatusCode) {
    fn into_reply(self) -> Reply {
        Reply::Data {
            value: self.0.into(),
            status: Some(self.1),
            headers: None,
        }
    }
}

impl<V: Into<serde_json::Value>> IntoReply for (V, StatusCode, HeaderMap) {
    fn into_reply(self) -> Reply {
        Reply::Data {
            value: self.0.into(),
            status: Some(self.1),
            headers: Some(self.2),
        }
    }
}

/// What the rendering stage hands back to the caller.
#[derive(Debug)]
pub enum Output {
    /// A finished response.
    Response(Response),
    /// A body rendered by the template engine's own conventions, with the
    /// reply's status and headers re-attached but no content type forced.
    Native {
        /// The rendered body.
        body: String,
        /// Status from the reply, if any.
        status: Option<StatusCode>,
        /// Headers from the reply, if any.
        headers: Option<HeaderMap>,
    },
    /// Rendering was skipped; the reply is returned as the handler gave it.
    Unrendered(Reply),
}

impl Output {
    /// Convert to an HTTP response.
    ///
    /// Native bodies take [`DEFAULT_CONTENT_TYPE`]. Unrendered data is
    /// serialized as JSON.
    pub fn into_response(self) -> Response {
        match self {
            Output::Response(response) => response,
            Output::Native {
                body,
                status,
                headers,
            } => build_response(body, DEFAULT_CONTENT_TYPE, status, headers),
            Output::Unrendered(Reply::Response(response)) => response,
            Output::Unrendered(Reply::Data {
                value,
                status,
                headers,
            }) => build_response(value.to_string(), "application/json", status, headers),
        }
    }

    /// The unrendered reply, if rendering was skipped.
    pub fn unrendered(self) -> Option<Reply> {
        match self {
            Output::Unrendered(reply) => Some(reply),
            _ => None,
        }
    }
}

/// The `Content-Type` value for a mimetype; textual types get a UTF-8 charset.
pub fn content_type_for(mimetype: &str) -> String {
    if mimetype.starts_with("text/") && !mimetype.contains("charset") {
        format!("{mimetype}; charset=utf-8")
    } else {
        mimetype.to_string()
    }
}

/// Build a response with a body, content type, optional status and headers.
///
/// Headers are appended after the content type, so a caller-supplied
/// `Content-Type` adds a second value rather than replacing the first.
pub fn build_response(
    body: String,
    content_type: &str,
    status: Option<StatusCode>,
    headers: Option<HeaderMap>,
) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status.unwrap_or(StatusCode::OK);
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    if let Some(headers) = headers {
        append_headers(&mut response, &headers);
    }
    response
}

/// Append every header of `headers` to `response`, keeping existing values.
pub fn append_headers(response: &mut Response, headers: &HeaderMap) {
    for (name, value) in headers {
        response.headers_mut().append(name.clone(), value.clone());
    }
}
