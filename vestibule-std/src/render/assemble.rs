//! Response Assembler.

use super::{
    RenderError,
    accept::Selection,
    table::{Renderer, RendererOutput},
};
use http::{HeaderMap, StatusCode};
use tracing::debug;
use vestibule_core::{
    DEFAULT_CONTENT_TYPE, Output, Reply, RequestContext, RequestError, Response, TemplateContext,
    TemplateEngine, append_headers, build_response, content_type_for,
};

/// Turn a handler reply into output using the selected renderer.
///
/// Responses pass through untouched and a missing selection leaves the reply
/// unrendered.
pub async fn assemble<T>(
    reply: Reply,
    selection: Option<Selection<'_>>,
    ctx: &RequestContext,
    engine: &T,
) -> Result<Output, RequestError>
where
    T: TemplateEngine,
{
    let (value, status, headers) = match reply {
        Reply::Response(response) => return Ok(Output::Response(response)),
        Reply::Data {
            value,
            status,
            headers,
        } => (value, status, headers),
    };
    let Some(selection) = selection else {
        return Ok(Output::Unrendered(Reply::Data {
            value,
            status,
            headers,
        }));
    };
    debug!(mimetype = selection.mimetype, "rendering reply");

    match selection.renderer {
        Renderer::Callable(render) => {
            let output = render(ctx, &value).map_err(RequestError::render)?;
            Ok(Output::Response(match output {
                RendererOutput::Response(response) => restamp(response, status, headers),
                RendererOutput::Body(body) => {
                    build_response(body, &content_type(&selection), status, headers)
                }
            }))
        }
        Renderer::Template(template) => {
            let context = template_context(template, value)?;
            let body = engine
                .render(template, &context)
                .await
                .map_err(RequestError::Render)?;
            if selection.is_wildcard() {
                Ok(Output::Native {
                    body,
                    status,
                    headers,
                })
            } else {
                Ok(Output::Response(build_response(
                    body,
                    &content_type(&selection),
                    status,
                    headers,
                )))
            }
        }
    }
}

fn restamp(mut response: Response, status: Option<StatusCode>, headers: Option<HeaderMap>) -> Response {
    if let Some(status) = status {
        *response.status_mut() = status;
    }
    if let Some(headers) = headers {
        append_headers(&mut response, &headers);
    }
    response
}

fn content_type(selection: &Selection<'_>) -> String {
    if selection.is_wildcard() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        content_type_for(selection.mimetype)
    }
}

fn template_context(template: &str, value: serde_json::Value) -> Result<TemplateContext, RequestError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(RequestError::render(RenderError::NotAMapping {
            template: template.to_string(),
            found: json_type(&other),
        })),
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
