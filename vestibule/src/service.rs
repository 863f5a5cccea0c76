//! Tower integration for vestibule.
//!
//! [`AppService`] exposes an [`App`] as a `tower::Service<Request<String>>`,
//! so tower middleware (timeouts, concurrency limits, tracing layers) can be
//! stacked in front of it.
//!
//! ```rust,ignore
//! use vestibule::service::AppService;
//!
//! let service = AppService::new(app);
//! let with_timeout = tower::timeout::Timeout::new(service, Duration::from_secs(5));
//! ```

use crate::app::App;
use futures::future::BoxFuture;
use http::Request;
use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};
use vestibule_core::{EntityLookup, Response, TemplateEngine};

/// Wraps an [`App`] as a tower `Service`.
///
/// Errors are already turned into status responses by the app, so the
/// service itself never fails.
pub struct AppService<L, T> {
    app: Arc<App<L, T>>,
}

impl<L, T> AppService<L, T> {
    /// Create a service serving `app`.
    pub fn new(app: App<L, T>) -> Self {
        Self { app: Arc::new(app) }
    }

    /// Create a service from an already shared app.
    pub fn from_arc(app: Arc<App<L, T>>) -> Self {
        Self { app }
    }

    /// Get a reference to the inner app.
    pub fn inner(&self) -> &App<L, T> {
        &self.app
    }
}

impl<L, T> Clone for AppService<L, T> {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
        }
    }
}

impl<L, T> ::tower::Service<Request<String>> for AppService<L, T>
where
    L: EntityLookup + 'static,
    T: TemplateEngine + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Views hold no per-request state
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<String>) -> Self::Future {
        let app = Arc::clone(&self.app);
        Box::pin(async move { Ok(app.dispatch(request).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::View;
    use ::tower::Service;
    use http::StatusCode;
    use serde_json::json;
    use vestibule_core::RequestError;
    use vestibule_std::{
        Invocation, UrlMap,
        testing::{MemoryStore, RecordingTemplates},
    };

    fn service() -> AppService<MemoryStore, RecordingTemplates> {
        let urls = UrlMap::builder().route("/ping", "ping").build().unwrap();
        let app = App::builder(urls, MemoryStore::new(), RecordingTemplates::new())
            .view(
                "ping",
                View::new(|_: Invocation| async { Ok::<_, RequestError>(json!({"pong": true})) }),
            )
            .build()
            .unwrap();
        AppService::new(app)
    }

    #[tokio::test]
    async fn test_service_call() {
        let mut service = service();
        let request = Request::get("/ping").body(String::new()).unwrap();
        let response = service.call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), r#"{"pong":true}"#);
    }

    #[tokio::test]
    async fn test_service_unknown_path() {
        let mut service = service().clone();
        let request = Request::get("/nope").body(String::new()).unwrap();
        let response = service.call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
