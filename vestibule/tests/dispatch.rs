mod common;

use common::{page_chain, site, store};
use vestibule::{
    Actor, App, Args, Invocation, RequestArgs, RequestContext, RequestError, UrlMap, View,
    filters,
    http::{Request, StatusCode, header},
    serde_json::{Value, json},
    testing::RecordingTemplates,
    with_context,
};

fn echo_view() -> View<impl vestibule::ViewHandler> {
    View::new(with_context(|_: Invocation, ctx: RequestContext| async move {
        let args = RequestArgs::new()
            .arg("title")
            .arg_with("tags[]", filters::int)
            .extract(Some(&ctx), Args::new())?;
        Ok::<_, RequestError>(json!({
            "title": args.get("title").cloned().unwrap_or(Value::Null),
            "tags": args.get("tags").cloned().unwrap_or(Value::Null),
            "actor": ctx.actor().map(Actor::id),
        }))
    }))
}

fn echo_app() -> App<vestibule::testing::MemoryStore, RecordingTemplates> {
    let urls = UrlMap::builder().route("/echo", "echo").build().unwrap();
    App::builder(urls, store(), RecordingTemplates::new())
        .view("echo", echo_view())
        .build()
        .unwrap()
}

fn body_json(response: &vestibule::Response) -> Value {
    vestibule::serde_json::from_str(response.body()).unwrap()
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_unknown_path_is_empty_404() {
    let site = site();

    let response = site
        .app
        .dispatch(Request::get("/docs/intro/nothing/here").body(String::new()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.body().is_empty());
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    assert!(site.store.lookups().is_empty());
}

#[tokio::test]
async fn test_routed_endpoint_without_view_is_404() {
    let site = site();

    let response = site
        .app
        .dispatch(Request::get("/").body(String::new()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_script_root_prefixes_paths_and_redirects() {
    let urls = UrlMap::builder()
        .route("/{folder_name}/{page_name}", "show_page")
        .script_root("/wiki/")
        .build()
        .unwrap();
    let app = App::builder(urls, store(), RecordingTemplates::new())
        .view(
            "show_page",
            View::new(|_: Invocation| async { Ok::<_, RequestError>(json!({})) }).chain(page_chain()),
        )
        .build()
        .unwrap();

    let ok = app
        .dispatch(Request::get("/wiki/docs/intro").body(String::new()).unwrap())
        .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let moved = app
        .dispatch(Request::get("/wiki/docs/getting-started").body(String::new()).unwrap())
        .await;
    assert_eq!(moved.status(), StatusCode::FOUND);
    assert_eq!(moved.headers()[header::LOCATION], "/wiki/docs/intro");
}

#[test]
fn test_view_for_unrouted_endpoint_is_rejected() {
    let urls = UrlMap::builder().route("/echo", "echo").build().unwrap();
    let err = App::builder(urls, store(), RecordingTemplates::new())
        .view("missing", echo_view())
        .build()
        .unwrap_err();
    assert!(matches!(err, vestibule::ConfigError::UnknownEndpoint(name) if name == "missing"));
}

#[test]
fn test_duplicate_view_is_rejected() {
    let urls = UrlMap::builder().route("/echo", "echo").build().unwrap();
    let err = App::builder(urls, store(), RecordingTemplates::new())
        .view("echo", echo_view())
        .view("echo", echo_view())
        .build()
        .unwrap_err();
    assert!(matches!(err, vestibule::ConfigError::DuplicateEndpoint(_)));
}

// ============================================================================
// Request Data
// ============================================================================

#[tokio::test]
async fn test_query_arguments_reach_the_handler() {
    let app = echo_app();

    let response = app
        .dispatch(
            Request::get("/echo?title=Hi%20there&tags=1&tags=2")
                .body(String::new())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        json!({"title": "Hi there", "tags": [1, 2], "actor": null})
    );
}

#[tokio::test]
async fn test_form_body_is_parsed() {
    let app = echo_app();

    let response = app
        .dispatch(
            Request::post("/echo")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("title=From+form".to_string())
                .unwrap(),
        )
        .await;

    assert_eq!(body_json(&response)["title"], "From form");
}

#[tokio::test]
async fn test_non_form_body_is_ignored() {
    let app = echo_app();

    let response = app
        .dispatch(
            Request::post("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(r#"{"title":"nope"}"#.to_string())
                .unwrap(),
        )
        .await;

    assert_eq!(body_json(&response)["title"], Value::Null);
}

#[tokio::test]
async fn test_bad_filtered_argument_is_400() {
    let app = echo_app();

    let response = app
        .dispatch(Request::get("/echo?tags=one").body(String::new()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_actor_comes_from_extensions() {
    let app = echo_app();
    let mut request = Request::get("/echo").body(String::new()).unwrap();
    request.extensions_mut().insert(Actor::new("ann"));

    let response = app.dispatch(request).await;

    assert_eq!(body_json(&response)["actor"], "ann");
}

// ============================================================================
// Tower
// ============================================================================

#[cfg(feature = "tower")]
#[tokio::test]
async fn test_app_as_tower_service() {
    use tower::{Service, ServiceExt};
    use vestibule::service::AppService;

    let mut service = AppService::new(site().app);
    let request = Request::get("/docs/getting-started").body(String::new()).unwrap();

    let response = service.ready().await.unwrap().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/docs/intro");
}
