#![allow(dead_code)]

use std::{any::Any, sync::Arc};
use vestibule::{
    Actor, App, CapabilitySet, Chain, ChainStep, Entity, EntityKind, Invocation, RedirectMarker,
    RendererTable, RequestError, UrlMap, Value, View, ViewArgs,
    serde_json::{self, json},
    testing::{CallCounter, MemoryStore, RecordingTemplates},
};

// ============================================================================
// Entity Kinds
// ============================================================================

pub const FOLDER: EntityKind = EntityKind::new("folder");
pub const PAGE: EntityKind = EntityKind::new("page");
pub const MOVED_PAGE: EntityKind = EntityKind::new("moved_page");
pub const COMMENT: EntityKind = EntityKind::new("comment");
pub const POST: EntityKind = EntityKind::new("post").with_composite("url_id", "url_name");

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub owner: String,
}

impl Entity for Folder {
    fn kind(&self) -> EntityKind {
        FOLDER
    }

    fn key(&self) -> serde_json::Value {
        self.id.into()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "owner" => Some(self.owner.as_str().into()),
            _ => None,
        }
    }

    fn permissions(&self, actor: Option<&Actor>, inherited: Option<&CapabilitySet>) -> CapabilitySet {
        let mut granted = inherited.cloned().unwrap_or_default();
        granted.insert("view");
        if actor.is_some_and(|actor| actor.id() == self.owner) {
            granted.insert("edit");
        }
        granted
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct Page {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub folder: Arc<Folder>,
    pub locked: bool,
}

impl Entity for Page {
    fn kind(&self) -> EntityKind {
        PAGE
    }

    fn key(&self) -> serde_json::Value {
        self.id.into()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "title" => Some(self.title.as_str().into()),
            "parent" => Some(Value::Entity(self.folder.clone())),
            _ => None,
        }
    }

    fn permissions(&self, _actor: Option<&Actor>, inherited: Option<&CapabilitySet>) -> CapabilitySet {
        let mut granted = inherited.cloned().unwrap_or_default();
        if self.locked {
            granted.remove("edit");
        }
        granted
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MovedPage {
    pub name: String,
    pub folder: Arc<Folder>,
    pub target: String,
}

impl Entity for MovedPage {
    fn kind(&self) -> EntityKind {
        MOVED_PAGE
    }

    fn key(&self) -> serde_json::Value {
        json!([self.folder.id, self.name])
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(self.name.as_str().into()),
            "parent" => Some(Value::Entity(self.folder.clone())),
            _ => None,
        }
    }

    fn as_redirect_marker(&self) -> Option<&dyn RedirectMarker> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl RedirectMarker for MovedPage {
    fn target_view_args(&self, current: &ViewArgs) -> ViewArgs {
        current.merged(&ViewArgs::new().with("page_name", self.target.as_str()))
    }
}

#[derive(Debug)]
pub struct Comment {
    pub id: i64,
    pub page_id: i64,
    pub body: String,
}

impl Entity for Comment {
    fn kind(&self) -> EntityKind {
        COMMENT
    }

    fn key(&self) -> serde_json::Value {
        self.id.into()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "page_id" => Some(self.page_id.into()),
            "body" => Some(self.body.as_str().into()),
            _ => None,
        }
    }

    // Comments can be read but never edited through their page.
    fn permissions(&self, _actor: Option<&Actor>, inherited: Option<&CapabilitySet>) -> CapabilitySet {
        inherited
            .map(|set| set.iter().filter(|p| *p == "view").collect())
            .unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

impl Entity for Post {
    fn kind(&self) -> EntityKind {
        POST
    }

    fn key(&self) -> serde_json::Value {
        self.id.into()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "url_id" => Some(self.id.into()),
            "title" => Some(self.title.as_str().into()),
            _ => None,
        }
    }

    fn canonical_slug(&self) -> Option<String> {
        Some(self.slug.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn docs_folder() -> Arc<Folder> {
    Arc::new(Folder {
        id: 1,
        name: "docs".into(),
        owner: "ann".into(),
    })
}

pub fn store() -> MemoryStore {
    let docs = docs_folder();
    MemoryStore::new()
        .with(Folder {
            id: docs.id,
            name: docs.name.clone(),
            owner: docs.owner.clone(),
        })
        .with(Page {
            id: 10,
            name: "intro".into(),
            title: "Introduction".into(),
            folder: docs.clone(),
            locked: false,
        })
        .with(Page {
            id: 11,
            name: "charter".into(),
            title: "Charter".into(),
            folder: docs.clone(),
            locked: true,
        })
        .with(MovedPage {
            name: "getting-started".into(),
            folder: docs,
            target: "intro".into(),
        })
        .with(Comment {
            id: 100,
            page_id: 10,
            body: "Nice".into(),
        })
        .with(Post {
            id: 42,
            slug: "new-name".into(),
            title: "Hello".into(),
        })
}

pub fn page_chain() -> Chain {
    Chain::builder()
        .step(ChainStep::new(FOLDER, "folder").attr("name", "folder_name"))
        .step(
            ChainStep::any_of([PAGE, MOVED_PAGE], "page")
                .attr("name", "page_name")
                .attr("parent", "folder"),
        )
        .build()
        .expect("valid page chain")
}

pub fn urls() -> UrlMap {
    UrlMap::builder()
        .route("/", "index")
        .route("/{folder_name}/{page_name}", "show_page")
        .route("/{folder_name}/{page_name}/edit", "edit_page")
        .route("/{folder_name}/{page_name}/comments/{comment_id}", "show_comment")
        .route("/blog/{post}", "view_post")
        .build()
        .expect("valid url map")
}

pub struct Site {
    pub app: App<MemoryStore, RecordingTemplates>,
    pub store: MemoryStore,
    pub templates: RecordingTemplates,
    pub calls: CallCounter,
}

fn page_json(invocation: &Invocation) -> Result<serde_json::Value, RequestError> {
    let page = invocation.get::<Page>("page").ok_or(RequestError::NotFound)?;
    let folder = invocation
        .get::<Folder>("folder")
        .ok_or(RequestError::NotFound)?;
    Ok(json!({
        "folder": folder.name,
        "title": page.title,
        "capabilities": invocation
            .capabilities()
            .map(|caps| caps.iter().map(str::to_string).collect::<Vec<_>>()),
    }))
}

pub fn site() -> Site {
    let store = store();
    let templates = RecordingTemplates::new();
    let calls = CallCounter::new();

    let show_page = {
        let calls = calls.clone();
        View::new(move |invocation: Invocation| {
            calls.hit();
            let reply = page_json(&invocation);
            async move { reply }
        })
        .chain(page_chain())
        .render_with(
            RendererTable::builder()
                .default_template("page.html")
                .template("text/html", "page.html")
                .build()
                .expect("valid renderers"),
        )
    };

    let edit_page = {
        let calls = calls.clone();
        let chain = Chain::builder()
            .step(ChainStep::new(FOLDER, "folder").attr("name", "folder_name"))
            .step(
                ChainStep::new(PAGE, "page")
                    .attr("name", "page_name")
                    .attr("parent", "folder"),
            )
            .permission("edit")
            .build()
            .expect("valid edit chain");
        View::new(move |invocation: Invocation| {
            calls.hit();
            let reply = page_json(&invocation);
            async move { reply }
        })
        .chain(chain)
    };

    let show_comment = {
        let calls = calls.clone();
        let chain = Chain::builder()
            .step(ChainStep::new(FOLDER, "folder").attr("name", "folder_name"))
            .step(
                ChainStep::new(PAGE, "page")
                    .attr("name", "page_name")
                    .attr("parent", "folder"),
            )
            .step(
                ChainStep::new(COMMENT, "comment")
                    .attr("page_id", "page.id")
                    .attr_with("id", |_, args| {
                        args.get("comment_id")
                            .and_then(|id| id.parse::<i64>().ok())
                            .map(Value::from)
                            .unwrap_or_else(Value::null)
                    }),
            )
            .permission("edit")
            .build()
            .expect("valid comment chain");
        View::new(move |_: Invocation| {
            calls.hit();
            async { Ok::<_, RequestError>(json!({})) }
        })
        .chain(chain)
    };

    let view_post = {
        let calls = calls.clone();
        let chain = Chain::builder()
            .step(ChainStep::new(POST, "post").attr("url_name", "post"))
            .build()
            .expect("valid post chain");
        View::new(move |invocation: Invocation| {
            calls.hit();
            let title = invocation.get::<Post>("post").map(|post| post.title.clone());
            async move { Ok::<_, RequestError>(json!({ "title": title })) }
        })
        .chain(chain)
        .render_with(RendererTable::with_template("post.html"))
    };

    let app = App::builder(urls(), store.clone(), templates.clone())
        .view("show_page", show_page)
        .view("edit_page", edit_page)
        .view("show_comment", show_comment)
        .view("view_post", view_post)
        .build()
        .expect("valid app");

    Site {
        app,
        store,
        templates,
        calls,
    }
}
