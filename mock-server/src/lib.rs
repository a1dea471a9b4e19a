//! In-memory stand-in for the Webflow v1 API.
//!
//! Implements the endpoints `webflow-core` calls, with bearer-token checks,
//! `limit`/`offset` paging and Webflow-shaped JSON errors. Every request that
//! reaches the router is recorded so tests can assert on what was sent.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SITE_ID: &str = "580e63e98c9a982ac9b8b741";
pub const COLLECTION_ID: &str = "580e63fc8c9a982ac9b8b745";
pub const DOMAINS: [&str; 2] = ["example.com", "www.example.com"];
pub const ACCEPT_VERSION: &str = "1.0.0";
pub const MAX_PAGE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "shortName")]
    pub short_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Domain {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip)]
    pub site_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_cid")]
    pub cid: String,
    #[serde(rename = "_draft")]
    pub draft: bool,
    #[serde(rename = "_archived")]
    pub archived: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "triggerType")]
    pub trigger_type: String,
    pub url: String,
    pub filter: Map<String, Value>,
    pub site: String,
}

#[derive(Deserialize)]
pub struct ItemBody {
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct PublishBody {
    pub domains: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateWebhook {
    #[serde(rename = "triggerType")]
    pub trigger_type: String,
    pub url: String,
    #[serde(default)]
    pub filter: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct Live {
    #[serde(default)]
    pub live: bool,
}

/// Everything the mock knows about. Items keep insertion order.
#[derive(Debug, Default)]
pub struct Store {
    pub sites: Vec<Site>,
    pub domains: HashMap<String, Vec<Domain>>,
    pub collections: Vec<Collection>,
    pub items: HashMap<String, Vec<Item>>,
    pub webhooks: HashMap<String, Vec<Webhook>>,
    pub publishes: Vec<(String, Vec<String>)>,
}

impl Store {
    /// One site with two domains and one empty collection.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.sites.push(Site {
            id: SITE_ID.to_string(),
            name: "Example Site".to_string(),
            short_name: "example-site".to_string(),
        });
        store.domains.insert(
            SITE_ID.to_string(),
            DOMAINS
                .iter()
                .map(|name| Domain {
                    id: new_id(),
                    name: name.to_string(),
                })
                .collect(),
        );
        store.collections.push(Collection {
            id: COLLECTION_ID.to_string(),
            name: "Posts".to_string(),
            slug: "post".to_string(),
            site_id: SITE_ID.to_string(),
        });
        store.items.insert(COLLECTION_ID.to_string(), Vec::new());
        store
    }

    /// Append `count` published items named `Item 0`, `Item 1`, ...
    pub fn seed_items(&mut self, collection_id: &str, count: usize) {
        let items = self.items.entry(collection_id.to_string()).or_default();
        let start = items.len();
        for n in start..start + count {
            let mut fields = Map::new();
            fields.insert("name".to_string(), json!(format!("Item {n}")));
            fields.insert("slug".to_string(), json!(format!("item-{n}")));
            items.push(Item {
                id: new_id(),
                cid: collection_id.to_string(),
                draft: false,
                archived: false,
                fields,
            });
        }
    }

    fn site(&self, site_id: &str) -> Result<&Site, ApiFailure> {
        self.sites
            .iter()
            .find(|s| s.id == site_id)
            .ok_or_else(|| not_found("Site"))
    }

    fn collection_items(&mut self, collection_id: &str) -> Result<&mut Vec<Item>, ApiFailure> {
        self.items
            .get_mut(collection_id)
            .ok_or_else(|| not_found("Collection"))
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    db: Db,
    requests: Arc<Mutex<Vec<String>>>,
}

impl AppState {
    pub fn new(token: &str, store: Store) -> Self {
        Self {
            token: Arc::from(token),
            db: Arc::new(RwLock::new(store)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn db(&self) -> Db {
        self.db.clone()
    }

    /// Every request seen so far, as `"METHOD /path?query"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

/// Webflow v1 error body.
pub type ApiFailure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, name: &str, msg: &str) -> ApiFailure {
    (
        status,
        Json(json!({
            "msg": msg,
            "code": status.as_u16(),
            "name": name,
            "path": "",
            "err": format!("{name}: {msg}"),
        })),
    )
}

fn not_found(what: &str) -> ApiFailure {
    failure(StatusCode::NOT_FOUND, "NotFound", &format!("{what} not found"))
}

fn validation(msg: &str) -> ApiFailure {
    failure(StatusCode::BAD_REQUEST, "ValidationError", msg)
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..24].to_string()
}

pub fn app(token: &str) -> Router {
    app_with_state(AppState::new(token, Store::seeded()))
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/info", get(info))
        .route("/sites", get(list_sites))
        .route("/sites/{site_id}", get(get_site))
        .route("/sites/{site_id}/publish", post(publish_site))
        .route("/sites/{site_id}/domains", get(list_domains))
        .route("/sites/{site_id}/collections", get(list_collections))
        .route("/sites/{site_id}/webhooks", get(list_webhooks).post(create_webhook))
        .route(
            "/sites/{site_id}/webhooks/{webhook_id}",
            get(get_webhook).delete(remove_webhook),
        )
        .route("/collections/{collection_id}", get(get_collection))
        .route(
            "/collections/{collection_id}/items",
            get(list_items).post(create_item),
        )
        .route(
            "/collections/{collection_id}/items/{item_id}",
            get(get_item)
                .put(update_item)
                .patch(patch_item)
                .delete(remove_item),
        )
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// Record the request, then require the bearer token and `Accept-Version`.
async fn authenticate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Ok(mut log) = state.requests.lock() {
        log.push(format!("{} {}", request.method(), request.uri()));
    }

    let headers = request.headers();
    let expected = format!("Bearer {}", state.token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        tracing::debug!(uri = %request.uri(), "rejecting request without valid token");
        return failure(StatusCode::UNAUTHORIZED, "Unauthorized", "Not Authorized").into_response();
    }
    let versioned = headers
        .get("accept-version")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == ACCEPT_VERSION);
    if !versioned {
        return validation("Missing or unsupported Accept-Version header").into_response();
    }

    next.run(request).await
}

// --- sites ---

async fn info() -> Json<Value> {
    Json(json!({
        "_id": "55818d58616600637b9a5786",
        "createdOn": "2016-10-03T23:12:00.755Z",
        "grantType": "authorization_code",
        "lastUsed": "2016-10-10T21:41:12.736Z",
        "sites": [SITE_ID],
        "orgs": [],
        "users": [],
        "rateLimit": 60,
        "status": "confirmed",
        "application": "mock"
    }))
}

async fn list_sites(State(state): State<AppState>) -> Json<Vec<Site>> {
    Json(state.db.read().await.sites.clone())
}

async fn get_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<Site>, ApiFailure> {
    let store = state.db.read().await;
    store.site(&site_id).cloned().map(Json)
}

async fn publish_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    Json(input): Json<PublishBody>,
) -> Result<Json<Value>, ApiFailure> {
    let mut store = state.db.write().await;
    store.site(&site_id)?;
    if input.domains.is_empty() {
        return Err(validation("domains must not be empty"));
    }
    let registered = store.domains.get(&site_id).cloned().unwrap_or_default();
    if let Some(unknown) = input
        .domains
        .iter()
        .find(|d| !registered.iter().any(|r| &r.name == *d))
    {
        return Err(validation(&format!("Unknown domain: {unknown}")));
    }
    store.publishes.push((site_id, input.domains));
    Ok(Json(json!({ "queued": true })))
}

async fn list_domains(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<Vec<Domain>>, ApiFailure> {
    let store = state.db.read().await;
    store.site(&site_id)?;
    Ok(Json(store.domains.get(&site_id).cloned().unwrap_or_default()))
}

// --- collections ---

async fn list_collections(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<Vec<Collection>>, ApiFailure> {
    let store = state.db.read().await;
    store.site(&site_id)?;
    Ok(Json(
        store
            .collections
            .iter()
            .filter(|c| c.site_id == site_id)
            .cloned()
            .collect(),
    ))
}

async fn get_collection(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> Result<Json<Collection>, ApiFailure> {
    let store = state.db.read().await;
    store
        .collections
        .iter()
        .find(|c| c.id == collection_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Collection"))
}

// --- items ---

async fn list_items(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<Value>, ApiFailure> {
    let mut store = state.db.write().await;
    let items = store.collection_items(&collection_id)?;
    let limit = page.limit.unwrap_or(MAX_PAGE).min(MAX_PAGE);
    let offset = page.offset.unwrap_or(0);
    let slice: Vec<&Item> = items.iter().skip(offset).take(limit).collect();
    Ok(Json(json!({
        "items": slice,
        "count": slice.len(),
        "limit": limit,
        "offset": offset,
        "total": items.len(),
    })))
}

async fn get_item(
    State(state): State<AppState>,
    Path((collection_id, item_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiFailure> {
    let mut store = state.db.write().await;
    let items = store.collection_items(&collection_id)?;
    let item = items
        .iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| not_found("Item"))?;
    Ok(Json(json!({
        "items": [item],
        "count": 1,
        "limit": 1,
        "offset": 0,
        "total": 1,
    })))
}

fn require_name(fields: &Map<String, Value>) -> Result<(), ApiFailure> {
    match fields.get("name") {
        Some(Value::String(name)) if !name.is_empty() => Ok(()),
        _ => Err(validation("Validation Failure: 'name' is required")),
    }
}

async fn create_item(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    Query(live): Query<Live>,
    Json(input): Json<ItemBody>,
) -> Result<Json<Item>, ApiFailure> {
    require_name(&input.fields)?;
    let mut store = state.db.write().await;
    let items = store.collection_items(&collection_id)?;
    let item = Item {
        id: new_id(),
        cid: collection_id,
        draft: !live.live,
        archived: false,
        fields: input.fields,
    };
    items.push(item.clone());
    Ok(Json(item))
}

async fn update_item(
    State(state): State<AppState>,
    Path((collection_id, item_id)): Path<(String, String)>,
    Query(live): Query<Live>,
    Json(input): Json<ItemBody>,
) -> Result<Json<Item>, ApiFailure> {
    require_name(&input.fields)?;
    let mut store = state.db.write().await;
    let items = store.collection_items(&collection_id)?;
    let item = items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| not_found("Item"))?;
    item.fields = input.fields;
    item.draft = !live.live;
    Ok(Json(item.clone()))
}

async fn patch_item(
    State(state): State<AppState>,
    Path((collection_id, item_id)): Path<(String, String)>,
    Query(live): Query<Live>,
    Json(input): Json<ItemBody>,
) -> Result<Json<Item>, ApiFailure> {
    let mut store = state.db.write().await;
    let items = store.collection_items(&collection_id)?;
    let item = items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| not_found("Item"))?;
    item.fields.extend(input.fields);
    item.draft = !live.live;
    Ok(Json(item.clone()))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((collection_id, item_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiFailure> {
    let mut store = state.db.write().await;
    let items = store.collection_items(&collection_id)?;
    let before = items.len();
    items.retain(|i| i.id != item_id);
    if items.len() == before {
        return Err(not_found("Item"));
    }
    Ok(Json(json!({ "deleted": 1 })))
}

// --- webhooks ---

async fn list_webhooks(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<Vec<Webhook>>, ApiFailure> {
    let store = state.db.read().await;
    store.site(&site_id)?;
    Ok(Json(store.webhooks.get(&site_id).cloned().unwrap_or_default()))
}

async fn get_webhook(
    State(state): State<AppState>,
    Path((site_id, webhook_id)): Path<(String, String)>,
) -> Result<Json<Webhook>, ApiFailure> {
    let store = state.db.read().await;
    store.site(&site_id)?;
    store
        .webhooks
        .get(&site_id)
        .and_then(|hooks| hooks.iter().find(|h| h.id == webhook_id))
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Webhook"))
}

async fn create_webhook(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    Json(input): Json<CreateWebhook>,
) -> Result<Json<Webhook>, ApiFailure> {
    if !(input.url.starts_with("https://") || input.url.starts_with("http://")) {
        return Err(validation("url must be an absolute http(s) URL"));
    }
    if input.trigger_type.is_empty() {
        return Err(validation("triggerType is required"));
    }
    let mut store = state.db.write().await;
    store.site(&site_id)?;
    let hook = Webhook {
        id: new_id(),
        trigger_type: input.trigger_type,
        url: input.url,
        filter: input.filter,
        site: site_id.clone(),
    };
    store.webhooks.entry(site_id).or_default().push(hook.clone());
    Ok(Json(hook))
}

async fn remove_webhook(
    State(state): State<AppState>,
    Path((site_id, webhook_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiFailure> {
    let mut store = state.db.write().await;
    store.site(&site_id)?;
    let hooks = store.webhooks.entry(site_id).or_default();
    let before = hooks.len();
    hooks.retain(|h| h.id != webhook_id);
    if hooks.len() == before {
        return Err(not_found("Webhook"));
    }
    Ok(Json(json!({ "deleted": 1 })))
}
