//! Request payloads and per-operation options.
//!
//! Responses stay as `serde_json::Value`; only the shapes this client has to
//! construct get a type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field-name to value mapping sent under the `fields` key of item writes.
pub type Fields = Map<String, Value>;

/// Items requested per page by the list-all loop, and its offset stride.
pub const PAGE_STRIDE: u32 = 100;

/// Options for `WebflowClient::list_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListItemsOptions {
    /// Page size for a single-page request. Default 100. Ignored when `all`
    /// is set; the list-all loop always asks for `PAGE_STRIDE` items.
    pub limit: u32,
    /// Index of the first item. Default 0.
    pub offset: u32,
    /// Fetch every item from `offset` to the end. Default false.
    pub all: bool,
}

impl Default for ListItemsOptions {
    fn default() -> Self {
        Self {
            limit: PAGE_STRIDE,
            offset: 0,
            all: false,
        }
    }
}

impl ListItemsOptions {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            all: false,
        }
    }

    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }
}

/// Options for item create/update/patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Publish the change to the live site immediately instead of staging
    /// it as a draft. Default false.
    pub live: bool,
}

impl WriteOptions {
    pub fn live() -> Self {
        Self { live: true }
    }
}

/// Request payload for registering a webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWebhook {
    /// Event type name, e.g. `collection_item_created`.
    #[serde(rename = "triggerType")]
    pub trigger_type: String,
    /// Absolute http(s) URL the service posts event payloads to.
    pub url: String,
    /// Service-specific constraints on which events fire.
    pub filter: Map<String, Value>,
}

impl NewWebhook {
    pub fn new(trigger_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            trigger_type: trigger_type.into(),
            url: url.into(),
            filter: Map::new(),
        }
    }

    pub fn with_filter(mut self, filter: Map<String, Value>) -> Self {
        self.filter = filter;
        self
    }
}
