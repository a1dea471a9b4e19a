//! Synchronous client for the Webflow CMS v1 API.
//!
//! # Overview
//! One method per REST endpoint: sites, domains, collections, items,
//! publishing and webhooks. Every call is a single blocking request whose
//! JSON response is returned as `serde_json::Value`, except
//! `list_items` with `all` set, which walks the pages for you.
//!
//! # Design
//! - `Config` is an explicit value; a missing token fails client
//!   construction, never a request.
//! - Each endpoint has a pure `build_*` method producing an `HttpRequest`,
//!   so request shapes are testable without I/O.
//! - The round trip goes through the `Transport` trait. `UreqTransport` is
//!   the default; tests plug in scripted transports.
//! - No retries, caching or background work. Response bodies are logged via
//!   `tracing` only when `Config::log_responses` is set.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::{parse_response, RequestOptions, WebflowClient};
pub use config::Config;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{Fields, ListItemsOptions, NewWebhook, WriteOptions, PAGE_STRIDE};
