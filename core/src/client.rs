//! Webflow CMS API client.
//!
//! # Design
//! `WebflowClient` holds the validated configuration, the header set built
//! from it, and a `Transport`. Nothing else is mutable or cached. Each
//! endpoint is split into a pure `build_*` method that produces an
//! `HttpRequest` and a calling method that executes it and runs
//! `parse_response`. The only operation issuing more than one request is
//! `list_items` with `all` set, which pages strictly sequentially.

use std::fmt;

use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::http::{redacted_headers, HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{Fields, ListItemsOptions, NewWebhook, WriteOptions, PAGE_STRIDE};

/// Query pairs and JSON body for a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Synchronous client for the Webflow v1 API.
#[derive(Clone)]
pub struct WebflowClient<T = UreqTransport> {
    base_url: String,
    headers: Vec<(String, String)>,
    log_responses: bool,
    transport: T,
}

impl<T: fmt::Debug> fmt::Debug for WebflowClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebflowClient")
            .field("base_url", &self.base_url)
            .field("headers", &redacted_headers(&self.headers))
            .field("log_responses", &self.log_responses)
            .field("transport", &self.transport)
            .finish()
    }
}

impl WebflowClient<UreqTransport> {
    /// Build a client that talks to the network through `ureq`.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> WebflowClient<T> {
    /// Build a client on a custom transport. Fails with `ApiError::Config`
    /// if the configuration is incomplete; no request is made either way.
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        config.validate()?;
        let headers = vec![
            ("Accept-Version".to_string(), config.accept_version.clone()),
            ("Authorization".to_string(), format!("Bearer {}", config.api_token)),
            ("content-type".to_string(), "application/json".to_string()),
        ];
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            log_responses: config.log_responses,
            transport,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Primitive
    // -----------------------------------------------------------------------

    /// Build a request for `<base_url>/<path>` with the standard headers.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpRequest> {
        let body = options
            .body
            .map(|body| serde_json::to_string(&body))
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            query: options.query,
            headers: self.headers.clone(),
            body,
        })
    }

    /// Perform one authenticated request and return the parsed JSON body.
    pub fn request(&self, method: HttpMethod, path: &str, options: RequestOptions) -> Result<Value> {
        self.send(self.build_request(method, path, options)?)
    }

    /// Execute a previously built request.
    pub fn send(&self, request: HttpRequest) -> Result<Value> {
        let response = self.transport.execute(&request)?;
        if self.log_responses {
            tracing::debug!(
                method = request.method.as_str(),
                url = %request.url,
                status = response.status,
                body = %response.body,
                "webflow response"
            );
        }
        parse_response(response)
    }

    fn get(&self, path: &str) -> Result<HttpRequest> {
        self.build_request(HttpMethod::Get, path, RequestOptions::default())
    }

    // -----------------------------------------------------------------------
    // Sites and domains
    // -----------------------------------------------------------------------

    pub fn build_info(&self) -> Result<HttpRequest> {
        self.get("info")
    }

    /// Metadata about the token in use (grant, rate limit, scopes).
    pub fn info(&self) -> Result<Value> {
        self.send(self.build_info()?)
    }

    pub fn build_list_sites(&self) -> Result<HttpRequest> {
        self.get("sites")
    }

    pub fn list_sites(&self) -> Result<Value> {
        self.send(self.build_list_sites()?)
    }

    pub fn build_get_site(&self, site_id: &str) -> Result<HttpRequest> {
        self.get(&format!("sites/{site_id}"))
    }

    pub fn get_site(&self, site_id: &str) -> Result<Value> {
        self.send(self.build_get_site(site_id)?)
    }

    pub fn build_publish_site<S: AsRef<str>>(&self, site_id: &str, domains: &[S]) -> Result<HttpRequest> {
        let domains: Vec<&str> = domains.iter().map(|d| d.as_ref()).collect();
        self.build_request(
            HttpMethod::Post,
            &format!("sites/{site_id}/publish"),
            RequestOptions::default().json(json!({ "domains": domains })),
        )
    }

    /// Publish the site to the given registered domain names. Domain names
    /// are not checked locally.
    pub fn publish_site<S: AsRef<str>>(&self, site_id: &str, domains: &[S]) -> Result<Value> {
        self.send(self.build_publish_site(site_id, domains)?)
    }

    pub fn build_list_domains(&self, site_id: &str) -> Result<HttpRequest> {
        self.get(&format!("sites/{site_id}/domains"))
    }

    pub fn list_domains(&self, site_id: &str) -> Result<Value> {
        self.send(self.build_list_domains(site_id)?)
    }

    // -----------------------------------------------------------------------
    // Collections
    // -----------------------------------------------------------------------

    pub fn build_list_collections(&self, site_id: &str) -> Result<HttpRequest> {
        self.get(&format!("sites/{site_id}/collections"))
    }

    pub fn list_collections(&self, site_id: &str) -> Result<Value> {
        self.send(self.build_list_collections(site_id)?)
    }

    pub fn build_get_collection(&self, collection_id: &str) -> Result<HttpRequest> {
        self.get(&format!("collections/{collection_id}"))
    }

    pub fn get_collection(&self, collection_id: &str) -> Result<Value> {
        self.send(self.build_get_collection(collection_id)?)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn build_list_items(&self, collection_id: &str, limit: u32, offset: u32) -> Result<HttpRequest> {
        self.build_request(
            HttpMethod::Get,
            &format!("collections/{collection_id}/items"),
            RequestOptions::default()
                .query("limit", limit)
                .query("offset", offset),
        )
    }

    /// List items of a collection.
    ///
    /// With `options.all` unset this is one page, returned unmodified. With
    /// it set, pages of `PAGE_STRIDE` items are fetched one after another
    /// from `options.offset` until the accumulated count reaches the last
    /// reported `total` or a page comes back empty. The result is the last
    /// page's envelope carrying every accumulated item, with `count` set to
    /// their number.
    pub fn list_items(&self, collection_id: &str, options: &ListItemsOptions) -> Result<Value> {
        if !options.all {
            return self.send(self.build_list_items(collection_id, options.limit, options.offset)?);
        }

        let mut offset = options.offset;
        let mut items = Vec::new();
        loop {
            let mut page = self.send(self.build_list_items(collection_id, PAGE_STRIDE, offset)?)?;
            let batch = take_items(&mut page)?;
            let total = page_total(&page)?;
            let fetched = batch.len();
            items.extend(batch);

            if items.len() as u64 >= total || fetched == 0 {
                let count = items.len();
                page["items"] = Value::Array(items);
                page["count"] = Value::from(count);
                return Ok(page);
            }
            offset = offset.checked_add(PAGE_STRIDE).ok_or_else(|| {
                ApiError::Decode(format!(
                    "offset overflow after {} of {total} items",
                    items.len()
                ))
            })?;
        }
    }

    pub fn build_get_item(&self, collection_id: &str, item_id: &str) -> Result<HttpRequest> {
        self.get(&format!("collections/{collection_id}/items/{item_id}"))
    }

    pub fn get_item(&self, collection_id: &str, item_id: &str) -> Result<Value> {
        self.send(self.build_get_item(collection_id, item_id)?)
    }

    fn build_item_write(
        &self,
        method: HttpMethod,
        path: String,
        fields: &Fields,
        options: WriteOptions,
    ) -> Result<HttpRequest> {
        let mut request = RequestOptions::default().json(json!({ "fields": fields }));
        if options.live {
            request = request.query("live", true);
        }
        self.build_request(method, &path, request)
    }

    pub fn build_create_item(
        &self,
        collection_id: &str,
        fields: &Fields,
        options: WriteOptions,
    ) -> Result<HttpRequest> {
        self.build_item_write(
            HttpMethod::Post,
            format!("collections/{collection_id}/items"),
            fields,
            options,
        )
    }

    pub fn create_item(&self, collection_id: &str, fields: &Fields, options: WriteOptions) -> Result<Value> {
        self.send(self.build_create_item(collection_id, fields, options)?)
    }

    pub fn build_update_item(
        &self,
        collection_id: &str,
        item_id: &str,
        fields: &Fields,
        options: WriteOptions,
    ) -> Result<HttpRequest> {
        self.build_item_write(
            HttpMethod::Put,
            format!("collections/{collection_id}/items/{item_id}"),
            fields,
            options,
        )
    }

    /// Replace every field of an item.
    pub fn update_item(
        &self,
        collection_id: &str,
        item_id: &str,
        fields: &Fields,
        options: WriteOptions,
    ) -> Result<Value> {
        self.send(self.build_update_item(collection_id, item_id, fields, options)?)
    }

    pub fn build_patch_item(
        &self,
        collection_id: &str,
        item_id: &str,
        fields: &Fields,
        options: WriteOptions,
    ) -> Result<HttpRequest> {
        self.build_item_write(
            HttpMethod::Patch,
            format!("collections/{collection_id}/items/{item_id}"),
            fields,
            options,
        )
    }

    /// Update only the given fields of an item.
    pub fn patch_item(
        &self,
        collection_id: &str,
        item_id: &str,
        fields: &Fields,
        options: WriteOptions,
    ) -> Result<Value> {
        self.send(self.build_patch_item(collection_id, item_id, fields, options)?)
    }

    pub fn build_remove_item(&self, collection_id: &str, item_id: &str) -> Result<HttpRequest> {
        self.build_request(
            HttpMethod::Delete,
            &format!("collections/{collection_id}/items/{item_id}"),
            RequestOptions::default(),
        )
    }

    pub fn remove_item(&self, collection_id: &str, item_id: &str) -> Result<Value> {
        self.send(self.build_remove_item(collection_id, item_id)?)
    }

    // -----------------------------------------------------------------------
    // Webhooks
    // -----------------------------------------------------------------------

    pub fn build_list_webhooks(&self, site_id: &str) -> Result<HttpRequest> {
        self.get(&format!("sites/{site_id}/webhooks"))
    }

    pub fn list_webhooks(&self, site_id: &str) -> Result<Value> {
        self.send(self.build_list_webhooks(site_id)?)
    }

    pub fn build_get_webhook(&self, site_id: &str, webhook_id: &str) -> Result<HttpRequest> {
        self.get(&format!("sites/{site_id}/webhooks/{webhook_id}"))
    }

    pub fn get_webhook(&self, site_id: &str, webhook_id: &str) -> Result<Value> {
        self.send(self.build_get_webhook(site_id, webhook_id)?)
    }

    pub fn build_create_webhook(&self, site_id: &str, webhook: &NewWebhook) -> Result<HttpRequest> {
        let body = serde_json::to_value(webhook).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.build_request(
            HttpMethod::Post,
            &format!("sites/{site_id}/webhooks"),
            RequestOptions::default().json(body),
        )
    }

    pub fn create_webhook(&self, site_id: &str, webhook: &NewWebhook) -> Result<Value> {
        self.send(self.build_create_webhook(site_id, webhook)?)
    }

    pub fn build_remove_webhook(&self, site_id: &str, webhook_id: &str) -> Result<HttpRequest> {
        self.build_request(
            HttpMethod::Delete,
            &format!("sites/{site_id}/webhooks/{webhook_id}"),
            RequestOptions::default(),
        )
    }

    pub fn remove_webhook(&self, site_id: &str, webhook_id: &str) -> Result<Value> {
        self.send(self.build_remove_webhook(site_id, webhook_id)?)
    }
}

/// Turn a response into JSON, or into `ApiError::Http` for any non-2xx.
pub fn parse_response(response: HttpResponse) -> Result<Value> {
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn take_items(page: &mut Value) -> Result<Vec<Value>> {
    let envelope = page
        .as_object_mut()
        .ok_or_else(|| ApiError::Decode("items page is not a JSON object".to_string()))?;
    match envelope.get_mut("items").map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ApiError::Decode("items page has no `items` array".to_string())),
    }
}

fn page_total(page: &Value) -> Result<u64> {
    page.get("total")
        .and_then(Value::as_u64)
        .ok_or_else(|| ApiError::Decode("items page has no numeric `total`".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            panic!("request builders must not touch the transport");
        }
    }

    fn client() -> WebflowClient<Unreachable> {
        WebflowClient::with_transport(Config::new("token-123"), Unreachable).unwrap()
    }

    fn fields() -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("Hello"));
        fields.insert("slug".to_string(), json!("hello"));
        fields
    }

    fn body(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn every_request_carries_the_three_headers() {
        let req = client().build_info().unwrap();
        assert_eq!(
            req.headers,
            vec![
                ("Accept-Version".to_string(), "1.0.0".to_string()),
                ("Authorization".to_string(), "Bearer token-123".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn read_paths_follow_endpoint_table() {
        let c = client();
        let cases = [
            (c.build_info().unwrap(), "info"),
            (c.build_list_sites().unwrap(), "sites"),
            (c.build_get_site("s1").unwrap(), "sites/s1"),
            (c.build_list_domains("s1").unwrap(), "sites/s1/domains"),
            (c.build_list_collections("s1").unwrap(), "sites/s1/collections"),
            (c.build_get_collection("c1").unwrap(), "collections/c1"),
            (c.build_get_item("c1", "i1").unwrap(), "collections/c1/items/i1"),
            (c.build_list_webhooks("s1").unwrap(), "sites/s1/webhooks"),
            (c.build_get_webhook("s1", "w1").unwrap(), "sites/s1/webhooks/w1"),
        ];
        for (req, path) in cases {
            assert_eq!(req.method, HttpMethod::Get, "{path}");
            assert_eq!(req.url, format!("https://api.webflow.com/{path}"));
            assert!(req.query.is_empty(), "{path}");
            assert!(req.body.is_none(), "{path}");
        }
    }

    #[test]
    fn list_items_page_sets_limit_and_offset() {
        let req = client().build_list_items("c1", 25, 50).unwrap();
        assert_eq!(req.url, "https://api.webflow.com/collections/c1/items");
        assert_eq!(
            req.query,
            vec![
                ("limit".to_string(), "25".to_string()),
                ("offset".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn create_item_wraps_fields_and_stays_draft() {
        let req = client()
            .build_create_item("c1", &fields(), WriteOptions::default())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.webflow.com/collections/c1/items");
        assert!(req.query.is_empty());
        assert_eq!(body(&req), json!({"fields": {"name": "Hello", "slug": "hello"}}));
    }

    #[test]
    fn live_writes_add_live_query() {
        let c = client();
        let reqs = [
            (c.build_create_item("c1", &fields(), WriteOptions::live()).unwrap(), HttpMethod::Post),
            (c.build_update_item("c1", "i1", &fields(), WriteOptions::live()).unwrap(), HttpMethod::Put),
            (c.build_patch_item("c1", "i1", &fields(), WriteOptions::live()).unwrap(), HttpMethod::Patch),
        ];
        for (req, method) in reqs {
            assert_eq!(req.method, method);
            assert_eq!(req.query, vec![("live".to_string(), "true".to_string())]);
            assert_eq!(body(&req)["fields"], Value::Object(fields()));
        }
    }

    #[test]
    fn update_and_patch_target_the_item() {
        let c = client();
        let put = c.build_update_item("c1", "i1", &fields(), WriteOptions::default()).unwrap();
        let patch = c.build_patch_item("c1", "i1", &fields(), WriteOptions::default()).unwrap();
        assert_eq!(put.url, "https://api.webflow.com/collections/c1/items/i1");
        assert_eq!(patch.url, put.url);
        assert!(put.query.is_empty());
        assert!(patch.query.is_empty());
    }

    #[test]
    fn empty_payload_still_wrapped() {
        let req = client()
            .build_patch_item("c1", "i1", &Fields::new(), WriteOptions::default())
            .unwrap();
        assert_eq!(body(&req), json!({"fields": {}}));
    }

    #[test]
    fn deletes_have_no_body() {
        let c = client();
        for req in [
            c.build_remove_item("c1", "i1").unwrap(),
            c.build_remove_webhook("s1", "w1").unwrap(),
        ] {
            assert_eq!(req.method, HttpMethod::Delete);
            assert!(req.body.is_none());
            assert!(req.query.is_empty());
        }
    }

    #[test]
    fn publish_site_sends_domains() {
        let req = client().build_publish_site("s1", &["a.com", "b.com"]).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.webflow.com/sites/s1/publish");
        assert_eq!(body(&req), json!({"domains": ["a.com", "b.com"]}));
    }

    #[test]
    fn publish_site_accepts_owned_domains() {
        let domains = vec!["a.com".to_string(), "b.com".to_string()];
        let req = client().build_publish_site("s1", &domains).unwrap();
        assert_eq!(body(&req), json!({"domains": ["a.com", "b.com"]}));
    }

    #[test]
    fn debug_output_hides_token() {
        let c = client();
        let rendered = format!("{c:?}");
        assert!(!rendered.contains("token-123"), "{rendered}");
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("https://api.webflow.com"));

        let req = c.build_info().unwrap();
        let rendered = format!("{req:?}");
        assert!(!rendered.contains("token-123"), "{rendered}");
        assert!(rendered.contains("Accept-Version"));
    }

    #[test]
    fn create_webhook_body() {
        let mut filter = Fields::new();
        filter.insert("name".to_string(), json!("contact"));
        let hook = NewWebhook::new("form_submission", "https://example.com/hook").with_filter(filter);
        let req = client().build_create_webhook("s1", &hook).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.webflow.com/sites/s1/webhooks");
        assert_eq!(
            body(&req),
            json!({
                "triggerType": "form_submission",
                "url": "https://example.com/hook",
                "filter": {"name": "contact"}
            })
        );
    }

    #[test]
    fn base_url_slashes_are_normalized() {
        let config = Config::new("t").with_base_url("http://localhost:3000/");
        let c = WebflowClient::with_transport(config, Unreachable).unwrap();
        assert_eq!(c.base_url(), "http://localhost:3000");
        let req = c.build_request(HttpMethod::Get, "/sites", RequestOptions::default()).unwrap();
        assert_eq!(req.url, "http://localhost:3000/sites");
    }

    #[test]
    fn empty_token_is_config_error() {
        let err = WebflowClient::with_transport(Config::new(""), Unreachable).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn parse_response_success() {
        let value = parse_response(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"sites":[]}"#.to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"sites": []}));
    }

    #[test]
    fn parse_response_non_2xx_keeps_body() {
        let err = parse_response(HttpResponse {
            status: 400,
            headers: Vec::new(),
            body: r#"{"msg":"Validation Failure","code":400}"#.to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 400, ref body } if body.contains("Validation")));
    }

    #[test]
    fn parse_response_bad_json() {
        let err = parse_response(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "<html>".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn take_items_requires_array() {
        let mut page = json!({"items": null, "total": 0});
        assert!(matches!(take_items(&mut page), Err(ApiError::Decode(_))));
        let mut page = json!([1, 2]);
        assert!(matches!(take_items(&mut page), Err(ApiError::Decode(_))));
    }

    #[test]
    fn page_total_requires_number() {
        assert_eq!(page_total(&json!({"total": 7})).unwrap(), 7);
        assert!(matches!(page_total(&json!({"total": "7"})), Err(ApiError::Decode(_))));
    }
}
