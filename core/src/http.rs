//! HTTP transport types and the `Transport` seam.
//!
//! # Design
//! Requests and responses are plain data. `WebflowClient` builds
//! `HttpRequest` values and parses `HttpResponse` values; a `Transport`
//! performs the round trip in between. `UreqTransport` is the blocking
//! network implementation, tests substitute their own.

use std::fmt;

use crate::error::{ApiError, Result};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and carries no query string; query parameters live in
/// `query` in the order they should be sent.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &redacted_headers(&self.headers))
            .field("body", &self.body)
            .finish()
    }
}

/// Header pairs for `Debug` output, with the `Authorization` value masked.
pub(crate) fn redacted_headers(headers: &[(String, String)]) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(k, v)| {
            if k.eq_ignore_ascii_case("authorization") {
                (k.as_str(), "<redacted>")
            } else {
                (k.as_str(), v.as_str())
            }
        })
        .collect()
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one HTTP round trip.
///
/// Implementations return any status code as data; only failures to obtain a
/// response at all are errors (`ApiError::Transport`).
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent is configured so that 4xx/5xx come back as responses rather
/// than `Err`, leaving status interpretation to the client.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent (proxy, TLS, timeouts). The agent should
    /// have `http_status_as_error(false)` set.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn decorate<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &request.query {
        builder = builder.query(name, value);
    }
    builder
}

/// Header map as owned pairs. Non-UTF-8 bytes in a value are replaced, not
/// dropped.
fn header_pairs(headers: &ureq::http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect()
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let body = request.body.as_deref().map(str::as_bytes);

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => decorate(self.agent.get(url), request).call(),
            (HttpMethod::Delete, _) => decorate(self.agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => decorate(self.agent.post(url), request).send(body),
            (HttpMethod::Post, None) => decorate(self.agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => decorate(self.agent.put(url), request).send(body),
            (HttpMethod::Put, None) => decorate(self.agent.put(url), request).send_empty(),
            (HttpMethod::Patch, Some(body)) => decorate(self.agent.patch(url), request).send(body),
            (HttpMethod::Patch, None) => decorate(self.agent.patch(url), request).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
