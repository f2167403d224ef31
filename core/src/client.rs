//! Request building, execution and outcome classification.
//!
//! # Design
//! `Client` holds only immutable state: the resolved options, the header list
//! derived from them, and a shared transport. Each call is split into
//! [`Client::build_request`], which produces an `HttpRequest`, a transport
//! round-trip, and [`parse_response`], which turns the `HttpResponse` into a
//! single outcome. Building and parsing never touch the network.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use crate::config::{ClientConfig, ClientOptions};
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};

/// Asynchronous client for the LaMetric developer cloud API.
///
/// Cloning is cheap and clones share the transport. Calls may run
/// concurrently.
#[derive(Clone)]
pub struct Client {
    options: ClientOptions,
    headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Client {
    /// Create a client that talks HTTP through `reqwest`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        let options = ClientOptions::merged(config);
        let headers = options.default_headers();
        Self {
            options,
            headers,
            transport: Arc::new(transport),
        }
    }

    /// Create a client configured from `LAMETRIC_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Headers attached to every request.
    pub fn default_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Fully qualified URL for `path`.
    ///
    /// A single leading `/` is added when `path` lacks one; the rest of the
    /// path, trailing slash included, is kept verbatim.
    ///
    /// ```
    /// let client = lametric_cloud::Client::default();
    /// assert_eq!(
    ///     client.build_endpoint("dev/widget/update/abc"),
    ///     "https://developer.lametric.com/api/v1/dev/widget/update/abc"
    /// );
    /// ```
    ///
    /// The path is required:
    ///
    /// ```compile_fail
    /// let client = lametric_cloud::Client::default();
    /// client.build_endpoint();
    /// ```
    pub fn build_endpoint(&self, path: &str) -> String {
        let separator = if path.starts_with('/') { "" } else { "/" };
        format!(
            "{}/api/{}{separator}{path}",
            self.options.base_url, self.options.api_version
        )
    }

    /// Build the request for `method` on `path`.
    ///
    /// `params` go into the query string for GET and into a JSON body for
    /// every other method. Params serializing to `null` (e.g. `()` or
    /// `None`) add neither.
    pub fn build_request<P>(&self, method: HttpMethod, path: &str, params: &P) -> Result<HttpRequest>
    where
        P: Serialize + ?Sized,
    {
        let params = serde_json::to_value(params)?;
        let (query, body) = match method {
            HttpMethod::Get => (query_pairs(&params), None),
            _ if params.is_null() => (Vec::new(), None),
            _ => (Vec::new(), Some(serde_json::to_string(&params)?)),
        };

        Ok(HttpRequest {
            method,
            url: self.build_endpoint(path),
            headers: self.headers.clone(),
            query,
            body,
        })
    }

    /// Send one request and classify its outcome.
    pub async fn request<P>(&self, method: HttpMethod, path: &str, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let request = self.build_request(method, path, params)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.execute(request).await?;
        debug!(status = response.status, "received response");

        let outcome = parse_response(response);
        trace!(ok = outcome.is_ok(), "request finished");
        outcome
    }

    pub async fn get<P>(&self, path: &str, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        self.request(HttpMethod::Get, path, params).await
    }

    pub async fn post<P>(&self, path: &str, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, params).await
    }

    pub async fn put<P>(&self, path: &str, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        self.request(HttpMethod::Put, path, params).await
    }

    pub async fn delete<P>(&self, path: &str, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        self.request(HttpMethod::Delete, path, params).await
    }

    /// Push `frames` to an indicator widget.
    ///
    /// Posts `{"frames": frames}` to `dev/widget/update/{widget_id}`, or to
    /// `dev/widget/update/{widget_id}/{version}` when a non-empty version is
    /// given.
    pub async fn update_widget<F>(
        &self,
        widget_id: &str,
        frames: &F,
        widget_version: Option<&str>,
    ) -> Result<Value>
    where
        F: Serialize + ?Sized,
    {
        let body = json!({ "frames": serde_json::to_value(frames)? });
        self.post(&widget_update_path(widget_id, widget_version), &body)
            .await
    }
}

fn widget_update_path(widget_id: &str, widget_version: Option<&str>) -> String {
    match widget_version.filter(|version| !version.is_empty()) {
        Some(version) => format!("dev/widget/update/{widget_id}/{version}"),
        None => format!("dev/widget/update/{widget_id}"),
    }
}

/// Classify a response.
///
/// Checks run in a fixed order: an empty body is `{}` and any other body
/// must be JSON, then an `errors` field fails the request with its raw value
/// (even on 2xx), then the status must be within `200..=299`.
pub fn parse_response(response: HttpResponse) -> Result<Value> {
    let mut data = if response.body.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(&response.body).map_err(|source| ApiError::Parse {
            status: response.status,
            reason: response.reason.clone(),
            source,
        })?
    };

    if let Some(errors) = data.as_object_mut().and_then(|map| map.remove("errors")) {
        return Err(ApiError::Application(errors));
    }

    if !(200..=299).contains(&response.status) {
        return Err(ApiError::HttpStatus {
            status: response.status,
            reason: response.reason,
        });
    }

    Ok(data)
}

/// Flatten GET params into query pairs, nesting keys as `a[b]` and array
/// items as `a[0]`. Scalars and `null` at the top level produce no pairs.
fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    match params {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_query(key.clone(), value, &mut pairs);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_query(index.to_string(), value, &mut pairs);
            }
        }
        _ => {}
    }
    pairs
}

fn flatten_query(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => pairs.push((key, String::new())),
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_query(format!("{key}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                flatten_query(format!("{key}[{name}]"), item, pairs);
            }
        }
    }
}
