//! Client configuration.
//!
//! # Design
//! `ClientConfig` holds caller overrides, every field optional.
//! `ClientOptions` is the resolved configuration: overrides merged over the
//! built-in defaults. Scalars replace the default wholesale while headers
//! merge key by key, so overriding `User-Agent` keeps `Accept` and friends.
//! Keys the client does not know about are kept in `extra` and otherwise
//! ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version of this crate, baked into the default `User-Agent`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BASE_URL: &str = "https://developer.lametric.com";
pub const DEFAULT_API_VERSION: &str = "v1";

/// Header carrying the developer access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";

pub const ENV_BASE_URL: &str = "LAMETRIC_BASE_URL";
pub const ENV_ACCESS_TOKEN: &str = "LAMETRIC_ACCESS_TOKEN";
pub const ENV_API_VERSION: &str = "LAMETRIC_API_VERSION";

/// Options applied to every request.
///
/// Only `headers` is acted on. Other keys are kept in `extra` for callers;
/// transport settings such as timeouts belong on the `reqwest::Client`
/// handed to `ReqwestTransport::from_client`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Caller-supplied overrides for [`ClientOptions`].
///
/// Deserializes from the same JSON shape the client's options use:
///
/// ```
/// use lametric_cloud::ClientConfig;
///
/// let config = ClientConfig::from_json_str(r#"{
///     "base_url": "http://127.0.0.1:8080",
///     "access_token": "12345",
///     "request_options": { "headers": { "User-Agent": "test" } },
///     "power": "Max"
/// }"#).unwrap();
///
/// assert_eq!(config.access_token.as_deref(), Some("12345"));
/// assert_eq!(config.extra["power"], "Max");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub request_options: RequestOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read `LAMETRIC_BASE_URL`, `LAMETRIC_ACCESS_TOKEN` and
    /// `LAMETRIC_API_VERSION` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            base_url: read(ENV_BASE_URL),
            access_token: read(ENV_ACCESS_TOKEN),
            api_version: read(ENV_API_VERSION),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_options.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Resolved, immutable client configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientOptions {
    pub base_url: String,
    pub access_token: Option<String>,
    pub api_version: String,
    pub request_options: RequestOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        let headers = [
            ("Accept", "application/json".to_string()),
            ("Connection", "close".to_string()),
            ("Content-Type", "application/json".to_string()),
            ("Cache-Control", "no-cache".to_string()),
            ("User-Agent", format!("lametric-cloud/{VERSION}")),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            request_options: RequestOptions {
                headers,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }
}

impl ClientOptions {
    /// Merge `config` over the defaults.
    pub fn merged(config: ClientConfig) -> Self {
        let mut options = Self::default();
        if let Some(base_url) = config.base_url {
            options.base_url = base_url;
        }
        if let Some(access_token) = config.access_token {
            options.access_token = Some(access_token);
        }
        if let Some(api_version) = config.api_version {
            options.api_version = api_version;
        }
        let RequestOptions { headers, extra } = config.request_options;
        let defaults = &mut options.request_options.headers;
        defaults.retain(|name, _| !headers.keys().any(|key| key.eq_ignore_ascii_case(name)));
        defaults.extend(headers);
        options.request_options.extra = extra;
        options.extra = config.extra;
        options
    }

    /// Headers sent with every request: the merged header map plus
    /// `X-Access-Token` when a non-empty token is configured.
    pub fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .request_options
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if let Some(token) = self.access_token.as_deref().filter(|token| !token.is_empty()) {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case(ACCESS_TOKEN_HEADER));
            headers.push((ACCESS_TOKEN_HEADER.to_string(), token.to_string()));
        }
        headers
    }
}

impl From<ClientConfig> for ClientOptions {
    fn from(config: ClientConfig) -> Self {
        Self::merged(config)
    }
}
