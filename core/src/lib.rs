//! Asynchronous client for the LaMetric developer cloud API.
//!
//! # Overview
//! Builds endpoint URLs, attaches the default and authentication headers,
//! encodes parameters as a query string (GET) or JSON body (everything else)
//! and turns each response into exactly one outcome: the parsed JSON value
//! or an [`ApiError`].
//!
//! ```no_run
//! use lametric_cloud::{Client, ClientConfig, Frame};
//!
//! # async fn push() -> lametric_cloud::Result<()> {
//! let client = Client::new(ClientConfig::new().with_access_token("my-token"));
//! let frames = [Frame::text("Hello").with_icon("i120")];
//! client.update_widget("com.example.widget", &frames[..], None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `Client` is immutable after construction and safe to share.
//! - Request building and response classification are pure; only the
//!   [`Transport`] does I/O, so both halves are tested without a network.
//! - The library logs through `tracing` at debug/trace level and never
//!   installs a subscriber.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{parse_response, Client};
pub use config::{ClientConfig, ClientOptions, RequestOptions, VERSION};
pub use error::{ApiError, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Frame, GoalData};
