//! Session-oriented client for the grocery ordering API.
//!
//! # Overview
//! `SessionClient` logs a user in, keeps the server-issued session token, and
//! issues catalog, search and cart requests against the JSON-over-HTTP API.
//! Responses come back as untyped `Document`s; failures come back as
//! `ClientError` and are reported on the `tracing` log sink.
//!
//! # Design
//! - Requests are built as plain data (`build_*`) and executed by a
//!   `Transport`; the default is `ReqwestTransport`.
//! - `headers` decides identity, content and cookie headers per request.
//! - `classify` turns an exchange into `Ok(Document)` or an error and emits
//!   diagnostics according to each endpoint's `DiagnosticPolicy`.
//! - `CartMutation` reproduces the backend's cart payload shape exactly.

pub mod classify;
pub mod client;
pub mod config;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod http;
pub mod types;

pub use client::SessionClient;
pub use config::{ApiCredentials, ClientConfig};
pub use document::Document;
pub use endpoint::{DiagnosticPolicy, Endpoint};
pub use error::ClientError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody, ReqwestTransport, Transport};
pub use types::{CartItem, CartMutation, SessionToken};
