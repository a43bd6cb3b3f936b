//! The transport seam.
//!
//! Data-access code builds [`TransportRequest`]s and hands them to a
//! [`Transport`]. The HTTP implementation lives in `http.rs`; tests plug in
//! scripted transports.

use std::future::Future;

use reqwest::Url;
use serde_json::Value;
use strum::Display;
use thiserror::Error;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An outbound request. Path segments are kept raw and encoded only when
/// the request is turned into a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append the percent-encoded segments to `base`.
    ///
    /// A trailing slash on `base` is not doubled. Returns `None` if `base`
    /// cannot carry a path (e.g. `mailto:`).
    pub fn url(&self, base: &Url) -> Option<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(&self.segments);
        Some(url)
    }

    /// The encoded path, for logging and assertions.
    pub fn path(&self) -> String {
        Url::parse("http://localhost/")
            .ok()
            .and_then(|base| self.url(&base))
            .map(|url| url.path().to_owned())
            .unwrap_or_default()
    }
}

/// A received response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Error)]
#[error("no response received: {reason}")]
pub struct TransportError {
    pub reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Sends requests to the remote endpoint.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}
