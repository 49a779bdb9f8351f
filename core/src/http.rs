//! HTTP exchange types and the transport seam.
//!
//! # Design
//! Requests and responses are plain owned data. `SessionClient` builds an
//! `HttpRequest`, hands it to a `Transport`, and classifies the returned
//! `HttpResponse`; it never touches sockets itself. A non-2xx status is a
//! successful exchange at this layer. Only a missing response is an error.
//!
//! `ReqwestTransport` is the production implementation. Tests substitute
//! in-memory transports to observe exactly what would go on the wire.

use std::future::Future;
use std::time::Duration;

use tracing::trace;

use crate::error::ClientError;
use crate::headers::BodyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Encoded request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded` text.
    Form(String),
    Json(String),
}

impl RequestBody {
    /// Form-encode key/value pairs.
    pub fn form<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        RequestBody::Form(encoded)
    }

    pub fn kind(&self) -> BodyKind {
        match self {
            RequestBody::Empty => BodyKind::None,
            RequestBody::Form(_) => BodyKind::Form,
            RequestBody::Json(_) => BodyKind::Json,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Form(text) | RequestBody::Json(text) => Some(text),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
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

/// Executes one request. Exactly one network attempt per call, no retries.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ClientError>> + Send;
}

/// `Transport` backed by `reqwest`.
///
/// Idle connections are not pooled: every call opens its own connection and
/// releases it when the exchange ends, on success and failure alike.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        trace!(status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/cart/".to_string(),
            headers: vec![("Cookie".to_string(), "sessionid=abc".to_string())],
            body: None,
        };
        assert_eq!(req.header("cookie"), Some("sessionid=abc"));
        assert_eq!(req.header("x-client-token"), None);
    }

    #[test]
    fn form_body_is_percent_encoded() {
        let body = RequestBody::form([("username", "ola@example.no"), ("password", "p&ss w0rd")]);
        assert_eq!(body.kind(), BodyKind::Form);
        assert_eq!(
            body.into_string().unwrap(),
            "username=ola%40example.no&password=p%26ss+w0rd"
        );
    }

    #[test]
    fn success_range_is_2xx() {
        let response = |status| HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(302).is_success());
        assert!(!response(404).is_success());
    }

    #[tokio::test]
    async fn reqwest_transport_reports_refused_connection() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new(Some(Duration::from_secs(5))).unwrap();
        let err = transport
            .execute(HttpRequest {
                method: HttpMethod::Get,
                url: format!("http://{addr}/cart/"),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
