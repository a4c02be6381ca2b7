//! HTTP delivery of individual records.
//!
//! [`DeliveryClient`] owns the transport for the whole run and turns each
//! `send` into a [`Delivery`]: a tagged result that callers match on rather
//! than mixing returned codes with raised errors.

mod basic;
mod client;
pub mod auth;

pub use auth::BasicAuth;
pub use basic::{BasicClient, TransportOptions};
pub use client::HttpClient;

use std::fmt;
use std::str::FromStr;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::{debug, error, info};
use url::Url;

use crate::config::ResolvedConfig;
use crate::error::{Result, UploadError};

/// Responses declaring more bytes than this are not read.
pub const MAX_RESPONSE_BYTES: u64 = 1_000_000;

/// Status reported for a transport failure.
pub const CONNECTION_FAILED_STATUS: u16 = 502;
pub const CONNECTION_FAILED_BODY: &str = "Server connection failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl FromStr for Method {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("POST") {
            Ok(Method::Post)
        } else if s.eq_ignore_ascii_case("GET") {
            Ok(Method::Get)
        } else {
            Err(UploadError::UnsupportedMethod(s.to_string()))
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Outcome of a single `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Status at most 300, body read in full. A 300 is a success here but
    /// still a failed record for the batch, which wants 2xx.
    Success { status: u16, body: String },
    /// No usable response: connect, DNS, TLS or body read failure.
    ConnectionError { message: String },
    /// The response declared a body above [`MAX_RESPONSE_BYTES`].
    TooLarge { status: u16, content_length: u64 },
    /// Status above 300.
    HttpError { status: u16, body: String },
}

impl Delivery {
    pub fn status_code(&self) -> u16 {
        match self {
            Delivery::Success { status, .. }
            | Delivery::TooLarge { status, .. }
            | Delivery::HttpError { status, .. } => *status,
            Delivery::ConnectionError { .. } => CONNECTION_FAILED_STATUS,
        }
    }

    /// True only for a 2xx `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Delivery::Success { status, .. } if (200..300).contains(status))
    }

    /// Status/body pair, raising for oversized and error responses.
    ///
    /// A connection failure is not raised; it comes back as
    /// `(502, "Server connection failed")`.
    pub fn into_response(self) -> Result<(u16, String)> {
        match self {
            Delivery::Success { status, body } => Ok((status, body)),
            Delivery::ConnectionError { .. } => Ok((
                CONNECTION_FAILED_STATUS,
                CONNECTION_FAILED_BODY.to_string(),
            )),
            Delivery::TooLarge { content_length, .. } => {
                Err(UploadError::ResponseTooLarge(content_length))
            }
            Delivery::HttpError { status, body } => Err(UploadError::HttpStatus { status, body }),
        }
    }
}

/// Sends records to one scheme and host for the lifetime of the process.
pub struct DeliveryClient {
    scheme: String,
    host: String,
    client: Box<dyn HttpClient>,
}

impl DeliveryClient {
    /// Builds the transport and, when a username was resolved, scopes basic
    /// credentials to the configured host.
    pub fn new(config: &ResolvedConfig, options: &TransportOptions) -> Result<Self> {
        let transport = BasicClient::with_options(options)?;

        let client: Box<dyn HttpClient> = match &config.credentials {
            Some(credentials) => {
                let host = host_name(&config.scheme, &config.host);
                debug!(host = %host, username = %credentials.username, "Attaching basic credentials");
                Box::new(BasicAuth::scoped(transport, &host, credentials))
            }
            None => Box::new(transport),
        };

        Ok(Self::with_client(&config.scheme, &config.host, client))
    }

    /// Uses a caller-supplied transport as is.
    pub fn with_client(scheme: &str, host: &str, client: Box<dyn HttpClient>) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            client,
        }
    }

    /// Combines the stored scheme and host with `path`. No query string.
    pub fn uri(&self, path: &str) -> Result<Url> {
        let base = format!("{}://{}", self.scheme, self.host);
        let invalid = |source| UploadError::InvalidUri {
            uri: format!("{base}{path}"),
            source,
        };

        let mut uri = Url::parse(&base).map_err(invalid)?;
        if uri.cannot_be_a_base() || uri.host_str().is_none() {
            return Err(invalid(url::ParseError::EmptyHost));
        }
        uri.set_path(path);
        Ok(uri)
    }

    /// Issues one request and classifies the response.
    ///
    /// Only structural problems (bad URI) are returned as `Err`; everything
    /// the server or network does ends up in a [`Delivery`].
    pub async fn send(&self, method: Method, body: &str, path: &str) -> Result<Delivery> {
        let uri = self.uri(path)?;

        let mut req = reqwest::Request::new(method.into(), uri.clone());
        if method == Method::Post {
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *req.body_mut() = Some(body.to_string().into());
        }

        log_target(method, &uri).await;

        let response = match self.client.execute(req).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, uri = %uri, "Server connection failed");
                return Ok(Delivery::ConnectionError {
                    message: e.to_string(),
                });
            }
        };
        info!(response = ?response, "Got response");

        let status = response.status().as_u16();
        match response.content_length() {
            Some(content_length) if content_length > MAX_RESPONSE_BYTES => {
                error!(status, content_length, "Response exceeds size limit");
                return Ok(Delivery::TooLarge {
                    status,
                    content_length,
                });
            }
            _ => {}
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, status, "Failed to read response body");
                return Ok(Delivery::ConnectionError {
                    message: e.to_string(),
                });
            }
        };

        if status > 300 {
            Ok(Delivery::HttpError { status, body })
        } else {
            Ok(Delivery::Success { status, body })
        }
    }
}

/// Host name without port, as it appears in request URLs.
fn host_name(scheme: &str, host: &str) -> String {
    Url::parse(&format!("{scheme}://{host}"))
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| host.to_string())
}

/// Logs the address the request is going to. A failed lookup is logged and
/// otherwise ignored; the transport does its own resolution.
async fn log_target(method: Method, uri: &Url) {
    let Some(host) = uri.host_str() else {
        return;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = uri.port_or_known_default().unwrap_or(80);

    match tokio::net::lookup_host((host, port)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => info!(%method, ip = %addr.ip(), uri = %uri, "Sending request"),
            None => error!(host, "Host resolved to no addresses"),
        },
        Err(e) => error!(host, error = %e, "Failed to resolve host"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays one canned response and remembers what it was asked to send.
    struct Canned {
        status: u16,
        body: String,
        seen: Mutex<Vec<(reqwest::Method, String, Option<String>, Option<String>)>>,
    }

    impl Canned {
        fn new(status: u16, body: impl Into<String>) -> Self {
            Self {
                status,
                body: body.into(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for Canned {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let content_type = req
                .headers()
                .get(CONTENT_TYPE)
                .map(|v| v.to_str().unwrap().to_string());
            let body = req
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8(b.to_vec()).unwrap());
            self.seen.lock().unwrap().push((
                req.method().clone(),
                req.url().to_string(),
                content_type,
                body,
            ));

            let response = http::Response::builder()
                .status(self.status)
                .body(self.body.clone())
                .unwrap();
            Ok(response.into())
        }
    }

    struct Shared(std::sync::Arc<Canned>);

    #[async_trait]
    impl HttpClient for Shared {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.0.execute(req).await
        }
    }

    fn client_with(canned: &std::sync::Arc<Canned>) -> DeliveryClient {
        DeliveryClient::with_client("http", "127.0.0.1", Box::new(Shared(canned.clone())))
    }

    #[test]
    fn test_method_parses_case_insensitively() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("Get".parse::<Method>().unwrap(), Method::Get);
        let err = "PUT".parse::<Method>().unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedMethod(m) if m == "PUT"));
    }

    #[test]
    fn test_uri_combines_scheme_host_and_path() {
        let client = DeliveryClient::with_client(
            "https",
            "udl.example:8443",
            Box::new(BasicClient::new()),
        );
        let uri = client.uri("/udl/elset").unwrap();
        assert_eq!(uri.as_str(), "https://udl.example:8443/udl/elset");

        let uri = client.uri("udl/elset").unwrap();
        assert_eq!(uri.path(), "/udl/elset");
    }

    #[test]
    fn test_uri_rejects_malformed_host() {
        let client =
            DeliveryClient::with_client("http", "bad host", Box::new(BasicClient::new()));
        let err = client.uri("/x").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_host_name_strips_port() {
        assert_eq!(host_name("http", "udl.example:8080"), "udl.example");
        assert_eq!(host_name("https", "UDL.example"), "udl.example");
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let canned = std::sync::Arc::new(Canned::new(201, "created"));
        let client = client_with(&canned);

        let delivery = client
            .send(Method::Post, r#"{"a":1}"#, "/udl/elset")
            .await
            .unwrap();

        assert_eq!(
            delivery,
            Delivery::Success {
                status: 201,
                body: "created".into()
            }
        );
        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (method, url, content_type, body) = &seen[0];
        assert_eq!(method, &reqwest::Method::POST);
        assert_eq!(url, "http://127.0.0.1/udl/elset");
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[tokio::test]
    async fn test_get_ignores_body() {
        let canned = std::sync::Arc::new(Canned::new(200, "[]"));
        let client = client_with(&canned);

        client.send(Method::Get, "ignored", "/q").await.unwrap();

        let seen = canned.seen.lock().unwrap();
        let (method, _, content_type, body) = &seen[0];
        assert_eq!(method, &reqwest::Method::GET);
        assert_eq!(content_type, &None);
        assert_eq!(body, &None);
    }

    #[tokio::test]
    async fn test_error_status_is_http_error() {
        let canned = std::sync::Arc::new(Canned::new(404, "not here"));
        let delivery = client_with(&canned)
            .send(Method::Post, "{}", "/missing")
            .await
            .unwrap();

        assert_eq!(delivery.status_code(), 404);
        assert!(!delivery.is_success());
        match delivery.into_response().unwrap_err() {
            UploadError::HttpStatus { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "not here");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_status_300_is_not_an_http_error() {
        let canned = std::sync::Arc::new(Canned::new(300, "choices"));
        let delivery = client_with(&canned)
            .send(Method::Post, "{}", "/")
            .await
            .unwrap();

        assert!(matches!(delivery, Delivery::Success { status: 300, .. }));
        assert!(!delivery.is_success());
    }

    #[tokio::test]
    async fn test_oversized_response_is_not_read() {
        let canned = std::sync::Arc::new(Canned::new(200, "x".repeat(1_000_001)));
        let delivery = client_with(&canned)
            .send(Method::Post, "{}", "/")
            .await
            .unwrap();

        assert_eq!(
            delivery,
            Delivery::TooLarge {
                status: 200,
                content_length: 1_000_001
            }
        );
        assert!(matches!(
            delivery.into_response(),
            Err(UploadError::ResponseTooLarge(1_000_001))
        ));
    }

    #[tokio::test]
    async fn test_response_at_size_limit_is_accepted() {
        let canned = std::sync::Arc::new(Canned::new(200, "x".repeat(1_000_000)));
        let delivery = client_with(&canned)
            .send(Method::Post, "{}", "/")
            .await
            .unwrap();
        assert!(delivery.is_success());
    }

    #[test]
    fn test_connection_error_reads_as_502() {
        let delivery = Delivery::ConnectionError {
            message: "refused".into(),
        };
        assert_eq!(delivery.status_code(), 502);
        assert_eq!(
            delivery.into_response().unwrap(),
            (502, "Server connection failed".to_string())
        );
    }
}
