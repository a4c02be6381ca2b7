use crate::config::Credentials;
use crate::delivery::client::HttpClient;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sends HTTP Basic credentials.
///
/// The credentials are scoped to one host name on any port: requests to
/// other hosts pass through untouched.
pub struct BasicAuth<C> {
    pub inner: C,
    host: String,
    header: HeaderValue,
}

impl<C> BasicAuth<C> {
    pub fn scoped(inner: C, host: &str, credentials: &Credentials) -> Self {
        let pair = format!(
            "{}:{}",
            credentials.username,
            credentials.password.as_deref().unwrap_or_default()
        );
        let mut header = HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(pair)))
            .expect("BasicAuth: base64 is always a valid header value");
        header.set_sensitive(true);

        Self {
            inner,
            host: host.to_ascii_lowercase(),
            header,
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for BasicAuth<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        if req.url().host_str() == Some(self.host.as_str()) {
            req.headers_mut().insert(AUTHORIZATION, self.header.clone());
        }
        self.inner.execute(req).await
    }
}
