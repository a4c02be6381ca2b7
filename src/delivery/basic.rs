use std::time::Duration;

use super::client::HttpClient;
use crate::error::{Result, UploadError};
use async_trait::async_trait;
use tracing::warn;

/// How the shared transport is built.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Accept any server certificate and any host name. Insecure.
    pub accept_invalid_certs: bool,
    /// Connect and request timeout in seconds; `0` waits forever.
    pub timeout_secs: u64,
}

impl TransportOptions {
    /// Trust-all TLS with no timeouts.
    pub fn trust_all() -> Self {
        Self {
            accept_invalid_certs: true,
            timeout_secs: 0,
        }
    }
}

/// The plain reqwest transport, built once per process.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("BasicClient: default client configuration is valid"),
        )
    }

    pub fn with_options(options: &TransportOptions) -> Result<Self> {
        // One round trip per send: redirects come back as HttpError.
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());

        if options.timeout_secs > 0 {
            let timeout = Duration::from_secs(options.timeout_secs);
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }

        if options.accept_invalid_certs {
            warn!("TLS certificate and hostname verification are disabled");
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        Ok(Self(builder.build().map_err(UploadError::Client)?))
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
