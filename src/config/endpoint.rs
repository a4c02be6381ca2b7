use url::Url;

use crate::error::{Result, UploadError};

/// Scheme, host and path picked from the command line.
///
/// Empty fields mean "not given"; the [`Resolver`](super::Resolver) fills
/// scheme and host from the environment or defaults afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl Endpoint {
    /// Separate scheme, host and endpoint options are used only when all
    /// three are present; otherwise a full URI, when given, is split up.
    pub fn from_options(
        scheme: Option<&str>,
        host: Option<&str>,
        path: Option<&str>,
        uri: Option<&str>,
    ) -> Result<Self> {
        if let (Some(scheme), Some(host), Some(path)) = (scheme, host, path) {
            return Ok(Self {
                scheme: scheme.to_string(),
                host: host.to_string(),
                path: path.to_string(),
            });
        }

        match uri {
            Some(uri) => Self::parse(uri),
            None => Ok(Self::default()),
        }
    }

    /// Splits a full URI into scheme, host (with port, if any) and path.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).map_err(|source| UploadError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;

        let host = url
            .host_str()
            .ok_or_else(|| UploadError::InvalidEndpoint(format!("URI '{uri}' has no host")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
        })
    }
}
