//! Error type shared by the resolver, the delivery client and the batch driver.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    /// Scheme, host and path did not combine into a valid URL. Aborts the run.
    #[error("invalid request URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported HTTP method '{0}', expected GET or POST")]
    UnsupportedMethod(String),

    /// The full-URI option could not be turned into scheme, host and path.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Received {0} bytes.")]
    ResponseTooLarge(u64),

    #[error("Got an error response code of {status}! Response = \n{body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to read records from '{path}': {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse records: {0}")]
    Parse(#[from] serde_json::Error),
}

impl UploadError {
    /// Structural errors stop the whole batch; everything else is per record.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            UploadError::InvalidUri { .. }
                | UploadError::UnsupportedMethod(_)
                | UploadError::InvalidEndpoint(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_carries_code_and_body() {
        let err = UploadError::HttpStatus {
            status: 404,
            body: "no such thing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("no such thing"));
        assert!(!err.is_structural());
    }

    #[test]
    fn test_invalid_uri_is_structural() {
        let source = url::Url::parse("http://bad host").unwrap_err();
        let err = UploadError::InvalidUri {
            uri: "http://bad host".to_string(),
            source,
        };
        assert!(err.is_structural());
        assert!(!UploadError::ResponseTooLarge(2_000_000).is_structural());
    }
}
