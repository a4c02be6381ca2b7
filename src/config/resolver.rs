use std::fmt;

use tracing::{debug, warn};

use super::{EnvSource, UDL_HOST, UDL_PWD, UDL_SCHEME, UDL_USR};

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "localhost";

/// Values given on the command line. Empty strings count as absent.
#[derive(Debug, Default, Clone)]
pub struct ExplicitSettings {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Basic-auth credentials. The password is optional; the username is not.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A field that fell through to its hard-coded default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    SchemeDefaulted,
    HostDefaulted,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::SchemeDefaulted => {
                write!(f, "UDL scheme was not set, using '{DEFAULT_SCHEME}'")
            }
            ConfigWarning::HostDefaulted => {
                write!(f, "UDL hostname was not set, using '{DEFAULT_HOST}'")
            }
        }
    }
}

/// Final scheme, host and credentials for the run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub scheme: String,
    pub host: String,
    /// `None` means requests go out unauthenticated.
    pub credentials: Option<Credentials>,
    pub warnings: Vec<ConfigWarning>,
}

/// Merges explicit values with `UDL_*` fallbacks from an [`EnvSource`].
///
/// Per field: a non-empty explicit value wins, then a non-empty variable,
/// then the default (`http` / `localhost`; none for username and password).
/// Resolution never fails.
pub struct Resolver<E> {
    env: E,
}

impl<E: EnvSource> Resolver<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    pub fn resolve(&self, explicit: &ExplicitSettings) -> ResolvedConfig {
        let mut warnings = Vec::new();

        let scheme = self
            .lookup(explicit.scheme.as_deref(), UDL_SCHEME)
            .unwrap_or_else(|| {
                warnings.push(ConfigWarning::SchemeDefaulted);
                DEFAULT_SCHEME.to_string()
            });
        let host = self
            .lookup(explicit.host.as_deref(), UDL_HOST)
            .unwrap_or_else(|| {
                warnings.push(ConfigWarning::HostDefaulted);
                DEFAULT_HOST.to_string()
            });

        for warning in &warnings {
            warn!(%warning, "Falling back to default");
        }

        let password = self.lookup(explicit.password.as_deref(), UDL_PWD);
        let credentials = self
            .lookup(explicit.user.as_deref(), UDL_USR)
            .map(|username| Credentials { username, password });

        debug!(
            scheme = %scheme,
            host = %host,
            authenticated = credentials.is_some(),
            "Resolved upload configuration"
        );

        ResolvedConfig {
            scheme,
            host,
            credentials,
            warnings,
        }
    }

    fn lookup(&self, explicit: Option<&str>, var: &str) -> Option<String> {
        non_empty(explicit.map(str::to_string)).or_else(|| non_empty(self.env.get(var)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
