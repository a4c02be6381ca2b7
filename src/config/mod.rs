//! Upload target configuration.
//!
//! [`EnvSource`] is the lookup trait for `UDL_*` fallback values.
//! [`ProcessEnv`] reads the real process environment; a plain `HashMap` works as a fixed source.
//! [`Resolver`] merges explicit values, environment fallbacks and defaults into a [`ResolvedConfig`].
//! [`Endpoint`] picks scheme, host and path from the CLI options.

mod endpoint;
mod env;
mod resolver;

pub use endpoint::Endpoint;
pub use env::ProcessEnv;
pub use resolver::{
    ConfigWarning, Credentials, DEFAULT_HOST, DEFAULT_SCHEME, ExplicitSettings, ResolvedConfig,
    Resolver,
};

pub const UDL_SCHEME: &str = "UDL_SCHEME";
pub const UDL_USR: &str = "UDL_USR";
pub const UDL_PWD: &str = "UDL_PWD";
pub const UDL_HOST: &str = "UDL_HOST";

/// Looks up a named configuration value, typically an environment variable.
pub trait EnvSource {
    fn get(&self, name: &str) -> Option<String>;
}
