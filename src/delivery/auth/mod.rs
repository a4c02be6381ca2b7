//! Request decorators that attach credentials.

mod basic_auth;

pub use basic_auth::BasicAuth;
