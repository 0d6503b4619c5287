//! Authentication primitives.
//!
//! - `Credentials`: login email and password, redacted in debug output
//! - `AuthToken`: bearer token returned by login, owned by the session
//! - `authorized_headers`: the fixed header set for authorized requests
//!
//! Tokens live for a single run and are never persisted.

pub mod credentials;
pub mod token;

pub use credentials::Credentials;
pub use token::{authorized_headers, client_headers, AuthToken, ClientIdentity};
