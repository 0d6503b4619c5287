//! Core library for libre-relay.
//!
//! Logs in to LibreLinkUp, fetches the glucose graph for one connection,
//! derives the short-term trend from the trailing samples and forwards the
//! latest reading with its trend to a downstream endpoint.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod notify;
pub mod relay;
pub mod trend;

pub use api::{ApiError, LibreClient, LibreSession};
pub use config::{Config, ConfigError};
pub use models::{GlucoseSample, Reading, TrendLabel};
pub use relay::{run, RelayError};
pub use trend::{compute_trend, TrendError};
