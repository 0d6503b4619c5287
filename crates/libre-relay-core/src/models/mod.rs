//! Data models for LibreLinkUp payloads.
//!
//! - `GlucoseSample`, `TrendLabel`, `Reading`: measurements and the relayed reading
//! - `GraphResponse`, `LogbookResponse`: series returned for a connection
//! - `AccountResponse`, `ConnectionsResponse`: account and followed patients

pub mod account;
pub mod glucose;
pub mod graph;

pub use account::{AccountResponse, AccountUser, Connection, ConnectionsResponse};
pub use glucose::{GlucoseSample, Reading, TrendLabel};
pub use graph::{GraphConnection, GraphData, GraphResponse, LogbookResponse};
