//! REST API client module for LibreLinkUp.
//!
//! This module provides `LibreClient` (login only) and `LibreSession`
//! (authorized fetches of graph, logbook, connections and account data).
//!
//! The API uses bearer token authentication obtained from `llu/auth/login`.

pub mod client;
pub mod error;

pub use client::{LibreClient, LibreSession, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::ApiError;
