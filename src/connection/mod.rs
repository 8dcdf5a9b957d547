//! Connection management for DataWhisperer.
//!
//! Owns the session's database handle and reports connect outcomes.

pub mod manager;

pub use manager::{ConnectStatus, ConnectionManager};
