//! DataWhisperer - chat with a MySQL database in natural language.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod safety;
pub mod session;
pub mod tui;
