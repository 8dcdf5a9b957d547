//! Query execution for DataWhisperer.
//!
//! Isolates SQL execution from the orchestrator.

pub mod executor;

pub use executor::{QueryExecutor, QueryOutcome};
