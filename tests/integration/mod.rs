//! Library-level integration tests.

pub mod connection_test;
pub mod pipeline_test;
