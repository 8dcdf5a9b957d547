//! Binary-level tests.

pub mod headless_test;
