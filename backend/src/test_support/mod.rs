//! Shared fixtures for unit, handler, and integration tests.
//!
//! Compiled for the crate's own `#[cfg(test)]` modules and, behind the
//! `test-support` feature, for the integration tests under `tests/`.

pub mod memory;
