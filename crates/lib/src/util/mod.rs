//! Shared utilities.
//!
//! Checksum helpers and, for tests, an in-memory CI backend.

pub mod hash;

#[cfg(test)]
pub mod testutil;
