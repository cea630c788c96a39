//! Shared utilities.
//!
//! Hashing used for archive verification, plus test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;
