//! Autoiso library exports for testing.
//!
//! The `autoiso` binary is the product; these exports exist so
//! integration tests can exercise internals.

pub mod build;
pub mod common;
pub mod config;
pub mod patch;
pub mod preflight;
pub mod process;
pub mod repack;
pub mod workspace;
