//! Domain models for syncgate.
//!
//! These are the core types shared across all crates.

pub mod organisation;
pub mod resolution;
