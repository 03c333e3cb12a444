//! # Domain Models
//!
//! Pure configuration and registry types for the mirror. Nothing here does
//! I/O; `serde` is the only dependency this crate is allowed to grow.

pub mod config;
pub mod constants;
pub mod registry;
