//! Public API module.
//!
//! This module contains the high-level user-facing API for the `hostbus` crate.

pub mod config;
pub mod host_bus;
pub mod models;
