//! Shared type definitions and constants.

pub mod constants;
