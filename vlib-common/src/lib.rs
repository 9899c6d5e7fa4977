//! # vlib Common Library
//!
//! Shared code for the video library frontend crates:
//! - REST API request/response types (canonical tags, lookups)
//! - Common error type
//! - Configuration loading (CLI > ENV > TOML > compiled default)
//! - Tracing initialisation

pub mod api;
pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
