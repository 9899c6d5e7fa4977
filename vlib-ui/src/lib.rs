//! # vlib-ui
//!
//! Headless logic core of the video library frontend:
//! - `api`: REST client with response cache and retry policy
//! - `tags`: raw tag resolution, canonical grouping, alias display
//! - `search`: debounced typeahead search session
//! - `filters`: URL-backed filter state store

pub mod api;
pub mod error;
pub mod filters;
pub mod search;
pub mod tags;

pub use error::{ApiError, ApiResult, ErrorKind};
