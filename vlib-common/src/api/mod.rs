//! API module for the video library REST API
//!
//! Contains only shared types; the HTTP client itself lives in `vlib-ui`.

pub mod types;

pub use types::{
    CanonicalTagDetail, CanonicalTagListItem, CanonicalTagSearchResponse, CanonicalTagSuggestion,
    Category, DataEnvelope, PaginationMeta, SelectedCanonicalTag, TagAlias, TopicNode,
};
