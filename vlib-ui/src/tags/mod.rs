//! Raw tag resolution and canonical grouping
//!
//! Raw tags flow through three stages: `resolver` maps each distinct raw tag
//! to its canonical record (or to nothing), `grouping` folds the settled
//! entries into display groups, and `aliases` decides how a group's
//! variations are shown.

pub mod aliases;
pub mod grouping;
pub mod resolver;

pub use aliases::{AliasDetailLoader, AliasDisplay, DEFAULT_ALIAS_LIMIT};
pub use grouping::{group_entries, orphan_filter_param, CanonicalGroup, TagGrouping};
pub use resolver::{classify, Classification, TagResolver};

use vlib_common::api::types::CanonicalTagListItem;

/// Resolution outcome for one raw tag
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTagEntry {
    pub raw_tag: String,
    /// `None` with no error: orphan (no canonical mapping)
    pub canonical: Option<CanonicalTagListItem>,
    pub is_loading: bool,
    /// Set when resolution failed for a reason other than 404
    pub error: Option<String>,
}

impl ResolvedTagEntry {
    pub fn loading(raw_tag: impl Into<String>) -> Self {
        Self {
            raw_tag: raw_tag.into(),
            canonical: None,
            is_loading: true,
            error: None,
        }
    }

    pub fn resolved(raw_tag: impl Into<String>, canonical: CanonicalTagListItem) -> Self {
        Self {
            raw_tag: raw_tag.into(),
            canonical: Some(canonical),
            is_loading: false,
            error: None,
        }
    }

    pub fn orphan(raw_tag: impl Into<String>) -> Self {
        Self {
            raw_tag: raw_tag.into(),
            canonical: None,
            is_loading: false,
            error: None,
        }
    }

    pub fn failed(raw_tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            raw_tag: raw_tag.into(),
            canonical: None,
            is_loading: false,
            error: Some(message.into()),
        }
    }

    pub fn is_orphan(&self) -> bool {
        !self.is_loading && self.canonical.is_none() && self.error.is_none()
    }
}
