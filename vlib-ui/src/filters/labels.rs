//! Filter pill labels hydrated from lookup lists
//!
//! Category and topic filters carry ids; their display names come from the
//! currently loaded lookup lists. An id with no matching entry keeps its
//! pill and its place in the URL, labelled `"Unknown"`.

use super::state::{FilterKind, FilterState};
use std::collections::HashMap;
use vlib_common::api::types::{Category, SelectedCanonicalTag, TopicNode};

/// Label for ids missing from the loaded lookup lists
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Id → name tables used for labelling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookups {
    categories: HashMap<String, String>,
    topics: HashMap<String, String>,
    /// normalized form → canonical form
    canonical_tags: HashMap<String, String>,
}

impl Lookups {
    /// Build from the category list and the topic tree (flattened)
    pub fn new(categories: &[Category], topics: &[TopicNode]) -> Self {
        let categories = categories
            .iter()
            .map(|c| (c.category_id.clone(), c.name.clone()))
            .collect();

        let mut flattened = HashMap::new();
        let mut stack: Vec<&TopicNode> = topics.iter().collect();
        while let Some(node) = stack.pop() {
            flattened.insert(node.topic_id.clone(), node.name.clone());
            stack.extend(node.children.iter());
        }

        Self {
            categories,
            topics: flattened,
            canonical_tags: HashMap::new(),
        }
    }

    /// Remember display forms of canonical tags picked in this session
    pub fn remember_canonical_tag(&mut self, tag: &SelectedCanonicalTag) {
        self.canonical_tags
            .insert(tag.normalized_form.clone(), tag.canonical_form.clone());
    }

    pub fn category_name(&self, id: &str) -> Option<&str> {
        self.categories.get(id).map(String::as_str)
    }

    pub fn topic_name(&self, id: &str) -> Option<&str> {
        self.topics.get(id).map(String::as_str)
    }

    pub fn canonical_form(&self, normalized_form: &str) -> Option<&str> {
        self.canonical_tags.get(normalized_form).map(String::as_str)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

/// One rendered filter pill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilter {
    pub kind: FilterKind,
    /// Raw value as it appears in the URL
    pub value: String,
    pub label: String,
    /// False when the id matched no lookup entry
    pub resolved: bool,
}

impl FilterState {
    /// Pills for every value filter, in serialisation order
    pub fn active_filters(&self, lookups: &Lookups) -> Vec<ActiveFilter> {
        FilterKind::ALL
            .into_iter()
            .flat_map(|kind| {
                self.values(kind)
                    .iter()
                    .map(move |value| label_for(kind, value, lookups))
            })
            .collect()
    }
}

fn label_for(kind: FilterKind, value: &str, lookups: &Lookups) -> ActiveFilter {
    let (label, resolved) = match kind {
        FilterKind::Tag => (Some(value), true),
        // Normalized form is a readable fallback
        FilterKind::CanonicalTag => (Some(lookups.canonical_form(value).unwrap_or(value)), true),
        FilterKind::Category => {
            let name = lookups.category_name(value);
            (name, name.is_some())
        }
        FilterKind::Topic => {
            let name = lookups.topic_name(value);
            (name, name.is_some())
        }
    };

    ActiveFilter {
        kind,
        value: value.to_string(),
        label: label.unwrap_or(UNKNOWN_LABEL).to_string(),
        resolved,
    }
}
