//! Canonical grouping of resolved raw tags
//!
//! Pure function over a settled snapshot of `ResolvedTagEntry` values; no
//! state is kept between calls.

use super::ResolvedTagEntry;
use std::collections::HashMap;
use tracing::debug;

/// URL parameter for canonical tag filters
pub const CANONICAL_TAG_PARAM: &str = "canonical_tag";

/// URL parameter for plain (raw) tag filters
pub const RAW_TAG_PARAM: &str = "tag";

/// Raw tags sharing one normalized form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalGroup {
    pub normalized_form: String,
    pub canonical_form: String,
    pub alias_count: u64,
    pub video_count: u64,
    /// First-seen order
    pub raw_tags: Vec<String>,
}

impl CanonicalGroup {
    /// Query parameter selecting this group as a filter
    pub fn filter_param(&self) -> (&'static str, &str) {
        (CANONICAL_TAG_PARAM, &self.normalized_form)
    }

    pub fn variation_count(&self) -> u64 {
        self.alias_count.saturating_sub(1)
    }
}

/// Query parameter selecting an orphan (or failed) raw tag as a filter
pub fn orphan_filter_param(raw_tag: &str) -> (&'static str, &str) {
    (RAW_TAG_PARAM, raw_tag)
}

/// Result of grouping a settled snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagGrouping {
    /// Ordered by first distinct normalized form
    pub groups: Vec<CanonicalGroup>,
    /// Raw tags without canonical mapping
    pub orphans: Vec<String>,
    /// Raw tags whose resolution failed
    pub failed: Vec<String>,
}

impl TagGrouping {
    /// Nothing to render: explicit empty state
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.orphans.is_empty() && self.failed.is_empty()
    }

    /// Every raw tag accounted for, groups first
    pub fn raw_tags(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.raw_tags.iter())
            .chain(self.orphans.iter())
            .chain(self.failed.iter())
            .map(String::as_str)
    }
}

/// Fold resolved entries into canonical groups, orphans and failures
///
/// The first entry for a normalized form supplies the group's display form
/// and counts. Entries still loading are skipped; gate on
/// [`classify`](super::classify) before calling this.
pub fn group_entries(entries: &[ResolvedTagEntry]) -> TagGrouping {
    let mut grouping = TagGrouping::default();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        if entry.is_loading {
            debug!(raw_tag = %entry.raw_tag, "Skipping unsettled tag entry");
            continue;
        }

        if entry.error.is_some() {
            grouping.failed.push(entry.raw_tag.clone());
            continue;
        }

        let Some(canonical) = &entry.canonical else {
            grouping.orphans.push(entry.raw_tag.clone());
            continue;
        };

        match index.get(canonical.normalized_form.as_str()) {
            Some(&position) => {
                let group = &mut grouping.groups[position];
                if group.alias_count != canonical.alias_count
                    || group.video_count != canonical.video_count
                {
                    debug!(
                        normalized_form = %canonical.normalized_form,
                        raw_tag = %entry.raw_tag,
                        "Canonical counts differ between raw tags; keeping first"
                    );
                }
                group.raw_tags.push(entry.raw_tag.clone());
            }
            None => {
                index.insert(canonical.normalized_form.as_str(), grouping.groups.len());
                grouping.groups.push(CanonicalGroup {
                    normalized_form: canonical.normalized_form.clone(),
                    canonical_form: canonical.canonical_form.clone(),
                    alias_count: canonical.alias_count,
                    video_count: canonical.video_count,
                    raw_tags: vec![entry.raw_tag.clone()],
                });
            }
        }
    }

    grouping
}
