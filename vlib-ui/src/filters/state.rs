//! Filter state parsed from and serialised to the URL query string
//!
//! The query string is the single source of truth; `FilterState` is a
//! transient view that is rebuilt with [`FilterState::parse`] on every
//! navigation and written back with [`FilterState::to_query_string`].
//!
//! # Parameters
//! - `tag` (repeatable): plain raw-tag filter
//! - `canonical_tag` (repeatable): canonical tag by normalized form
//! - `category` (single): category id
//! - `topic_id` (repeatable): topic id
//! - `liked_only`, `has_transcript`, `include_unavailable`: toggles
//!
//! Any other parameter is kept verbatim and re-emitted after these.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use urlencoding::{decode, encode};
use vlib_common::config::FilterConfig;

/// Value filter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Tag,
    CanonicalTag,
    Category,
    Topic,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Tag,
        FilterKind::CanonicalTag,
        FilterKind::Category,
        FilterKind::Topic,
    ];

    /// Query parameter name
    pub fn param(self) -> &'static str {
        match self {
            FilterKind::Tag => "tag",
            FilterKind::CanonicalTag => "canonical_tag",
            FilterKind::Category => "category",
            FilterKind::Topic => "topic_id",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.param() == param)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    /// Accepts parameter names plus `topic` as shorthand for `topic_id`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topic" => Ok(FilterKind::Topic),
            other => {
                Self::from_param(other).ok_or_else(|| FilterError::UnknownKind(other.to_string()))
            }
        }
    }
}

/// Boolean filter switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    LikedOnly,
    HasTranscript,
    IncludeUnavailable,
}

impl Toggle {
    pub const ALL: [Toggle; 3] = [
        Toggle::LikedOnly,
        Toggle::HasTranscript,
        Toggle::IncludeUnavailable,
    ];

    pub fn param(self) -> &'static str {
        match self {
            Toggle::LikedOnly => "liked_only",
            Toggle::HasTranscript => "has_transcript",
            Toggle::IncludeUnavailable => "include_unavailable",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|toggle| toggle.param() == param)
    }
}

impl FromStr for Toggle {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_param(s).ok_or_else(|| FilterError::UnknownToggle(s.to_string()))
    }
}

/// Selection limits, counted over value filters only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterLimits {
    pub max_per_kind: usize,
    pub max_total: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

impl FilterLimits {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            max_per_kind: config.max_per_kind,
            max_total: config.max_total,
        }
    }
}

/// Rejected filter operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Filter value is empty")]
    EmptyValue,

    #[error("At most {limit} {kind} filters can be selected")]
    KindLimitReached { kind: FilterKind, limit: usize },

    #[error("At most {limit} filters can be selected in total")]
    TotalLimitReached { limit: usize },

    #[error("Unknown filter kind: {0}")]
    UnknownKind(String),

    #[error("Unknown toggle: {0}")]
    UnknownToggle(String),
}

/// Result of a successful `add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Value already selected; nothing changed
    AlreadyPresent,
    /// Single-valued filter switched from `previous`
    Replaced { previous: String },
}

/// Active filters of the current URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    tags: Vec<String>,
    canonical_tags: Vec<String>,
    category: Option<String>,
    topics: Vec<String>,
    liked_only: bool,
    has_transcript: bool,
    include_unavailable: bool,
    /// Unrelated `key=value` segments, undecoded, in original order
    passthrough: Vec<String>,
    limits: FilterLimits,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> FilterLimits {
        self.limits
    }

    /// Parse a query string, with or without the leading `?`
    ///
    /// Values are trimmed. Blank or undecodable values are dropped; only the first non-blank `category` counts.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = Self::default();

        for segment in query.split('&').filter(|s| !s.is_empty()) {
            let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
            let Some(key) = decode_component(raw_key) else {
                state.passthrough.push(segment.to_string());
                continue;
            };

            if let Some(kind) = FilterKind::from_param(&key) {
                // Undecodable values cannot be re-emitted unchanged, so they are dropped
                let Some(value) = decode_component(raw_value) else {
                    debug!(param = %key, raw = %raw_value, "Dropping undecodable filter value");
                    continue;
                };
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                let value = value.to_string();
                match kind {
                    FilterKind::Tag => state.tags.push(value),
                    FilterKind::CanonicalTag => state.canonical_tags.push(value),
                    FilterKind::Topic => state.topics.push(value),
                    FilterKind::Category => {
                        if state.category.is_none() {
                            state.category = Some(value);
                        }
                    }
                }
            } else if let Some(toggle) = Toggle::from_param(&key) {
                let enabled = decode_component(raw_value).is_some_and(|v| parse_flag(&v));
                state.set_toggle(toggle, enabled);
            } else {
                state.passthrough.push(segment.to_string());
            }
        }

        state
    }

    /// Serialise without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut segments: Vec<String> = Vec::new();

        for kind in FilterKind::ALL {
            for value in self.values(kind) {
                segments.push(format!("{}={}", kind.param(), encode(value)));
            }
        }

        for toggle in Toggle::ALL {
            if self.is_enabled(toggle) {
                segments.push(format!("{}=true", toggle.param()));
            }
        }

        segments.extend(self.passthrough.iter().cloned());
        segments.join("&")
    }

    /// Values of `kind` in URL order
    pub fn values(&self, kind: FilterKind) -> &[String] {
        match kind {
            FilterKind::Tag => &self.tags,
            FilterKind::CanonicalTag => &self.canonical_tags,
            FilterKind::Topic => &self.topics,
            FilterKind::Category => match &self.category {
                Some(category) => std::slice::from_ref(category),
                None => &[],
            },
        }
    }

    fn values_mut(&mut self, kind: FilterKind) -> Option<&mut Vec<String>> {
        match kind {
            FilterKind::Tag => Some(&mut self.tags),
            FilterKind::CanonicalTag => Some(&mut self.canonical_tags),
            FilterKind::Topic => Some(&mut self.topics),
            FilterKind::Category => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn contains(&self, kind: FilterKind, value: &str) -> bool {
        self.values(kind).iter().any(|v| v == value)
    }

    /// Select `value` under `kind`
    ///
    /// Adding a category replaces the current one.
    pub fn add(&mut self, kind: FilterKind, value: &str) -> Result<AddOutcome, FilterError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(FilterError::EmptyValue);
        }
        if self.contains(kind, value) {
            return Ok(AddOutcome::AlreadyPresent);
        }

        let total = self.active_filter_count();
        let limits = self.limits;

        if kind == FilterKind::Category {
            if self.category.is_none() && total >= limits.max_total {
                return Err(FilterError::TotalLimitReached {
                    limit: limits.max_total,
                });
            }
            return Ok(match self.category.replace(value.to_string()) {
                Some(previous) => AddOutcome::Replaced { previous },
                None => AddOutcome::Added,
            });
        }

        if self.values(kind).len() >= limits.max_per_kind {
            return Err(FilterError::KindLimitReached {
                kind,
                limit: limits.max_per_kind,
            });
        }
        if total >= limits.max_total {
            return Err(FilterError::TotalLimitReached {
                limit: limits.max_total,
            });
        }

        if let Some(values) = self.values_mut(kind) {
            values.push(value.to_string());
        }
        Ok(AddOutcome::Added)
    }

    /// Remove every occurrence of `value` under `kind`
    ///
    /// Returns whether anything was removed.
    pub fn remove(&mut self, kind: FilterKind, value: &str) -> bool {
        match self.values_mut(kind) {
            Some(values) => {
                let before = values.len();
                values.retain(|v| v != value);
                values.len() != before
            }
            None => {
                if self.category.as_deref() == Some(value) {
                    self.category = None;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drop every filter parameter, toggles included
    pub fn clear_all(&mut self) {
        self.tags.clear();
        self.canonical_tags.clear();
        self.category = None;
        self.topics.clear();
        self.liked_only = false;
        self.has_transcript = false;
        self.include_unavailable = false;
    }

    pub fn is_enabled(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::LikedOnly => self.liked_only,
            Toggle::HasTranscript => self.has_transcript,
            Toggle::IncludeUnavailable => self.include_unavailable,
        }
    }

    pub fn set_toggle(&mut self, toggle: Toggle, enabled: bool) {
        match toggle {
            Toggle::LikedOnly => self.liked_only = enabled,
            Toggle::HasTranscript => self.has_transcript = enabled,
            Toggle::IncludeUnavailable => self.include_unavailable = enabled,
        }
    }

    /// Flip `toggle`, returning the new value
    pub fn toggle(&mut self, toggle: Toggle) -> bool {
        let enabled = !self.is_enabled(toggle);
        self.set_toggle(toggle, enabled);
        enabled
    }

    /// Number of value filters, duplicates and unknown ids included
    pub fn active_filter_count(&self) -> usize {
        FilterKind::ALL
            .into_iter()
            .map(|kind| self.values(kind).len())
            .sum()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0 || Toggle::ALL.into_iter().any(|t| self.is_enabled(t))
    }

}

/// Percent-decode a query component, `+` meaning space
///
/// `None` when the escapes do not form valid UTF-8.
fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    decode(&spaced).ok().map(|cow| cow.into_owned())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}
