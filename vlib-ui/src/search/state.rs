//! Typeahead search states and their presentation data

use tokio::time::Instant;
use vlib_common::api::types::{CanonicalTagListItem, CanonicalTagSuggestion, SelectedCanonicalTag};

/// Styling class of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Neutral,
    Error,
}

/// Failure classes with distinct user-facing copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Generic,
}

impl FailureKind {
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::Timeout => "Search timed out. The server is taking too long to respond.",
            FailureKind::Generic => "Search failed. Unable to load matching tags.",
        }
    }
}

/// One search match, presented on two lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    pub canonical_form: String,
    pub normalized_form: String,
    pub alias_count: u64,
    pub video_count: u64,
}

impl From<&CanonicalTagListItem> for ResultEntry {
    fn from(item: &CanonicalTagListItem) -> Self {
        Self {
            canonical_form: item.canonical_form.clone(),
            normalized_form: item.normalized_form.clone(),
            alias_count: item.alias_count,
            video_count: item.video_count,
        }
    }
}

impl ResultEntry {
    /// Canonical form and video count
    pub fn primary_line(&self) -> String {
        let noun = if self.video_count == 1 { "video" } else { "videos" };
        format!("{} ({} {})", self.canonical_form, self.video_count, noun)
    }

    /// Variation count, only when the tag has variations
    pub fn secondary_line(&self) -> Option<String> {
        match self.alias_count.saturating_sub(1) {
            0 => None,
            1 => Some("1 variation".to_string()),
            n => Some(format!("{} variations", n)),
        }
    }

    /// Filter selection for this match
    pub fn to_selected(&self) -> SelectedCanonicalTag {
        SelectedCanonicalTag {
            canonical_form: self.canonical_form.clone(),
            normalized_form: self.normalized_form.clone(),
            alias_count: self.alias_count,
        }
    }
}

/// State of one search session
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// Empty query: nothing requested, nothing shown
    Idle,
    /// Request in flight
    Pending { query: String },
    Results {
        query: String,
        entries: Vec<ResultEntry>,
        total: u64,
    },
    /// Zero matches; suggestions rendered apart from results
    NoMatches {
        query: String,
        suggestions: Vec<CanonicalTagSuggestion>,
    },
    /// Requests suppressed until `until`
    RateLimited { retry_after: u64, until: Instant },
    Failed {
        query: String,
        kind: FailureKind,
        message: String,
        can_retry: bool,
    },
}

impl SearchState {
    pub fn tone(&self) -> StatusTone {
        match self {
            SearchState::Failed { .. } => StatusTone::Error,
            _ => StatusTone::Neutral,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Pending { .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SearchState::RateLimited { .. })
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            SearchState::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whole seconds left in the rate-limit window, rounded up
    pub fn countdown_secs(&self) -> Option<u64> {
        let SearchState::RateLimited { until, .. } = self else {
            return None;
        };
        let remaining = until.saturating_duration_since(Instant::now());
        let extra = u64::from(remaining.subsec_nanos() > 0);
        Some(remaining.as_secs() + extra)
    }

    /// Query the state belongs to, if any
    pub fn query(&self) -> Option<&str> {
        match self {
            SearchState::Pending { query }
            | SearchState::Results { query, .. }
            | SearchState::NoMatches { query, .. }
            | SearchState::Failed { query, .. } => Some(query),
            SearchState::Idle | SearchState::RateLimited { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(alias_count: u64, video_count: u64) -> ResultEntry {
        ResultEntry {
            canonical_form: "Python".to_string(),
            normalized_form: "python".to_string(),
            alias_count,
            video_count,
        }
    }

    #[test]
    fn test_selection_carries_normalized_form() {
        let selected = entry(3, 12).to_selected();
        assert_eq!(selected.canonical_form, "Python");
        assert_eq!(selected.normalized_form, "python");
        assert_eq!(selected.alias_count, 3);
    }

    #[test]
    fn test_secondary_line_only_with_variations() {
        assert_eq!(entry(0, 5).secondary_line(), None);
        assert_eq!(entry(1, 5).secondary_line(), None);
        assert_eq!(entry(2, 5).secondary_line().as_deref(), Some("1 variation"));
        assert_eq!(entry(4, 5).secondary_line().as_deref(), Some("3 variations"));
    }

    #[test]
    fn test_primary_line() {
        assert_eq!(entry(1, 42).primary_line(), "Python (42 videos)");
        assert_eq!(entry(1, 1).primary_line(), "Python (1 video)");
    }

    #[test]
    fn test_rate_limit_is_neutral() {
        let state = SearchState::RateLimited {
            retry_after: 10,
            until: Instant::now() + Duration::from_secs(10),
        };
        assert_eq!(state.tone(), StatusTone::Neutral);
        assert_eq!(state.retry_after(), Some(10));

        let failed = SearchState::Failed {
            query: "py".to_string(),
            kind: FailureKind::Generic,
            message: FailureKind::Generic.message().to_string(),
            can_retry: false,
        };
        assert_eq!(failed.tone(), StatusTone::Error);
    }

    #[test]
    fn test_failure_messages_differ() {
        assert_ne!(FailureKind::Timeout.message(), FailureKind::Generic.message());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_rounds_up() {
        let state = SearchState::RateLimited {
            retry_after: 30,
            until: Instant::now() + Duration::from_secs(30),
        };
        assert_eq!(state.countdown_secs(), Some(30));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(state.countdown_secs(), Some(30));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(state.countdown_secs(), Some(0));
        assert_eq!(SearchState::Idle.countdown_secs(), None);
    }
}
