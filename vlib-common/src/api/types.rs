//! Shared API request/response types
//!
//! JSON shapes returned by the video library REST API. The frontend crates
//! treat the API as an external collaborator; these types only describe
//! what it sends back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ========================================
// Canonical Tag Types
// ========================================

/// Canonical tag as returned by list and search endpoints
///
/// `alias_count` includes the canonical form itself, so the number of
/// variations is `alias_count - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CanonicalTagListItem {
    /// Preferred display string for the cluster
    pub canonical_form: String,

    /// Stable lookup key (case/punctuation folded)
    pub normalized_form: String,

    /// Number of raw variants mapped to this cluster, canonical form included
    #[serde(default)]
    pub alias_count: u64,

    /// Number of videos carrying any variant
    #[serde(default)]
    pub video_count: u64,
}

impl CanonicalTagListItem {
    /// Variations other than the canonical form itself
    ///
    /// # Examples
    ///
    /// ```
    /// use vlib_common::api::types::CanonicalTagListItem;
    ///
    /// let item = CanonicalTagListItem {
    ///     canonical_form: "JavaScript".to_string(),
    ///     normalized_form: "javascript".to_string(),
    ///     alias_count: 3,
    ///     video_count: 42,
    /// };
    /// assert_eq!(item.variation_count(), 2);
    /// ```
    pub fn variation_count(&self) -> u64 {
        self.alias_count.saturating_sub(1)
    }
}

/// A raw variant of a canonical tag with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagAlias {
    pub raw_form: String,
    #[serde(default)]
    pub occurrence_count: u64,
}

/// Canonical tag detail (list item plus top aliases and timestamps)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CanonicalTagDetail {
    pub canonical_form: String,
    pub normalized_form: String,
    #[serde(default)]
    pub alias_count: u64,
    #[serde(default)]
    pub video_count: u64,

    /// Most frequent raw variants; the server may cap this list
    #[serde(default)]
    pub top_aliases: Vec<TagAlias>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CanonicalTagDetail {
    /// Drop alias and timestamp details
    pub fn to_list_item(&self) -> CanonicalTagListItem {
        CanonicalTagListItem {
            canonical_form: self.canonical_form.clone(),
            normalized_form: self.normalized_form.clone(),
            alias_count: self.alias_count,
            video_count: self.video_count,
        }
    }
}

/// Fuzzy "did you mean" suggestion returned when a search has no matches
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CanonicalTagSuggestion {
    pub canonical_form: String,
    pub normalized_form: String,
    #[serde(default)]
    pub alias_count: u64,
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Pagination block attached to list responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaginationMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub has_more: bool,
}

/// Response body of `GET /canonical-tags?q=<prefix>&limit=<n>`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CanonicalTagSearchResponse {
    #[serde(default)]
    pub data: Vec<CanonicalTagListItem>,
    #[serde(default)]
    pub pagination: PaginationMeta,
    #[serde(default)]
    pub suggestions: Vec<CanonicalTagSuggestion>,
}

/// Filter-selection unit for canonical tags
///
/// Serialised into the URL as `canonical_tag=<normalized_form>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectedCanonicalTag {
    pub canonical_form: String,
    pub normalized_form: String,
    pub alias_count: u64,
}

impl From<&CanonicalTagListItem> for SelectedCanonicalTag {
    fn from(item: &CanonicalTagListItem) -> Self {
        Self {
            canonical_form: item.canonical_form.clone(),
            normalized_form: item.normalized_form.clone(),
            alias_count: item.alias_count,
        }
    }
}

// ========================================
// Lookup List Types
// ========================================

/// Video category (`GET /categories`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Category {
    #[serde(alias = "id", deserialize_with = "id_string")]
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub video_count: u64,
}

/// Node of the topic tree (`GET /topics/hierarchy`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopicNode {
    #[serde(alias = "id", deserialize_with = "id_string")]
    pub topic_id: String,
    pub name: String,
    #[serde(default)]
    pub video_count: u64,
    #[serde(default)]
    pub children: Vec<TopicNode>,
}

/// Lookup ids arrive as strings or integers depending on the list
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

// ========================================
// Envelopes
// ========================================

/// Accepts both `{"data": T}` and a bare `T`
///
/// The resolve endpoint returns a bare detail while the detail endpoint
/// wraps it in `data`.
///
/// # Examples
///
/// ```
/// use vlib_common::api::types::DataEnvelope;
///
/// let wrapped: DataEnvelope<Vec<u32>> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
/// let bare: DataEnvelope<Vec<u32>> = serde_json::from_str("[1,2]").unwrap();
/// assert_eq!(wrapped.into_inner(), bare.into_inner());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DataEnvelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> DataEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            DataEnvelope::Wrapped { data } => data,
            DataEnvelope::Bare(value) => value,
        }
    }
}
