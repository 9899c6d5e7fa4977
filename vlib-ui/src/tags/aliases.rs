//! "Also known as" display for canonical groups

use super::grouping::CanonicalGroup;
use crate::api::{CanonicalTagApi, RetryPolicy};
use crate::error::ApiResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vlib_common::api::types::TagAlias;

/// Aliases requested per detail fetch
pub const DEFAULT_ALIAS_LIMIT: usize = 10;

/// How a group's variations are presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDisplay {
    pub canonical_form: String,
    /// Fetched aliases minus the canonical form itself
    pub aliases: Vec<TagAlias>,
    /// `alias_count - 1`, independent of how many aliases were fetched
    pub variation_count: u64,
    /// Badge and expandable list shown
    pub show_affordance: bool,
}

impl AliasDisplay {
    pub fn build(group: &CanonicalGroup, top_aliases: &[TagAlias]) -> Self {
        let aliases: Vec<TagAlias> = top_aliases
            .iter()
            .filter(|alias| alias.raw_form != group.canonical_form)
            .cloned()
            .collect();

        let show_affordance = group.alias_count > 1 && !aliases.is_empty();

        Self {
            canonical_form: group.canonical_form.clone(),
            aliases,
            variation_count: group.variation_count(),
            show_affordance,
        }
    }

    /// Plain filter pill, as rendered before (or without) alias details
    pub fn unadorned(group: &CanonicalGroup) -> Self {
        Self::build(group, &[])
    }

    /// `+N` badge text, only when the affordance is shown
    pub fn badge_label(&self) -> Option<String> {
        self.show_affordance
            .then(|| format!("+{}", self.variation_count))
    }
}

/// Fetches alias details for groups
pub struct AliasDetailLoader {
    api: Arc<dyn CanonicalTagApi>,
    alias_limit: usize,
    retry: RetryPolicy,
}

impl AliasDetailLoader {
    pub fn new(api: Arc<dyn CanonicalTagApi>) -> Self {
        Self {
            api,
            alias_limit: DEFAULT_ALIAS_LIMIT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_alias_limit(mut self, alias_limit: usize) -> Self {
        self.alias_limit = alias_limit;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build the display for `group`, fetching its detail when it has variations
    pub async fn load(
        &self,
        group: &CanonicalGroup,
        cancel: &CancellationToken,
    ) -> ApiResult<AliasDisplay> {
        // No variations: nothing to fetch
        if group.alias_count <= 1 {
            return Ok(AliasDisplay::unadorned(group));
        }

        let api: &dyn CanonicalTagApi = self.api.as_ref();
        let normalized_form = group.normalized_form.as_str();
        let alias_limit = self.alias_limit;

        let detail = self
            .retry
            .run(cancel, "Alias detail", move || {
                api.detail(normalized_form, alias_limit, cancel)
            })
            .await?;

        debug!(
            normalized_form = %group.normalized_form,
            fetched = detail.top_aliases.len(),
            "Loaded alias details"
        );
        Ok(AliasDisplay::build(group, &detail.top_aliases))
    }
}
