//! Typeahead search session
//!
//! A driver task owns all mutable session state and reacts to four event
//! sources: commands from the handle, debounced queries, request outcomes
//! and the end of a rate-limit window. The handle only sends commands and
//! observes published states over a `watch` channel.
//!
//! Only the newest request's outcome is applied: every request carries a
//! generation number and a child cancellation token, and issuing a new
//! request cancels the previous one.

use super::debounce::Debouncer;
use super::state::{FailureKind, ResultEntry, SearchState};
use crate::api::{CanonicalTagApi, RetryPolicy};
use crate::error::{ApiError, ApiResult, ErrorKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vlib_common::api::types::CanonicalTagSearchResponse;
use vlib_common::config::{ClientConfig, SearchConfig};

/// Session tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub debounce: Duration,
    /// `limit` sent to the API and maximum entries shown
    pub page_size: usize,
    /// Failed searches accept `SearchSession::retry`
    pub manual_retry: bool,
    /// Backoff for transient failures
    pub retry: RetryPolicy,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default(), &ClientConfig::default())
    }
}

impl SearchOptions {
    pub fn from_config(search: &SearchConfig, client: &ClientConfig) -> Self {
        Self {
            debounce: search.debounce(),
            page_size: search.page_size.max(1),
            manual_retry: search.manual_retry,
            retry: RetryPolicy::from_config(client),
        }
    }
}

#[derive(Debug)]
enum Command {
    SetQuery(String),
    Retry,
}

struct Outcome {
    generation: u64,
    query: String,
    result: ApiResult<CanonicalTagSearchResponse>,
}

/// Handle to a running search session
///
/// Dropping the handle stops the driver, its debounce timer and any request
/// in flight.
pub struct SearchSession {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SearchState>,
    options: SearchOptions,
    shutdown: CancellationToken,
}

impl SearchSession {
    /// Start a session driver on the current runtime
    pub fn spawn(api: Arc<dyn CanonicalTagApi>, options: SearchOptions) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SearchState::Idle);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (debouncer, settled_rx) = Debouncer::new(options.debounce);
        let shutdown = CancellationToken::new();

        let driver = Driver {
            api,
            options,
            state_tx,
            debouncer,
            outcome_tx,
            shutdown: shutdown.clone(),
            latest_input: String::new(),
            settled_query: String::new(),
            generation: 0,
            in_flight: None,
            rate_limited_until: None,
        };

        debug!(
            debounce_ms = options.debounce.as_millis() as u64,
            page_size = options.page_size,
            "Starting search session"
        );
        tokio::spawn(driver.run(commands_rx, settled_rx, outcome_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
            options,
            shutdown,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Feed the current input value; requests follow after the debounce delay
    pub fn set_query(&self, query: impl Into<String>) {
        let _ = self.commands.send(Command::SetQuery(query.into()));
    }

    /// Re-issue a failed search
    ///
    /// Returns false when manual retry is disabled or the session is not in
    /// a failed state.
    pub fn retry(&self) -> bool {
        let retryable = matches!(
            &*self.state.borrow(),
            SearchState::Failed { can_retry: true, .. }
        );
        if !self.options.manual_retry || !retryable {
            return false;
        }
        self.commands.send(Command::Retry).is_ok()
    }

    /// Latest published state
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    /// Wait for the first published state matching `predicate`
    ///
    /// If the driver has stopped, the last published state is returned.
    pub async fn wait_until<F>(&self, mut predicate: F) -> SearchState
    where
        F: FnMut(&SearchState) -> bool,
    {
        let mut state = self.state.clone();
        if let Ok(matched) = state.wait_for(|s| predicate(s)).await {
            return (*matched).clone();
        }
        let last = state.borrow().clone();
        last
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Driver {
    api: Arc<dyn CanonicalTagApi>,
    options: SearchOptions,
    state_tx: watch::Sender<SearchState>,
    debouncer: Debouncer<String>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    shutdown: CancellationToken,
    /// Most recent raw input
    latest_input: String,
    /// Most recent debounced query, trimmed
    settled_query: String,
    generation: u64,
    in_flight: Option<CancellationToken>,
    rate_limited_until: Option<Instant>,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut settled: mpsc::UnboundedReceiver<String>,
        mut outcomes: mpsc::UnboundedReceiver<Outcome>,
    ) {
        loop {
            let window_end = self.rate_limited_until;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(query) = settled.recv() => self.on_settled(query),
                Some(outcome) = outcomes.recv() => self.on_outcome(outcome),
                _ = wait_for_window(window_end) => self.on_window_elapsed(),
            }
        }

        self.cancel_in_flight();
        self.debouncer.cancel();
        debug!("Search session stopped");
    }

    fn publish(&self, state: SearchState) {
        self.state_tx.send_replace(state);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetQuery(query) => {
                self.latest_input = query.clone();
                self.debouncer.schedule(query);
            }
            Command::Retry => {
                if self.is_rate_limited() {
                    debug!("Retry ignored during rate-limit window");
                    return;
                }
                info!(query = %self.settled_query, "Retrying search");
                self.issue(self.settled_query.clone());
            }
        }
    }

    fn on_settled(&mut self, query: String) {
        // A timer that fired just before being superseded
        if query != self.latest_input {
            return;
        }

        self.settled_query = query.trim().to_string();
        if self.is_rate_limited() {
            debug!(query = %self.settled_query, "Search deferred until rate limit ends");
            return;
        }
        self.issue(self.settled_query.clone());
    }

    fn issue(&mut self, query: String) {
        self.cancel_in_flight();
        self.generation += 1;

        if query.is_empty() {
            self.publish(SearchState::Idle);
            return;
        }

        let generation = self.generation;
        let token = self.shutdown.child_token();
        self.in_flight = Some(token.clone());
        self.publish(SearchState::Pending {
            query: query.clone(),
        });

        let api = Arc::clone(&self.api);
        let retry = self.options.retry;
        let limit = self.options.page_size;
        let outcome_tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            debug!(query = %query, generation, "Issuing tag search");
            let api_ref: &dyn CanonicalTagApi = api.as_ref();
            let q = query.as_str();
            let cancel = &token;
            let result = retry
                .run(cancel, "Tag search", move || api_ref.search(q, limit, cancel))
                .await;

            let _ = outcome_tx.send(Outcome {
                generation,
                query,
                result,
            });
        });
    }

    fn on_outcome(&mut self, outcome: Outcome) {
        if outcome.generation != self.generation {
            debug!(
                query = %outcome.query,
                generation = outcome.generation,
                "Dropping stale search result"
            );
            return;
        }
        self.in_flight = None;

        let Outcome { query, result, .. } = outcome;
        match result {
            Ok(response) => self.publish(self.success_state(query, response)),
            Err(ApiError::Cancelled) => {}
            Err(ApiError::RateLimited { retry_after }) => {
                let until = Instant::now() + Duration::from_secs(retry_after);
                self.rate_limited_until = Some(until);
                warn!(query = %query, retry_after, "Search rate limited");
                self.publish(SearchState::RateLimited { retry_after, until });
            }
            Err(error) => {
                let kind = match error.kind() {
                    ErrorKind::Timeout => FailureKind::Timeout,
                    _ => FailureKind::Generic,
                };
                warn!(query = %query, "Search failed: {}", error);
                self.publish(SearchState::Failed {
                    query,
                    kind,
                    message: kind.message().to_string(),
                    can_retry: self.options.manual_retry,
                });
            }
        }
    }

    fn success_state(&self, query: String, response: CanonicalTagSearchResponse) -> SearchState {
        if response.data.is_empty() {
            return SearchState::NoMatches {
                query,
                suggestions: response.suggestions,
            };
        }

        let entries: Vec<ResultEntry> = response
            .data
            .iter()
            .take(self.options.page_size)
            .map(ResultEntry::from)
            .collect();
        let total = response.pagination.total.max(entries.len() as u64);

        SearchState::Results {
            query,
            entries,
            total,
        }
    }

    fn on_window_elapsed(&mut self) {
        self.rate_limited_until = None;
        info!(query = %self.settled_query, "Rate limit window elapsed");
        self.issue(self.settled_query.clone());
    }

    fn is_rate_limited(&self) -> bool {
        self.rate_limited_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

async fn wait_for_window(end: Option<Instant>) {
    match end {
        Some(end) => tokio::time::sleep_until(end).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SearchOptions::default();
        assert_eq!(options.debounce, Duration::from_millis(300));
        assert_eq!(options.page_size, 10);
        assert!(!options.manual_retry);
        assert_eq!(options.retry, RetryPolicy::default());
    }

    #[test]
    fn test_page_size_at_least_one() {
        let search = SearchConfig {
            page_size: 0,
            ..SearchConfig::default()
        };
        let options = SearchOptions::from_config(&search, &ClientConfig::default());
        assert_eq!(options.page_size, 1);
    }
}
