//! vlib-ui - command-line front end for the video library logic core
//!
//! Drives the tag search session, tag resolver and filter store against a
//! live API and prints what the UI would render.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::info;

use vlib_common::config::{
    load_toml_config, resolve_api_base_url, resolve_config_path, TomlConfig,
};
use vlib_common::logging::init_tracing;
use vlib_ui::api::{ApiClient, CanonicalTagApi, ClientSettings, RetryPolicy};
use vlib_ui::filters::{FilterKind, FilterLimits, FilterState, Lookups, Toggle};
use vlib_ui::search::{SearchOptions, SearchSession, SearchState};
use vlib_ui::tags::{
    classify, orphan_filter_param, AliasDetailLoader, AliasDisplay, Classification, TagResolver,
};

/// Command-line arguments for vlib-ui
#[derive(Parser, Debug)]
#[command(name = "vlib-ui")]
#[command(about = "Tag search, tag resolution and filter state for the video library")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API base URL (overrides VLIB_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Typeahead search over canonical tags
    Search {
        query: String,

        /// Maximum number of matches (defaults to the configured page size)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Select the Nth match (1-based) as a canonical tag filter
        #[arg(long)]
        select: Option<usize>,

        /// Query string the selection is applied to
        #[arg(long, default_value = "")]
        filters: String,
    },

    /// Resolve raw tags and group them by canonical form
    Resolve {
        #[arg(required = true)]
        tags: Vec<String>,

        /// Fetch alias details for groups with variations
        #[arg(long)]
        aliases: bool,
    },

    /// Apply filter operations to a query string
    Filters {
        /// Current query string (with or without leading '?')
        #[arg(default_value = "")]
        query: String,

        /// Add a filter, e.g. tag=rust or category=10
        #[arg(long, value_parser = parse_filter_arg)]
        add: Vec<(FilterKind, String)>,

        /// Remove a filter value
        #[arg(long, value_parser = parse_filter_arg)]
        remove: Vec<(FilterKind, String)>,

        /// Remove every filter (unrelated parameters are kept)
        #[arg(long)]
        clear: bool,

        /// Set a toggle, e.g. liked_only=on
        #[arg(long, value_parser = parse_toggle_arg)]
        toggle: Vec<(Toggle, bool)>,

        /// Skip loading category and topic names
        #[arg(long)]
        no_lookups: bool,
    },
}

fn parse_filter_arg(arg: &str) -> Result<(FilterKind, String), String> {
    let (kind, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected kind=value, got '{}'", arg))?;
    let kind = kind.parse::<FilterKind>().map_err(|e| e.to_string())?;
    Ok((kind, value.to_string()))
}

fn parse_toggle_arg(arg: &str) -> Result<(Toggle, bool), String> {
    let (name, state) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=on|off, got '{}'", arg))?;
    let toggle = name.parse::<Toggle>().map_err(|e| e.to_string())?;
    let enabled = match state {
        "on" | "true" | "1" => true,
        "off" | "false" | "0" => false,
        other => return Err(format!("expected on or off, got '{}'", other)),
    };
    Ok((toggle, enabled))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match resolve_config_path(args.config.as_deref()) {
        Some(path) => load_toml_config(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TomlConfig::default(),
    };

    init_tracing(&config.logging).context("Failed to initialize tracing")?;

    let base_url = resolve_api_base_url(args.api_url.as_deref(), &config)
        .context("Invalid API base URL")?;
    info!("Using API at {}", base_url);

    let client = Arc::new(
        ApiClient::new(ClientSettings::from_config(base_url, &config.client))
            .context("Failed to create API client")?,
    );

    let cancel = CancellationToken::new();
    let work = run_command(args.command, &config, client, &cancel);

    tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, cancelling");
            cancel.cancel();
            Ok(())
        }
    }
}

async fn run_command(
    command: Command,
    config: &TomlConfig,
    client: Arc<ApiClient>,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Command::Search {
            query,
            limit,
            select,
            filters,
        } => {
            let selection = select.map(|index| (index, filters.as_str()));
            run_search(config, client, &query, limit, selection).await
        }
        Command::Resolve { tags, aliases } => {
            run_resolve(config, client, &tags, aliases, cancel).await
        }
        Command::Filters {
            query,
            add,
            remove,
            clear,
            toggle,
            no_lookups,
        } => {
            let mut state =
                FilterState::parse(&query).with_limits(FilterLimits::from_config(&config.filters));

            for (kind, value) in remove {
                if !state.remove(kind, &value) {
                    println!("not selected: {}={}", kind, value);
                }
            }
            for (kind, value) in add {
                let outcome = state
                    .add(kind, &value)
                    .with_context(|| format!("Cannot add {}={}", kind, value))?;
                info!("add {}={}: {:?}", kind, value, outcome);
            }
            if clear {
                state.clear_all();
            }
            for (toggle, enabled) in toggle {
                state.set_toggle(toggle, enabled);
            }

            let lookups = if no_lookups {
                Lookups::default()
            } else {
                client
                    .load_lookups(cancel)
                    .await
                    .context("Failed to load categories and topics")?
            };

            print_filters(&state, &lookups);
            Ok(())
        }
    }
}

async fn run_search(
    config: &TomlConfig,
    client: Arc<ApiClient>,
    query: &str,
    limit: Option<usize>,
    selection: Option<(usize, &str)>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("Nothing to search for");
        return Ok(());
    }

    let mut options = SearchOptions::from_config(&config.search, &config.client);
    if let Some(limit) = limit {
        options.page_size = limit.max(1);
    }

    let session = SearchSession::spawn(client, options);
    session.set_query(query);

    let state = session
        .wait_until(|state| {
            !matches!(state, SearchState::Idle | SearchState::Pending { .. })
        })
        .await;

    match &state {
        SearchState::Results { entries, total, .. } => {
            for entry in entries {
                println!("{}", entry.primary_line());
                if let Some(secondary) = entry.secondary_line() {
                    println!("    {}", secondary);
                }
            }
            println!("({} of {} matches)", entries.len(), total);

            if let Some((index, filters)) = selection {
                let entry = index
                    .checked_sub(1)
                    .and_then(|i| entries.get(i))
                    .ok_or_else(|| anyhow!("No match number {} to select", index))?;
                let selected = entry.to_selected();

                let mut filter_state = FilterState::parse(filters)
                    .with_limits(FilterLimits::from_config(&config.filters));
                let outcome = filter_state
                    .add(FilterKind::CanonicalTag, &selected.normalized_form)
                    .with_context(|| format!("Cannot select {}", selected.canonical_form))?;
                info!("select {}: {:?}", selected.normalized_form, outcome);

                let mut lookups = Lookups::default();
                lookups.remember_canonical_tag(&selected);
                println!();
                print_filters(&filter_state, &lookups);
            }
        }
        SearchState::NoMatches { query, suggestions } => {
            println!("No tags match '{}'", query);
            if !suggestions.is_empty() {
                let names: Vec<&str> = suggestions
                    .iter()
                    .map(|s| s.canonical_form.as_str())
                    .collect();
                println!("Did you mean: {}", names.join(", "));
            }
        }
        SearchState::RateLimited { .. } => {
            println!(
                "Too many requests. Try again in {}s.",
                state.countdown_secs().unwrap_or(0)
            );
        }
        SearchState::Failed { message, .. } => {
            return Err(anyhow!("{}", message));
        }
        SearchState::Idle | SearchState::Pending { .. } => {}
    }

    Ok(())
}

async fn run_resolve(
    config: &TomlConfig,
    client: Arc<ApiClient>,
    tags: &[String],
    with_aliases: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let api: Arc<dyn CanonicalTagApi> = client;
    let retry = RetryPolicy::from_config(&config.client);
    let resolver = TagResolver::new(Arc::clone(&api), retry);

    let entries = resolver.resolve_all(tags, cancel).await;

    let grouping = match classify(&entries) {
        Classification::Loading => return Ok(()),
        Classification::Empty => {
            println!("No tags");
            return Ok(());
        }
        Classification::Ready(grouping) => grouping,
    };

    let displays: Vec<AliasDisplay> = if with_aliases {
        let loader = AliasDetailLoader::new(api).with_retry(retry);
        let loads = grouping.groups.iter().map(|group| loader.load(group, cancel));
        join_all(loads)
            .await
            .into_iter()
            .zip(&grouping.groups)
            .map(|(result, group)| {
                result.unwrap_or_else(|error| {
                    tracing::warn!(
                        normalized_form = %group.normalized_form,
                        "Alias details unavailable: {}",
                        error
                    );
                    AliasDisplay::unadorned(group)
                })
            })
            .collect()
    } else {
        grouping.groups.iter().map(AliasDisplay::unadorned).collect()
    };

    for (group, display) in grouping.groups.iter().zip(&displays) {
        let (param, value) = group.filter_param();
        let badge = display
            .badge_label()
            .map(|badge| format!(" {}", badge))
            .unwrap_or_default();
        println!(
            "{}{} ({} videos)  ?{}={}",
            group.canonical_form,
            badge,
            group.video_count,
            param,
            urlencoding::encode(value)
        );
        println!("    raw: {}", group.raw_tags.join(", "));
        if display.show_affordance {
            let aliases: Vec<&str> = display.aliases.iter().map(|a| a.raw_form.as_str()).collect();
            println!("    also known as: {}", aliases.join(", "));
        }
    }

    for orphan in &grouping.orphans {
        let (param, value) = orphan_filter_param(orphan);
        println!("{}  ?{}={}", orphan, param, urlencoding::encode(value));
    }

    for failed in &grouping.failed {
        let (param, value) = orphan_filter_param(failed);
        println!(
            "{} (could not be resolved)  ?{}={}",
            failed,
            param,
            urlencoding::encode(value)
        );
    }

    Ok(())
}

fn print_filters(state: &FilterState, lookups: &Lookups) {
    let query = state.to_query_string();
    if query.is_empty() {
        println!("?");
    } else {
        println!("?{}", query);
    }

    let pills = state.active_filters(lookups);
    println!("{} active filter(s)", state.active_filter_count());
    for pill in pills {
        println!("  [{}] {}", pill.kind, pill.label);
    }
    for toggle in Toggle::ALL {
        if state.is_enabled(toggle) {
            println!("  [{}] on", toggle.param());
        }
    }
}
