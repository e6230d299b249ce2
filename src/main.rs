// gh-discover command line entry point.
// Wires config, logging, the cache and its sweeper, and prints query results as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, warn};

use gh_discover::query::{RepoSort, SortOrder};
use gh_discover::{
    CacheSweeper, Config, Degraded, GitHubClient, GitHubQueries, GlobalSearchParams, Result,
    TtlCache, logging,
};

#[derive(Debug, Parser)]
#[command(name = "gh-discover", version, about = "Search GitHub users, repositories, and organizations")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search user accounts.
    Users { query: String },
    /// Show a user's profile.
    User { username: String },
    /// List a user's repositories.
    Repos {
        username: String,
        /// Only repositories created in this year.
        #[arg(long)]
        year: Option<String>,
    },
    /// List organizations by creation year.
    Orgs {
        /// Creation year; defaults to recently created organizations.
        #[arg(long)]
        year: Option<String>,
    },
    /// Search all public repositories.
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_enum, default_value_t = RepoSort::BestMatch)]
        sort: RepoSort,
        #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,
        #[arg(long)]
        language: Option<String>,
        /// Star qualifier, e.g. ">100".
        #[arg(long)]
        stars: Option<String>,
        /// Creation qualifier, e.g. ">2020-01-01".
        #[arg(long)]
        created: Option<String>,
        /// Comma-separated topics.
        #[arg(long)]
        topics: Option<String>,
    },
    /// Show the current API quota.
    RateLimit,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("gh-discover: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_logging(&config.log);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("gh-discover: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let client = Arc::new(GitHubClient::from_config(config)?);
    let cache = Arc::new(TtlCache::new());
    let sweeper = CacheSweeper::spawn(Arc::clone(&cache), config.sweep_interval());
    let queries =
        GitHubQueries::new(client, cache).with_rate_limit_low_water(config.rate_limit_low_water);

    let result = execute(command, &queries).await;
    sweeper.stop().await;
    result
}

async fn execute(command: Command, queries: &GitHubQueries) -> Result<()> {
    match command {
        Command::Users { query } => print_json(&queries.search_users(&query).await?),
        Command::User { username } => print_json(&queries.fetch_user_profile(&username).await?),
        Command::Repos { username, year } => print_degraded(
            queries
                .fetch_user_repositories(&username, year.as_deref())
                .await,
        ),
        Command::Orgs { year } => print_degraded(queries.fetch_organizations(year.as_deref()).await),
        Command::Search {
            query,
            page,
            sort,
            order,
            language,
            stars,
            created,
            topics,
        } => {
            let params = GlobalSearchParams {
                language,
                stars,
                created,
                topics,
                ..GlobalSearchParams::new(query).page(page).sort(sort, order)
            };
            let envelope = queries.search_repositories(&params).await?;
            if envelope.total_count > envelope.reachable_total() {
                warn!(
                    total = envelope.total_count,
                    reachable = envelope.reachable_total(),
                    "only the first 1000 results can be paged through"
                );
            }
            print_json(&envelope)
        }
        Command::RateLimit => print_json(&queries.fetch_rate_limit().await?),
    }
}

fn print_degraded<T: Serialize>(result: Degraded<T>) -> Result<()> {
    if let Some(reason) = result.reason() {
        warn!(%reason, "showing fallback result");
    }
    print_json(result.value())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
