//! reelfind - movie search and trending CLI over TMDB.

/// Application configuration (TOML + environment).
mod config;
/// Popularity store selection.
mod store;
/// Terminal UI screens.
mod tui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, Settings, resolve_config_path};
use crate::store::StoreBackend;
use crate::tui::{Screen, run_app};
use reelfind_api::appwrite::PopularityStore;
use reelfind_api::tmdb::{Movie, TmdbApi, TmdbClient, fetch_movies};

/// User agent sent to TMDB and Appwrite.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Log file used while an interactive screen owns the terminal.
const LOG_FILE_ENV: &str = "REELFIND_LOG";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List popular movies.
    Discover,
    /// Search movies and record a hit for the top result.
    Search(SearchArgs),
    /// Show details for a movie.
    Details(DetailsArgs),
    /// List the most searched movies.
    Trending(TrendingArgs),
    /// Record a search hit for a movie.
    Record(RecordArgs),
    /// Open the interactive home screen.
    Home,
    /// Open the interactive search screen.
    Browse,
    /// Configuration file operations.
    Config(ConfigCommand),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "batman").
    #[arg(long, required = true)]
    query: String,
}

/// Arguments for the `details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// TMDB movie ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Number of movies (default: `[trending] limit` from config).
    #[arg(long)]
    limit: Option<u32>,
}

/// Arguments for the `record` subcommand.
#[derive(clap::Args)]
struct RecordArgs {
    /// Search term to count.
    #[arg(long, required = true)]
    term: String,
    /// TMDB movie ID the term resolved to.
    #[arg(long, required = true)]
    movie_id: u64,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration (secrets masked).
    Show,
    /// Write a default config file.
    Init(ConfigInitArgs),
}

/// Arguments for the `config init` subcommand.
#[derive(clap::Args)]
struct ConfigInitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: Shell,
}

/// Reads a process environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Picks where log lines go for `command`.
///
/// One-shot commands log to stdout with colors. Interactive screens
/// draw on stdout, so their logs go to `$REELFIND_LOG` when set and are
/// discarded otherwise. Returns the writer and whether to emit ANSI
/// colors.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
fn log_writer(command: &Commands) -> Result<(BoxMakeWriter, bool)> {
    if !matches!(command, Commands::Home | Commands::Browse) {
        return Ok((BoxMakeWriter::new(io::stdout), true));
    }
    let Some(path) = env_var(LOG_FILE_ENV).filter(|p| !p.trim().is_empty()) else {
        return Ok((BoxMakeWriter::new(io::sink), false));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file: {path}"))?;
    Ok((BoxMakeWriter::new(Mutex::new(file)), false))
}

/// Resolves the config file path from `--dir` and the environment.
///
/// # Errors
///
/// Returns an error if no config location can be determined.
fn config_file(dir: Option<&PathBuf>) -> Result<PathBuf> {
    resolve_config_path(dir.map(PathBuf::as_path), env_var)
        .context("failed to resolve config path")
}

/// Loads the config file and overlays environment variables.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or the file is invalid.
fn load_settings(dir: Option<&PathBuf>) -> Result<Settings> {
    let config = AppConfig::load(&config_file(dir)?).context("failed to load config")?;
    Ok(Settings::resolve(&config, env_var))
}

/// Builds a `TmdbClient` from settings.
///
/// # Errors
///
/// Returns an error if `TMDB_API_TOKEN` is not set, the base URL is
/// invalid, or the client fails to build.
fn build_tmdb_client(settings: &Settings) -> Result<TmdbClient> {
    let api_token = settings
        .tmdb_token
        .clone()
        .context("TMDB_API_TOKEN environment variable is required")?;

    let mut builder = TmdbClient::builder()
        .api_token(api_token)
        .user_agent(USER_AGENT);
    if let Some(base_url) = &settings.tmdb_base_url {
        let url = Url::parse(base_url)
            .with_context(|| format!("invalid TMDB_BASE_URL: {base_url}"))?;
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build TMDB client")
}

/// Builds the popularity store from settings.
///
/// # Errors
///
/// Returns an error if the Appwrite client fails to build.
fn build_store(settings: &Settings) -> Result<StoreBackend> {
    let store = StoreBackend::from_settings(settings.appwrite.as_ref(), USER_AGENT)?;
    tracing::debug!(backend = store.name(), "popularity store ready");
    Ok(store)
}

/// Logs a movie table.
fn print_movies(movies: &[Movie]) {
    tracing::info!("ID\tYear\tRating\tTitle");
    for movie in movies {
        tracing::info!(
            "{}\t{}\t{:.1}\t{}",
            movie.id,
            movie.release_year().unwrap_or("-"),
            movie.vote_average,
            movie.title,
        );
    }
    tracing::info!("Total: {} movies", movies.len());
}

/// Runs the `discover` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_discover(settings: &Settings) -> Result<()> {
    let client = build_tmdb_client(settings)?;

    let movies = fetch_movies(&client, None, &settings.language).await?;
    print_movies(&movies);

    Ok(())
}

/// Runs the `search` subcommand.
///
/// A failure to record the hit is logged, not returned.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, settings: &Settings) -> Result<()> {
    let client = build_tmdb_client(settings)?;
    let store = build_store(settings)?;

    let movies = fetch_movies(&client, Some(&args.query), &settings.language).await?;
    print_movies(&movies);

    let term = args.query.trim();
    if let Some(top) = movies.first()
        && !term.is_empty()
    {
        match store.record_search_hit(term, top).await {
            Ok(()) => tracing::debug!(term, movie_id = top.id, "recorded search hit"),
            Err(e) => tracing::warn!("Failed to record search: {e:#}"),
        }
    }

    Ok(())
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_details(args: &DetailsArgs, settings: &Settings) -> Result<()> {
    let client = build_tmdb_client(settings)?;

    let details = client
        .movie_details(args.id, &settings.language)
        .await
        .context("TMDB movie details request failed")?;

    tracing::info!("Title: {} ({})", details.title, details.original_title);
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        tracing::info!("Tagline: {tagline}");
    }
    tracing::info!(
        "Release Date: {}",
        details.release_date.as_deref().unwrap_or("-")
    );
    tracing::info!("Status: {}", details.status.as_deref().unwrap_or("-"));
    tracing::info!(
        "Runtime: {}",
        details
            .runtime
            .map_or_else(|| String::from("-"), |r| format!("{r} min"))
    );
    tracing::info!(
        "Rating: {:.1} ({} votes)",
        details.vote_average,
        details.vote_count
    );
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!("Genres: {}", genres.join(", "));
    tracing::info!("Budget: {}  Revenue: {}", details.budget, details.revenue);
    if let Some(homepage) = details.homepage.as_deref().filter(|h| !h.is_empty()) {
        tracing::info!("Homepage: {homepage}");
    }
    tracing::info!("---");
    tracing::info!("{}", details.overview.as_deref().unwrap_or("-"));

    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the popularity store fails to build.
#[instrument(skip_all)]
async fn run_trending(args: &TrendingArgs, settings: &Settings) -> Result<()> {
    let store = build_store(settings)?;
    let limit = args.limit.unwrap_or(settings.trending_limit);

    let trending = store.top_trending(limit).await;
    if trending.is_empty() {
        tracing::info!("No trending movies yet.");
        return Ok(());
    }

    tracing::info!("#\tCount\tMovieID\tTerm\tTitle");
    for (i, row) in trending.iter().enumerate() {
        tracing::info!(
            "{}\t{}\t{}\t{}\t{}",
            i.saturating_add(1),
            row.count,
            row.movie_id,
            row.search_term,
            row.title,
        );
    }

    Ok(())
}

/// Runs the `record` subcommand.
///
/// # Errors
///
/// Returns an error if the movie cannot be fetched or the store write fails.
#[instrument(skip_all)]
async fn run_record(args: &RecordArgs, settings: &Settings) -> Result<()> {
    let term = args.term.trim();
    if term.is_empty() {
        bail!("--term must not be empty");
    }

    let client = build_tmdb_client(settings)?;
    let store = build_store(settings)?;

    let details = client
        .movie_details(args.movie_id, &settings.language)
        .await
        .context("TMDB movie details request failed")?;
    let movie = Movie {
        id: details.id,
        title: details.title,
        poster_path: details.poster_path,
        vote_average: details.vote_average,
        release_date: details.release_date,
    };

    store
        .record_search_hit(term, &movie)
        .await
        .context("failed to record search hit")?;
    tracing::info!("Recorded \"{}\" -> {} ({})", term, movie.title, movie.id);

    Ok(())
}

/// Runs the `home` and `browse` subcommands.
///
/// # Errors
///
/// Returns an error if client setup or the TUI fails.
async fn run_screens(settings: &Settings, start: Screen) -> Result<()> {
    let client = Arc::new(build_tmdb_client(settings)?);
    let store = Arc::new(build_store(settings)?);

    run_app(client, store, settings, start)
        .await
        .context("interactive screen failed")
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded.
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let config_path = config_file(dir)?;
    let settings = load_settings(dir)?;

    tracing::info!(
        "Config file: {}{}",
        config_path.display(),
        if config_path.exists() {
            ""
        } else {
            " (not found, using defaults)"
        }
    );
    for (key, value) in settings.describe() {
        tracing::info!("{key} = {value}");
    }

    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the file exists (without `--force`) or cannot be written.
fn run_config_init(args: &ConfigInitArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = config_file(dir)?;
    if config_path.exists() && !args.force {
        bail!(
            "config file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    AppConfig::default()
        .save(&config_path)
        .context("failed to save config")?;
    tracing::info!("Wrote {}", config_path.display());

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (writer, ansi) = log_writer(&cli.command)?;

    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Discover => run_discover(&load_settings(dir)?).await,
        Commands::Search(args) => run_search(&args, &load_settings(dir)?).await,
        Commands::Details(args) => run_details(&args, &load_settings(dir)?).await,
        Commands::Trending(args) => run_trending(&args, &load_settings(dir)?).await,
        Commands::Record(args) => run_record(&args, &load_settings(dir)?).await,
        Commands::Home => run_screens(&load_settings(dir)?, Screen::Home).await,
        Commands::Browse => run_screens(&load_settings(dir)?, Screen::Search).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Show => run_config_show(dir),
            ConfigSubcommands::Init(args) => run_config_init(&args, dir),
        },
        Commands::Completions(args) => {
            let mut cmd = Cli::command();
            let bin_name = env!("CARGO_BIN_NAME");
            clap_complete::generate(args.shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(())
        }
    }
}
