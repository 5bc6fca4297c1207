use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use kat_search::{
    CachedSeriesSource, EpisodeTarget, KatSearchError, KickAssProvider, ProviderConfig,
    RecordedStatus, ResultItem, SeriesLibrary, Show, TvMazeSource,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Search KickAss for TV episodes and publish recent uploads as RSS
#[derive(Debug, Parser)]
#[command(name = "kat-search", version, about)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a raw query; without one, list the most recent TV uploads
    Search { query: Option<String> },

    /// Print the cached recent-uploads feed as RSS
    Feed,

    /// Search every aired episode of a season
    Season {
        #[command(flatten)]
        show: ShowArgs,
        /// Season number, or YYYY-MM for air-by-date shows
        season: String,
    },

    /// Search a single episode
    Episode {
        #[command(flatten)]
        show: ShowArgs,
        #[arg(long, requires = "episode", conflicts_with = "date")]
        season: Option<u32>,
        #[arg(long, requires = "season")]
        episode: Option<u32>,
        /// Broadcast date (YYYY-MM-DD) for air-by-date shows
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, clap::Args)]
struct ShowArgs {
    /// Show name as listed on TVMaze
    show: String,
    /// Additional release name (repeatable)
    #[arg(long = "alias")]
    aliases: Vec<String>,
    /// Episodes are released by broadcast date
    #[arg(long)]
    air_by_date: bool,
}

impl ShowArgs {
    fn to_show(&self) -> Show {
        Show {
            name: self.show.clone(),
            aliases: self.aliases.clone(),
            air_by_date: self.air_by_date,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Prints search results with their detected quality
fn print_results(provider: &KickAssProvider, results: &[ResultItem]) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }

    for (index, item) in results.iter().enumerate() {
        println!("[{}] {} ({})", index + 1, item.title, provider.quality(item));
        println!("    {}", item.link);
    }
    println!("\nFound {} result(s).", results.len());
}

fn run(cli: Cli) -> Result<(), KatSearchError> {
    let config = match cli.config {
        Some(ref path) => ProviderConfig::load(path)?,
        None => ProviderConfig::load_default()?,
    };
    let provider = KickAssProvider::new(config)?;

    if !provider.is_enabled() {
        eprintln!("Warning: the {} provider is disabled in the configuration.", provider.name());
    }

    match cli.command {
        Command::Search { query } => {
            let results = provider.search(query.as_deref().unwrap_or_default());
            print_results(&provider, &results);
        }
        Command::Feed => {
            println!("{}", provider.feed()?);
        }
        Command::Season { show, season } => {
            let library = episode_library()?;
            let show = show.to_show();
            let results = provider.find_season(&library, &RecordedStatus, Some(&show), &season);
            print_results(&provider, &results);
        }
        Command::Episode {
            show,
            season,
            episode,
            date,
        } => {
            let library = episode_library()?;
            let show = show.to_show();
            let target = match (season, episode, date) {
                (Some(season), Some(episode), _) => Some(EpisodeTarget::Numbered { season, episode }),
                (_, _, Some(date)) => Some(EpisodeTarget::AirDate(date)),
                _ => None,
            };
            let results = provider.find_episode(&library, &RecordedStatus, Some(&show), target);
            print_results(&provider, &results);
        }
    }

    Ok(())
}

/// Episode listings from TVMaze, cached on disk for a day
fn episode_library() -> Result<SeriesLibrary<CachedSeriesSource<TvMazeSource>>, KatSearchError> {
    let source = CachedSeriesSource::open(TvMazeSource::new(), Some(Duration::from_secs(24 * 60 * 60)))?;
    Ok(SeriesLibrary::new(source, Local::now().date_naive()))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kat_search=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
